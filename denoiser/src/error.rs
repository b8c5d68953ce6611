//! Denoiser error types.

use thiserror::Error;

/// Errors that can occur while building or recording a denoiser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenoiserError {
    /// An invalid argument was provided (zero size, unknown method, bad mip range).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An internal inconsistency or allocation failure.
    #[error("failure: {0}")]
    Failure(String),
    /// Packed constant data does not match the size declared for a pass.
    #[error("constant layout mismatch in pass '{pass}': declared {declared} bytes, packed {packed}")]
    ConstantLayoutMismatch {
        /// Name of the offending pass.
        pass: String,
        /// Size declared at build time.
        declared: u32,
        /// Size actually packed.
        packed: u32,
    },
}

impl DenoiserError {
    /// Map the error onto the host-facing result taxonomy.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidArgument(_) => ResultCode::InvalidArgument,
            Self::Failure(_) | Self::ConstantLayoutMismatch { .. } => ResultCode::Failure,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn failure(msg: impl Into<String>) -> Self {
        Self::Failure(msg.into())
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = DenoiserError> = std::result::Result<T, E>;

/// Host-facing result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// The operation succeeded.
    Success,
    /// Internal failure.
    Failure,
    /// The caller passed an invalid argument.
    InvalidArgument,
}

impl<T> From<&Result<T>> for ResultCode {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.code(),
        }
    }
}
