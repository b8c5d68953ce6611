//! Declared constant-buffer sizes.

use crate::error::{DenoiserError, Result};

/// Size in bytes of the shared block written at the start of every pass.
pub const SHARED_CONSTANT_SIZE: u32 = 48;

/// Largest constant payload a single pass may declare.
pub const MAX_CONSTANT_DATA_SIZE: u32 = 4096;

/// Field counts of a pass's constant data, used to declare its size.
///
/// Every built-in pass starts with the shared block; the counts describe the
/// pass-specific fields that follow it.
///
/// ```
/// use redlilium_denoiser::constants::ConstantLayout;
///
/// // shared block + one matrix + three float4 + one scalar
/// assert_eq!(ConstantLayout::new(1, 3, 0, 1).size(), 164);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstantLayout {
    shared: bool,
    float4x4_num: u32,
    float4_num: u32,
    float2_num: u32,
    scalar_num: u32,
}

impl ConstantLayout {
    /// A pass without any constant data.
    pub const fn none() -> Self {
        Self {
            shared: false,
            float4x4_num: 0,
            float4_num: 0,
            float2_num: 0,
            scalar_num: 0,
        }
    }

    /// A pass with only the shared block.
    pub const fn shared() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Shared block followed by the given numbers of matrices, float4/uint4,
    /// float2/uint2 and scalar fields.
    pub const fn new(float4x4_num: u32, float4_num: u32, float2_num: u32, scalar_num: u32) -> Self {
        Self {
            shared: true,
            float4x4_num,
            float4_num,
            float2_num,
            scalar_num,
        }
    }

    /// Total size in bytes.
    pub const fn size(&self) -> u32 {
        let shared = if self.shared { SHARED_CONSTANT_SIZE } else { 0 };
        shared
            + self.float4x4_num * 64
            + self.float4_num * 16
            + self.float2_num * 8
            + self.scalar_num * 4
    }
}

/// Check a declared pass constant size against the hard budget.
///
/// Sizes must be 0, or a multiple of 4 that holds at least the shared block
/// and at most [`MAX_CONSTANT_DATA_SIZE`] bytes.
pub fn validate_constant_size(size: u32) -> Result<()> {
    if size == 0 {
        return Ok(());
    }
    if size % 4 != 0 {
        return Err(DenoiserError::invalid(format!(
            "constant data size {size} is not a multiple of 4"
        )));
    }
    if size < SHARED_CONSTANT_SIZE {
        return Err(DenoiserError::invalid(format!(
            "constant data size {size} cannot hold the {SHARED_CONSTANT_SIZE}-byte shared block"
        )));
    }
    if size > MAX_CONSTANT_DATA_SIZE {
        return Err(DenoiserError::invalid(format!(
            "constant data size {size} exceeds the {MAX_CONSTANT_DATA_SIZE}-byte limit"
        )));
    }
    Ok(())
}
