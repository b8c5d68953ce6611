//! Pool texture descriptors.

use super::Format;
use crate::error::{DenoiserError, Result};

/// Descriptor of a texture the host must allocate for a pool slot.
///
/// Dimensions are 16-bit to match the dispatch grid limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Texture format.
    pub format: Format,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Mip level count.
    pub mip_num: u16,
}

impl TextureDesc {
    /// Create a new single-mip 2D texture descriptor.
    pub fn new(format: Format, width: u16, height: u16) -> Self {
        Self {
            format,
            width,
            height,
            mip_num: 1,
        }
    }

    /// Set the mip level count.
    pub fn with_mips(mut self, mip_num: u16) -> Self {
        self.mip_num = mip_num;
        self
    }

    /// Check that the descriptor describes a non-empty texture.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DenoiserError::InvalidArgument(format!(
                "texture size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.mip_num == 0 {
            return Err(DenoiserError::InvalidArgument(
                "texture mip count must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Approximate memory footprint of the full mip chain in bytes.
    pub fn byte_size(&self) -> u64 {
        let bpp = u64::from(self.format.bytes_per_pixel());
        (0..self.mip_num)
            .map(|mip| {
                let w = (u64::from(self.width) >> mip).max(1);
                let h = (u64::from(self.height) >> mip).max(1);
                w * h * bpp
            })
            .sum()
    }
}
