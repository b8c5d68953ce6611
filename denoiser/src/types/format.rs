//! Texture formats used by pool textures and host resources.

/// Texture format enumeration.
///
/// The host maps these to native API formats; the denoiser only needs their
/// storage footprint and numeric class to size and merge pool slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    // 8-bit channels
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 8-bit red channel, signed normalized.
    R8Snorm,
    /// 8-bit red channel, unsigned integer.
    R8Uint,
    /// 8-bit red channel, signed integer.
    R8Sint,
    /// 8-bit RG channels, unsigned normalized.
    Rg8Unorm,
    /// 8-bit RG channels, signed normalized.
    Rg8Snorm,
    /// 8-bit RG channels, unsigned integer.
    Rg8Uint,
    /// 8-bit RG channels, signed integer.
    Rg8Sint,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, signed normalized.
    Rgba8Snorm,
    /// 8-bit RGBA channels, unsigned integer.
    Rgba8Uint,
    /// 8-bit RGBA channels, signed integer.
    Rgba8Sint,
    /// 8-bit RGBA channels, sRGB.
    Rgba8Srgb,

    // 16-bit channels
    /// 16-bit red channel, unsigned normalized.
    R16Unorm,
    /// 16-bit red channel, signed normalized.
    R16Snorm,
    /// 16-bit red channel, unsigned integer.
    R16Uint,
    /// 16-bit red channel, signed integer.
    R16Sint,
    /// 16-bit red channel, float.
    R16Sfloat,
    /// 16-bit RG channels, unsigned normalized.
    Rg16Unorm,
    /// 16-bit RG channels, signed normalized.
    Rg16Snorm,
    /// 16-bit RG channels, unsigned integer.
    Rg16Uint,
    /// 16-bit RG channels, signed integer.
    Rg16Sint,
    /// 16-bit RG channels, float.
    Rg16Sfloat,
    /// 16-bit RGBA channels, unsigned normalized.
    Rgba16Unorm,
    /// 16-bit RGBA channels, signed normalized.
    Rgba16Snorm,
    /// 16-bit RGBA channels, unsigned integer.
    Rgba16Uint,
    /// 16-bit RGBA channels, signed integer.
    Rgba16Sint,
    /// 16-bit RGBA channels, float.
    Rgba16Sfloat,

    // 32-bit channels
    /// 32-bit red channel, unsigned integer.
    R32Uint,
    /// 32-bit red channel, signed integer.
    R32Sint,
    /// 32-bit red channel, float.
    R32Sfloat,
    /// 32-bit RG channels, unsigned integer.
    Rg32Uint,
    /// 32-bit RG channels, signed integer.
    Rg32Sint,
    /// 32-bit RG channels, float.
    Rg32Sfloat,
    /// 32-bit RGB channels, unsigned integer.
    Rgb32Uint,
    /// 32-bit RGB channels, signed integer.
    Rgb32Sint,
    /// 32-bit RGB channels, float.
    Rgb32Sfloat,
    /// 32-bit RGBA channels, unsigned integer.
    Rgba32Uint,
    /// 32-bit RGBA channels, signed integer.
    Rgba32Sint,
    /// 32-bit RGBA channels, float.
    Rgba32Sfloat,

    // Packed formats
    /// 10-bit RGB with 2-bit alpha, unsigned normalized.
    R10G10B10A2Unorm,
    /// 10-bit RGB with 2-bit alpha, unsigned integer.
    R10G10B10A2Uint,
    /// 11/11/10-bit unsigned float.
    R11G11B10Ufloat,
    /// Shared-exponent RGB.
    R9G9B9E5Ufloat,
}

impl Format {
    /// Returns the size in bytes of a single texel.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::R8Unorm | Self::R8Snorm | Self::R8Uint | Self::R8Sint => 1,
            Self::Rg8Unorm
            | Self::Rg8Snorm
            | Self::Rg8Uint
            | Self::Rg8Sint
            | Self::R16Unorm
            | Self::R16Snorm
            | Self::R16Uint
            | Self::R16Sint
            | Self::R16Sfloat => 2,
            Self::Rgba8Unorm
            | Self::Rgba8Snorm
            | Self::Rgba8Uint
            | Self::Rgba8Sint
            | Self::Rgba8Srgb
            | Self::Rg16Unorm
            | Self::Rg16Snorm
            | Self::Rg16Uint
            | Self::Rg16Sint
            | Self::Rg16Sfloat
            | Self::R32Uint
            | Self::R32Sint
            | Self::R32Sfloat
            | Self::R10G10B10A2Unorm
            | Self::R10G10B10A2Uint
            | Self::R11G11B10Ufloat
            | Self::R9G9B9E5Ufloat => 4,
            Self::Rgba16Unorm
            | Self::Rgba16Snorm
            | Self::Rgba16Uint
            | Self::Rgba16Sint
            | Self::Rgba16Sfloat
            | Self::Rg32Uint
            | Self::Rg32Sint
            | Self::Rg32Sfloat => 8,
            Self::Rgb32Uint | Self::Rgb32Sint | Self::Rgb32Sfloat => 12,
            Self::Rgba32Uint | Self::Rgba32Sint | Self::Rgba32Sfloat => 16,
        }
    }

    /// Returns the number of channels.
    pub fn channel_count(self) -> u32 {
        match self {
            Self::R8Unorm
            | Self::R8Snorm
            | Self::R8Uint
            | Self::R8Sint
            | Self::R16Unorm
            | Self::R16Snorm
            | Self::R16Uint
            | Self::R16Sint
            | Self::R16Sfloat
            | Self::R32Uint
            | Self::R32Sint
            | Self::R32Sfloat => 1,
            Self::Rg8Unorm
            | Self::Rg8Snorm
            | Self::Rg8Uint
            | Self::Rg8Sint
            | Self::Rg16Unorm
            | Self::Rg16Snorm
            | Self::Rg16Uint
            | Self::Rg16Sint
            | Self::Rg16Sfloat
            | Self::Rg32Uint
            | Self::Rg32Sint
            | Self::Rg32Sfloat => 2,
            Self::Rgb32Uint
            | Self::Rgb32Sint
            | Self::Rgb32Sfloat
            | Self::R11G11B10Ufloat
            | Self::R9G9B9E5Ufloat => 3,
            Self::Rgba8Unorm
            | Self::Rgba8Snorm
            | Self::Rgba8Uint
            | Self::Rgba8Sint
            | Self::Rgba8Srgb
            | Self::Rgba16Unorm
            | Self::Rgba16Snorm
            | Self::Rgba16Uint
            | Self::Rgba16Sint
            | Self::Rgba16Sfloat
            | Self::Rgba32Uint
            | Self::Rgba32Sint
            | Self::Rgba32Sfloat
            | Self::R10G10B10A2Unorm
            | Self::R10G10B10A2Uint => 4,
        }
    }
}

/// How a format's channels are interpreted by shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatClass {
    Unorm,
    Snorm,
    Srgb,
    Uint,
    Sint,
    Float,
    /// Channels of unequal width or a shared exponent.
    Packed,
}

impl Format {
    /// Numeric class of the channels.
    pub fn class(self) -> FormatClass {
        match self {
            Self::R8Unorm
            | Self::Rg8Unorm
            | Self::Rgba8Unorm
            | Self::R16Unorm
            | Self::Rg16Unorm
            | Self::Rgba16Unorm => FormatClass::Unorm,
            Self::R8Snorm
            | Self::Rg8Snorm
            | Self::Rgba8Snorm
            | Self::R16Snorm
            | Self::Rg16Snorm
            | Self::Rgba16Snorm => FormatClass::Snorm,
            Self::Rgba8Srgb => FormatClass::Srgb,
            Self::R8Uint
            | Self::Rg8Uint
            | Self::Rgba8Uint
            | Self::R16Uint
            | Self::Rg16Uint
            | Self::Rgba16Uint
            | Self::R32Uint
            | Self::Rg32Uint
            | Self::Rgb32Uint
            | Self::Rgba32Uint => FormatClass::Uint,
            Self::R8Sint
            | Self::Rg8Sint
            | Self::Rgba8Sint
            | Self::R16Sint
            | Self::Rg16Sint
            | Self::Rgba16Sint
            | Self::R32Sint
            | Self::Rg32Sint
            | Self::Rgb32Sint
            | Self::Rgba32Sint => FormatClass::Sint,
            Self::R16Sfloat
            | Self::Rg16Sfloat
            | Self::Rgba16Sfloat
            | Self::R32Sfloat
            | Self::Rg32Sfloat
            | Self::Rgb32Sfloat
            | Self::Rgba32Sfloat => FormatClass::Float,
            Self::R10G10B10A2Unorm
            | Self::R10G10B10A2Uint
            | Self::R11G11B10Ufloat
            | Self::R9G9B9E5Ufloat => FormatClass::Packed,
        }
    }

    /// Bits per channel, or `None` for packed formats.
    pub fn bits_per_channel(self) -> Option<u32> {
        match self.class() {
            FormatClass::Packed => None,
            _ => Some(self.bytes_per_pixel() * 8 / self.channel_count()),
        }
    }

    /// Check if a texture of this format can store everything `other` stores.
    ///
    /// True for the same format, or for the same numeric class with at least
    /// as many channels and at least as many bits per channel. Packed formats
    /// only hold themselves.
    pub fn can_hold(self, other: Format) -> bool {
        if self == other {
            return true;
        }
        match (self.bits_per_channel(), other.bits_per_channel()) {
            (Some(bits), Some(other_bits)) => {
                self.class() == other.class()
                    && self.channel_count() >= other.channel_count()
                    && bits >= other_bits
            }
            _ => false,
        }
    }
}
