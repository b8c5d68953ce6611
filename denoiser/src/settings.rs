//! Per-frame common settings and per-method settings.
//!
//! With the `serde` feature every settings type can be loaded from config
//! files; missing fields fall back to their defaults.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DenoiserError, Result};
use crate::math::{Mat4, Vec2};

/// Accumulated frame limit of the diffuse and specular methods.
pub const MAX_HISTORY_FRAME_NUM: u32 = 63;

/// Accumulated frame limit of the reference accumulator.
pub const REFERENCE_MAX_HISTORY_FRAME_NUM: u32 = 1024;

/// Disocclusion threshold forced by reference accumulation.
pub const REFERENCE_DISOCCLUSION_THRESHOLD: f32 = 0.005;

// ============================================================================
// Common settings
// ============================================================================

/// Camera and frame state shared by every method.
///
/// Matrices use column vectors: `clip = view_to_clip * world_to_view * world`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CommonSettings {
    /// Projection of the current frame.
    pub view_to_clip: Mat4,
    /// Projection of the previous frame.
    pub view_to_clip_prev: Mat4,
    /// View matrix of the current frame.
    pub world_to_view: Mat4,
    /// View matrix of the previous frame.
    pub world_to_view_prev: Mat4,
    /// Sub-pixel jitter of the current frame, in pixels.
    pub jitter: Vec2,
    /// Sub-pixel jitter of the previous frame, in pixels.
    pub jitter_prev: Vec2,
    /// Scale applied to motion vectors before use.
    pub motion_vector_scale: Vec2,
    /// Fraction of the full resolution rendered this frame, in (0, 1].
    pub resolution_scale: f32,
    /// Monotonic frame counter. Selects ping-pong bindings and rotators.
    pub frame_index: u32,
    /// World units per meter.
    pub meters_to_units: f32,
    /// View depth beyond which pixels are not denoised.
    pub denoising_range: f32,
    /// Debug visualization parameter forwarded to shaders.
    pub debug: f32,
    /// Turn every method into plain temporal accumulation.
    pub force_reference_accumulation: bool,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            view_to_clip: Mat4::identity(),
            view_to_clip_prev: Mat4::identity(),
            world_to_view: Mat4::identity(),
            world_to_view_prev: Mat4::identity(),
            jitter: Vec2::zeros(),
            jitter_prev: Vec2::zeros(),
            motion_vector_scale: Vec2::new(1.0, 1.0),
            resolution_scale: 1.0,
            frame_index: 0,
            meters_to_units: 1.0,
            denoising_range: 1000.0,
            debug: 0.0,
            force_reference_accumulation: false,
        }
    }
}

impl CommonSettings {
    /// Check that the settings can drive a frame.
    pub fn validate(&self) -> Result<()> {
        if !(self.denoising_range > 0.0) {
            return Err(DenoiserError::invalid(format!(
                "denoising range must be positive, got {}",
                self.denoising_range
            )));
        }
        if !(self.meters_to_units > 0.0) {
            return Err(DenoiserError::invalid(format!(
                "meters-to-units multiplier must be positive, got {}",
                self.meters_to_units
            )));
        }
        if !(self.resolution_scale > 0.0 && self.resolution_scale <= 1.0) {
            return Err(DenoiserError::invalid(format!(
                "resolution scale must be in (0, 1], got {}",
                self.resolution_scale
            )));
        }
        if !self.motion_vector_scale.iter().all(|v| v.is_finite()) {
            return Err(DenoiserError::invalid(
                "motion vector scale must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Shared parameter blocks
// ============================================================================

/// Hit distance normalization: `(a + |viewZ| * b) * lerp(1, c, exp2(d * roughness²))`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HitDistanceParameters {
    /// Constant term, in meters.
    pub a: f32,
    /// View depth based term.
    pub b: f32,
    /// Roughness amplitude.
    pub c: f32,
    /// Roughness exponent scale (negative).
    pub d: f32,
}

impl Default for HitDistanceParameters {
    fn default() -> Self {
        Self {
            a: 3.0,
            b: 0.1,
            c: 10.0,
            d: -25.0,
        }
    }
}

/// Specular lobe trimming parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LobeTrimmingParameters {
    /// Lobe fraction kept at zero roughness.
    pub a: f32,
    /// Roughness bias.
    pub b: f32,
    /// Roughness scale.
    pub c: f32,
}

impl Default for LobeTrimmingParameters {
    fn default() -> Self {
        Self {
            a: 0.85,
            b: 0.04,
            c: 0.11,
        }
    }
}

/// Temporal stabilization antilag.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AntilagSettings {
    /// Enable antilag.
    pub enable: bool,
    /// Intensity delta where antilag starts.
    pub intensity_threshold_min: f32,
    /// Intensity delta where antilag is fully applied.
    pub intensity_threshold_max: f32,
}

impl Default for AntilagSettings {
    fn default() -> Self {
        Self {
            enable: true,
            intensity_threshold_min: 1.0,
            intensity_threshold_max: 3.0,
        }
    }
}

/// Which pixels of a checkerboard-rendered signal are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CheckerboardMode {
    /// Full-resolution input.
    #[default]
    Off,
    /// Black cells hold data.
    Black,
    /// White cells hold data.
    White,
}

impl CheckerboardMode {
    /// Value the shaders expect: `(mode + 2) % 3`.
    pub fn packed(self) -> u32 {
        (self as u32 + 2) % 3
    }
}

// ============================================================================
// Method settings
// ============================================================================

/// Settings of the diffuse denoiser.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DiffuseSettings {
    pub hit_distance_parameters: HitDistanceParameters,
    pub antilag_settings: AntilagSettings,
    /// Clamped to [`MAX_HISTORY_FRAME_NUM`].
    pub max_accumulated_frame_num: u32,
    /// Spatial blur radius, in pixels.
    pub blur_radius: f32,
    /// Relative view depth difference that breaks history.
    pub disocclusion_threshold: f32,
    pub checkerboard_mode: CheckerboardMode,
}

impl Default for DiffuseSettings {
    fn default() -> Self {
        Self {
            hit_distance_parameters: HitDistanceParameters::default(),
            antilag_settings: AntilagSettings::default(),
            max_accumulated_frame_num: 31,
            blur_radius: 30.0,
            disocclusion_threshold: 0.01,
            checkerboard_mode: CheckerboardMode::Off,
        }
    }
}

/// Settings of the specular denoiser.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SpecularSettings {
    pub hit_distance_parameters: HitDistanceParameters,
    pub lobe_trimming_parameters: LobeTrimmingParameters,
    pub antilag_settings: AntilagSettings,
    /// Clamped to [`MAX_HISTORY_FRAME_NUM`].
    pub max_accumulated_frame_num: u32,
    /// Spatial blur radius, in pixels.
    pub blur_radius: f32,
    /// Upper bound of the post-blur radius adaptation.
    pub post_blur_max_adaptive_radius_scale: f32,
    /// Relative view depth difference that breaks history.
    pub disocclusion_threshold: f32,
    pub checkerboard_mode: CheckerboardMode,
}

impl Default for SpecularSettings {
    fn default() -> Self {
        Self {
            hit_distance_parameters: HitDistanceParameters::default(),
            lobe_trimming_parameters: LobeTrimmingParameters::default(),
            antilag_settings: AntilagSettings::default(),
            max_accumulated_frame_num: 31,
            blur_radius: 30.0,
            post_blur_max_adaptive_radius_scale: 5.0,
            disocclusion_threshold: 0.01,
            checkerboard_mode: CheckerboardMode::Off,
        }
    }
}

/// Settings of the shadow denoiser.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ShadowSettings {
    /// Plane distance tolerance, in meters.
    pub plane_distance_sensitivity: f32,
    /// Scale of the penumbra-driven blur radius.
    pub blur_radius_scale: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            plane_distance_sensitivity: 0.002,
            blur_radius_scale: 2.0,
        }
    }
}

/// Settings of the reference accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ReferenceSettings {
    /// Clamped to [`REFERENCE_MAX_HISTORY_FRAME_NUM`]. 0 resets accumulation.
    pub max_accumulated_frame_num: u32,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            max_accumulated_frame_num: REFERENCE_MAX_HISTORY_FRAME_NUM,
        }
    }
}

/// Settings of the specular reflection motion vector generator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ReflectionMvSettings {
    pub hit_distance_parameters: HitDistanceParameters,
}

/// Settings addressed to one registered method.
#[derive(Clone)]
pub enum MethodSettings {
    Diffuse(DiffuseSettings),
    Specular(SpecularSettings),
    Shadow(ShadowSettings),
    Reference(ReferenceSettings),
    ReflectionMv(ReflectionMvSettings),
    /// Settings of a host-defined method, downcast by the method itself.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl MethodSettings {
    /// Name of the settings kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Diffuse(_) => "diffuse",
            Self::Specular(_) => "specular",
            Self::Shadow(_) => "shadow",
            Self::Reference(_) => "reference",
            Self::ReflectionMv(_) => "reflection motion vectors",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for MethodSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diffuse(s) => f.debug_tuple("Diffuse").field(s).finish(),
            Self::Specular(s) => f.debug_tuple("Specular").field(s).finish(),
            Self::Shadow(s) => f.debug_tuple("Shadow").field(s).finish(),
            Self::Reference(s) => f.debug_tuple("Reference").field(s).finish(),
            Self::ReflectionMv(s) => f.debug_tuple("ReflectionMv").field(s).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Error for settings addressed to a method of another kind.
pub(crate) fn wrong_settings(method: &str, settings: &MethodSettings) -> DenoiserError {
    DenoiserError::invalid(format!(
        "method '{method}' does not accept {} settings",
        settings.kind_name()
    ))
}

// ============================================================================
// Accumulation parameters
// ============================================================================

/// Temporal accumulation values after the reference-accumulation override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulationParams {
    /// Accumulated frame limit, as packed.
    pub max_accumulated_frame_num: f32,
    pub blur_radius: f32,
    pub disocclusion_threshold: f32,
    pub use_antilag: bool,
}

impl AccumulationParams {
    /// Clamp the frame limit and apply reference accumulation.
    ///
    /// Under reference accumulation the blur radius is 0, the disocclusion
    /// threshold is [`REFERENCE_DISOCCLUSION_THRESHOLD`], antilag is off and the
    /// frame limit is the method maximum (or 0 if the settings ask for 0).
    pub fn resolve(
        max_accumulated_frame_num: u32,
        method_max: u32,
        blur_radius: f32,
        disocclusion_threshold: f32,
        antilag_enable: bool,
        force_reference_accumulation: bool,
    ) -> Self {
        if force_reference_accumulation {
            let frames = if max_accumulated_frame_num == 0 { 0 } else { method_max };
            return Self {
                max_accumulated_frame_num: frames as f32,
                blur_radius: 0.0,
                disocclusion_threshold: REFERENCE_DISOCCLUSION_THRESHOLD,
                use_antilag: false,
            };
        }

        Self {
            max_accumulated_frame_num: max_accumulated_frame_num.min(method_max) as f32,
            blur_radius,
            disocclusion_threshold,
            use_antilag: antilag_enable,
        }
    }
}
