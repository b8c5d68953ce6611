//! Denoising methods.
//!
//! A method is a [`DenoiseMethod`] implementation: it declares its pool
//! textures and passes once through a [`MethodBuilder`], then packs each pass's
//! constants every frame. The built-in methods are implementations of the same
//! trait hosts use for their own methods.

mod diffuse;
mod reference;
mod reflection_mv;
mod shadow;
mod specular;

use std::fmt;

pub use diffuse::Diffuse;
pub use reference::Reference;
pub use reflection_mv::ReflectionMv;
pub use shadow::Shadow;
pub use specular::Specular;

use crate::constants::{ConstantWriter, FrameContext};
use crate::error::{DenoiserError, Result};
use crate::graph::{MethodBuilder, PassId};
use crate::math::Vec4;
use crate::settings::{HitDistanceParameters, MethodSettings, wrong_settings};

/// Largest width or height any built-in method accepts.
pub const MAX_RESOLUTION: u16 = 16384;

/// Frame values a method sees while packing one pass.
#[derive(Debug, Clone, Copy)]
pub struct PackContext<'a> {
    pub frame: &'a FrameContext,
    /// Full method resolution, as registered.
    pub width: u16,
    pub height: u16,
}

/// A denoising algorithm: its static pass graph and its per-frame constants.
pub trait DenoiseMethod: Send + Sync + fmt::Debug {
    /// Display name, used in pass names and error messages.
    fn name(&self) -> &str;

    /// Largest supported width or height.
    fn max_resolution(&self) -> u16 {
        MAX_RESOLUTION
    }

    /// Declare pools and passes. Must depend only on the builder resolution.
    fn build(&self, builder: &mut MethodBuilder<'_>) -> Result<()>;

    /// Replace the method settings.
    ///
    /// Settings of another kind are an `InvalidArgument`.
    fn set_settings(&mut self, settings: &MethodSettings) -> Result<()> {
        Err(wrong_settings(self.name(), settings))
    }

    /// Append the pass-specific fields of one pass.
    ///
    /// The shared block has already been written.
    fn pack_constants(
        &self,
        pass: PassId,
        ctx: &PackContext<'_>,
        writer: &mut ConstantWriter<'_>,
    ) -> Result<()>;
}

/// Built-in method identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Diffuse,
    Specular,
    Shadow,
    /// Plain temporal accumulation, used to produce ground truth.
    Reference,
    /// Motion vectors for specular reflections.
    SpecularReflectionMv,
}

impl Method {
    /// All built-in methods.
    pub const ALL: [Method; 5] = [
        Self::Diffuse,
        Self::Specular,
        Self::Shadow,
        Self::Reference,
        Self::SpecularReflectionMv,
    ];

    /// Create the method with default settings.
    pub fn create(self) -> Box<dyn DenoiseMethod> {
        match self {
            Self::Diffuse => Box::new(Diffuse::default()),
            Self::Specular => Box::new(Specular::default()),
            Self::Shadow => Box::new(Shadow::default()),
            Self::Reference => Box::new(Reference::default()),
            Self::SpecularReflectionMv => Box::new(ReflectionMv::default()),
        }
    }
}

impl TryFrom<u32> for Method {
    type Error = DenoiserError;

    fn try_from(id: u32) -> Result<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or_else(|| DenoiserError::invalid(format!("unknown method id {id}")))
    }
}

/// A built-in method requested at a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDesc {
    pub method: Method,
    pub full_resolution_width: u16,
    pub full_resolution_height: u16,
}

impl MethodDesc {
    /// Create a method request.
    pub fn new(method: Method, width: u16, height: u16) -> Self {
        Self {
            method,
            full_resolution_width: width,
            full_resolution_height: height,
        }
    }
}

// ============================================================================
// Packing helpers
// ============================================================================

/// Hit distance parameters converted to world units.
pub(crate) fn hit_distance_scaling(params: &HitDistanceParameters, meters_to_units: f32) -> Vec4 {
    Vec4::new(params.a, params.b, params.c, params.d) * meters_to_units
}

pub(crate) fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

pub(crate) fn unknown_pass(method: &str, pass: PassId) -> DenoiserError {
    DenoiserError::failure(format!("{method}: no constant layout for pass {}", pass.get()))
}
