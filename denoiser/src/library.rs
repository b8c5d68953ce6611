//! Static information about the library build.

use crate::VERSION;
use crate::method::Method;
use crate::types::{ShaderBackends, ShaderLibrary};

/// Register offsets a SPIR-V host must apply per descriptor kind.
///
/// HLSL register spaces overlap when compiled to SPIR-V, so each kind is
/// shifted into its own binding range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpirvBindingOffsets {
    pub sampler_offset: u32,
    pub texture_offset: u32,
    pub constant_buffer_offset: u32,
    pub storage_texture_and_buffer_offset: u32,
}

impl Default for SpirvBindingOffsets {
    fn default() -> Self {
        Self {
            sampler_offset: 100,
            texture_offset: 200,
            constant_buffer_offset: 300,
            storage_texture_and_buffer_offset: 400,
        }
    }
}

/// Description of the library: version, methods and available bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDesc {
    pub version: &'static str,
    pub supported_methods: &'static [Method],
    pub spirv_binding_offsets: SpirvBindingOffsets,
    /// Backends with bytecode for every shader in the supplied library.
    pub backends: ShaderBackends,
}

/// Describe the library for a given shader set.
pub fn library_desc(shaders: &ShaderLibrary) -> LibraryDesc {
    LibraryDesc {
        version: VERSION,
        supported_methods: &Method::ALL,
        spirv_binding_offsets: SpirvBindingOffsets::default(),
        backends: shaders.available_backends(),
    }
}
