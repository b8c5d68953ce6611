//! Compute shader bytecode and the shader library supplied at creation.

use std::collections::BTreeMap;
use std::sync::Arc;

use bitflags::bitflags;

bitflags! {
    /// Bytecode backends available for a shader or a whole library.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderBackends: u32 {
        /// Direct3D 11 bytecode.
        const DXBC = 1 << 0;
        /// Direct3D 12 bytecode.
        const DXIL = 1 << 1;
        /// Vulkan SPIR-V.
        const SPIRV = 1 << 2;
    }
}

/// Compiled bytecode of one compute shader, one immutable blob per backend.
///
/// Blobs are never interpreted; an empty blob means the backend is not
/// available for this shader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputeShader {
    /// Direct3D 11 bytecode.
    pub dxbc: Arc<[u8]>,
    /// Direct3D 12 bytecode.
    pub dxil: Arc<[u8]>,
    /// SPIR-V bytecode.
    pub spirv: Arc<[u8]>,
}

impl ComputeShader {
    /// Create a shader from the three backend blobs.
    pub fn new(dxbc: impl Into<Arc<[u8]>>, dxil: impl Into<Arc<[u8]>>, spirv: impl Into<Arc<[u8]>>) -> Self {
        Self {
            dxbc: dxbc.into(),
            dxil: dxil.into(),
            spirv: spirv.into(),
        }
    }

    /// Backends with non-empty bytecode.
    pub fn backends(&self) -> ShaderBackends {
        let mut backends = ShaderBackends::empty();
        backends.set(ShaderBackends::DXBC, !self.dxbc.is_empty());
        backends.set(ShaderBackends::DXIL, !self.dxil.is_empty());
        backends.set(ShaderBackends::SPIRV, !self.spirv.is_empty());
        backends
    }

    /// Check if no backend has bytecode.
    pub fn is_empty(&self) -> bool {
        self.backends().is_empty()
    }
}

/// Shader bytecode keyed by shader file name.
///
/// Pipelines look up their bytecode here at creation time. A missing entry
/// produces a pipeline with empty blobs, which the host may fill in itself.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    shaders: BTreeMap<String, ComputeShader>,
}

impl ShaderLibrary {
    /// Create an empty library.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a shader under the given file name.
    pub fn with_shader(mut self, file_name: impl Into<String>, shader: ComputeShader) -> Self {
        self.shaders.insert(file_name.into(), shader);
        self
    }

    /// Add a shader under the given file name.
    pub fn insert(&mut self, file_name: impl Into<String>, shader: ComputeShader) {
        self.shaders.insert(file_name.into(), shader);
    }

    /// Look up a shader by file name.
    pub fn get(&self, file_name: &str) -> Option<&ComputeShader> {
        self.shaders.get(file_name)
    }

    /// Number of shaders in the library.
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Check if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Backends present in every shader of the library.
    ///
    /// An empty library reports no backends.
    pub fn available_backends(&self) -> ShaderBackends {
        let mut shaders = self.shaders.values();
        let Some(first) = shaders.next() else {
            return ShaderBackends::empty();
        };
        shaders.fold(first.backends(), |acc, shader| acc & shader.backends())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_backends() {
        let shader = ComputeShader::new(vec![1u8, 2], Vec::new(), vec![3u8]);
        assert_eq!(shader.backends(), ShaderBackends::DXBC | ShaderBackends::SPIRV);
        assert!(!shader.is_empty());
        assert!(ComputeShader::default().is_empty());
    }

    #[test]
    fn test_library_backends_intersection() {
        let library = ShaderLibrary::empty()
            .with_shader("a.cs", ComputeShader::new(vec![1u8], vec![1u8], vec![1u8]))
            .with_shader("b.cs", ComputeShader::new(Vec::new(), vec![1u8], vec![1u8]));
        assert_eq!(library.len(), 2);
        assert_eq!(
            library.available_backends(),
            ShaderBackends::DXIL | ShaderBackends::SPIRV
        );
        assert!(library.get("a.cs").is_some());
        assert!(library.get("c.cs").is_none());
    }

    #[test]
    fn test_empty_library() {
        let library = ShaderLibrary::empty();
        assert!(library.is_empty());
        assert_eq!(library.available_backends(), ShaderBackends::empty());
    }
}
