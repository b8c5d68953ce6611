//! Declared compute passes.

use super::ResourceBinding;
use crate::types::{DescriptorRangeDesc, DescriptorType};

/// Method-local identifier of a pass.
///
/// Methods define their pass identifiers as constants and use them to pick
/// the constant layout while packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u16);

impl PassId {
    /// Create a pass identifier.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// Thread group size of a compute dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSize {
    pub width: u16,
    pub height: u16,
}

impl TileSize {
    /// Create a tile size.
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::new(8, 8)
    }
}

/// Shader entry point of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderRef {
    /// Shader file name, also the key into the shader library.
    pub file_name: String,
    /// Entry point name.
    pub entry_point: String,
}

impl ShaderRef {
    /// Reference the `main` entry point of a shader.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            entry_point: "main".to_string(),
        }
    }

    /// Use a different entry point.
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }
}

impl From<&str> for ShaderRef {
    fn from(file_name: &str) -> Self {
        Self::new(file_name)
    }
}

/// A finalized pass of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub id: PassId,
    pub name: String,
    pub shader: ShaderRef,
    /// Index into the denoiser's pipeline list.
    pub pipeline_index: u16,
    pub inputs: Vec<ResourceBinding>,
    pub outputs: Vec<ResourceBinding>,
    /// Declared constant data size in bytes.
    pub constant_size: u32,
    /// The pass runs at the method resolution divided by this value.
    pub resolution_divisor: u16,
    pub tile_size: TileSize,
}

impl PassDesc {
    /// Inputs followed by outputs, the order resources are bound in.
    pub fn bindings(&self) -> impl Iterator<Item = &ResourceBinding> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Number of bindings with the given state.
    pub fn count(&self, state: DescriptorType) -> u32 {
        self.bindings().filter(|b| b.state == state).count() as u32
    }
}

/// Group bindings into descriptor ranges.
///
/// Each run of consecutive bindings with the same state becomes one range.
/// Textures and storage textures use separate register spaces, each starting
/// at 0 and advancing by the length of every run, so registers have no gaps.
pub fn derive_descriptor_ranges<'a>(
    bindings: impl IntoIterator<Item = &'a ResourceBinding>,
) -> Vec<DescriptorRangeDesc> {
    let mut ranges: Vec<DescriptorRangeDesc> = Vec::new();
    let mut next_register = [0u32; 2];

    for binding in bindings {
        let space = register_space(binding.state);
        match ranges.last_mut() {
            Some(last) if last.descriptor_type == binding.state => last.descriptor_num += 1,
            _ => ranges.push(DescriptorRangeDesc {
                descriptor_type: binding.state,
                base_register_index: next_register[space],
                descriptor_num: 1,
            }),
        }
        next_register[space] += 1;
    }

    ranges
}

fn register_space(state: DescriptorType) -> usize {
    usize::from(state.is_write())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ResourceView;
    use crate::types::ResourceType;

    fn binding(state: DescriptorType) -> ResourceBinding {
        ResourceBinding {
            state,
            view: ResourceView::new(ResourceType::InViewZ),
        }
    }

    #[test]
    fn test_ranges_from_runs() {
        let bindings = [
            binding(DescriptorType::Texture),
            binding(DescriptorType::Texture),
            binding(DescriptorType::Texture),
            binding(DescriptorType::StorageTexture),
            binding(DescriptorType::StorageTexture),
        ];
        let ranges = derive_descriptor_ranges(&bindings);
        assert_eq!(
            ranges,
            vec![
                DescriptorRangeDesc {
                    descriptor_type: DescriptorType::Texture,
                    base_register_index: 0,
                    descriptor_num: 3,
                },
                DescriptorRangeDesc {
                    descriptor_type: DescriptorType::StorageTexture,
                    base_register_index: 0,
                    descriptor_num: 2,
                },
            ]
        );
    }

    #[test]
    fn test_interleaved_runs_continue_register_space() {
        let bindings = [
            binding(DescriptorType::Texture),
            binding(DescriptorType::StorageTexture),
            binding(DescriptorType::Texture),
            binding(DescriptorType::Texture),
        ];
        let ranges = derive_descriptor_ranges(&bindings);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].base_register_index, 1);
        assert_eq!(ranges[2].descriptor_num, 2);
    }

    #[test]
    fn test_no_bindings_no_ranges() {
        assert!(derive_descriptor_ranges(&[]).is_empty());
    }

    #[test]
    fn test_shader_ref() {
        let shader = ShaderRef::from("Blur.cs");
        assert_eq!(shader.entry_point, "main");
        let shader = shader.with_entry_point("blur_x");
        assert_eq!(shader.entry_point, "blur_x");
    }

    #[test]
    fn test_default_tile() {
        assert_eq!(TileSize::default(), TileSize::new(8, 8));
    }
}
