//! Compute pipelines and their deduplication.

use super::ShaderRef;
use crate::error::{DenoiserError, Result};
use crate::types::{ComputeShader, DescriptorRangeDesc, ShaderLibrary};

/// A compute pipeline the host must create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDesc {
    /// Bytecode for every backend.
    pub shader: ComputeShader,
    pub shader_file_name: String,
    pub shader_entry_point: String,
    /// Descriptor layout, in binding order.
    pub descriptor_ranges: Vec<DescriptorRangeDesc>,
    /// Whether the pipeline binds the constant buffer.
    pub has_constant_data: bool,
}

impl PipelineDesc {
    fn matches(&self, shader: &ShaderRef, ranges: &[DescriptorRangeDesc], has_constant_data: bool) -> bool {
        self.shader_file_name == shader.file_name
            && self.shader_entry_point == shader.entry_point
            && self.descriptor_ranges == ranges
            && self.has_constant_data == has_constant_data
    }
}

/// Ordered, deduplicated pipeline list shared by all methods.
#[derive(Debug, Clone, Default)]
pub struct PipelineRegistry {
    library: ShaderLibrary,
    pipelines: Vec<PipelineDesc>,
}

impl PipelineRegistry {
    /// Create an empty registry that takes bytecode from `library`.
    pub fn new(library: ShaderLibrary) -> Self {
        Self {
            library,
            pipelines: Vec::new(),
        }
    }

    /// Return the index of an identical pipeline, creating it if needed.
    pub fn intern(
        &mut self,
        shader: &ShaderRef,
        descriptor_ranges: Vec<DescriptorRangeDesc>,
        has_constant_data: bool,
    ) -> Result<u16> {
        if let Some(index) = self
            .pipelines
            .iter()
            .position(|p| p.matches(shader, &descriptor_ranges, has_constant_data))
        {
            return pipeline_index(index);
        }

        let index = pipeline_index(self.pipelines.len())?;
        let bytecode = match self.library.get(&shader.file_name) {
            Some(bytecode) => bytecode.clone(),
            None => {
                log::warn!(
                    "No bytecode for shader '{}'; pipeline {index} has empty blobs",
                    shader.file_name
                );
                ComputeShader::default()
            }
        };

        self.pipelines.push(PipelineDesc {
            shader: bytecode,
            shader_file_name: shader.file_name.clone(),
            shader_entry_point: shader.entry_point.clone(),
            descriptor_ranges,
            has_constant_data,
        });
        Ok(index)
    }

    /// All pipelines, in index order.
    pub fn pipelines(&self) -> &[PipelineDesc] {
        &self.pipelines
    }

    /// Shader library used for bytecode lookups.
    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }
}

fn pipeline_index(index: usize) -> Result<u16> {
    u16::try_from(index)
        .map_err(|_| DenoiserError::failure(format!("pipeline index {index} exceeds u16")))
}
