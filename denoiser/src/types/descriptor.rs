//! Descriptor binding types and budgets.

/// How a resource must be bound for a pass.
///
/// The host uses this state to infer hazards: a `StorageTexture` reference is a
/// write (and possibly a read), a `Texture` reference is a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    /// Read-only sampled texture.
    Texture,
    /// Read/write storage texture.
    StorageTexture,
}

impl DescriptorType {
    /// Check if this binding state allows writes.
    pub fn is_write(self) -> bool {
        matches!(self, Self::StorageTexture)
    }
}

/// A contiguous range of same-typed descriptors in a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRangeDesc {
    /// Descriptor type of every entry in the range.
    pub descriptor_type: DescriptorType,
    /// First shader register of the range.
    pub base_register_index: u32,
    /// Number of descriptors in the range.
    pub descriptor_num: u32,
}

/// Descriptor budget the host must provision for one frame of dispatches.
///
/// Totals size the descriptor heap for every dispatch of a frame; the
/// `*_per_set` values are the maximum any single dispatch binds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DescriptorSetDesc {
    /// Maximum number of descriptor sets (one per dispatch).
    pub set_max_num: u32,
    /// Maximum number of constant buffer views.
    pub constant_buffer_max_num: u32,
    /// Number of static samplers.
    pub static_sampler_max_num: u32,
    /// Total read-only texture descriptors over all dispatches.
    pub texture_max_num: u32,
    /// Total storage texture descriptors over all dispatches.
    pub storage_texture_max_num: u32,
    /// Maximum read-only textures bound by a single dispatch.
    pub texture_max_num_per_set: u32,
    /// Maximum storage textures bound by a single dispatch.
    pub storage_texture_max_num_per_set: u32,
    /// Maximum descriptor ranges of any pipeline.
    pub descriptor_range_max_num_per_pipeline: u32,
}

/// The single constant buffer shared by all pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstantBufferDesc {
    /// Shader register of the constant buffer.
    pub register_index: u32,
    /// Largest constant payload of any pass, in bytes.
    pub max_data_size: u32,
}
