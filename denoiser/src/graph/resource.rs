//! Resource references declared by passes.

use crate::pool::PoolSlot;
use crate::types::{DescriptorType, Resource, ResourceType};

/// What a pass reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceSource {
    /// A host-provided input or output.
    User(ResourceType),
    /// A texture in one of the denoiser pools.
    Pool(PoolSlot),
}

impl From<ResourceType> for ResourceSource {
    fn from(ty: ResourceType) -> Self {
        Self::User(ty)
    }
}

impl From<PoolSlot> for ResourceSource {
    fn from(slot: PoolSlot) -> Self {
        Self::Pool(slot)
    }
}

/// A view over a resource: a mip sub-range and an optional ping-pong partner.
///
/// ```ignore
/// builder.add_input(ResourceView::from(accumulated).mips(1, 4))?;
/// builder.add_output(ResourceView::from(history_a).ping_pong(history_b))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceView {
    source: ResourceSource,
    mip_offset: u16,
    mip_num: u16,
    ping_pong: Option<PoolSlot>,
}

impl ResourceView {
    /// View the first mip of a resource.
    pub fn new(source: impl Into<ResourceSource>) -> Self {
        Self {
            source: source.into(),
            mip_offset: 0,
            mip_num: 1,
            ping_pong: None,
        }
    }

    /// Restrict the view to `[mip_offset, mip_offset + mip_num)`.
    pub fn mips(mut self, mip_offset: u16, mip_num: u16) -> Self {
        self.mip_offset = mip_offset;
        self.mip_num = mip_num;
        self
    }

    /// Bind `other` instead of the main slot on odd frames.
    pub fn ping_pong(mut self, other: PoolSlot) -> Self {
        self.ping_pong = Some(other);
        self
    }

    /// Referenced resource.
    pub fn source(&self) -> ResourceSource {
        self.source
    }

    /// First mip of the view.
    pub fn mip_offset(&self) -> u16 {
        self.mip_offset
    }

    /// Number of mips in the view.
    pub fn mip_num(&self) -> u16 {
        self.mip_num
    }

    /// Slot bound on odd frames, if any.
    pub fn ping_pong_slot(&self) -> Option<PoolSlot> {
        self.ping_pong
    }

    /// Source bound for a given frame.
    pub fn source_for_frame(&self, frame_index: u32) -> ResourceSource {
        match self.ping_pong {
            Some(other) if frame_index & 1 == 1 => ResourceSource::Pool(other),
            _ => self.source,
        }
    }
}

impl From<ResourceType> for ResourceView {
    fn from(ty: ResourceType) -> Self {
        Self::new(ty)
    }
}

impl From<PoolSlot> for ResourceView {
    fn from(slot: PoolSlot) -> Self {
        Self::new(slot)
    }
}

/// A validated reference stored in a pass, with its required binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceBinding {
    /// Binding state the shader needs.
    pub state: DescriptorType,
    /// Referenced view.
    pub view: ResourceView,
}

impl ResourceBinding {
    /// Flatten into the dispatch-level reference for a frame.
    pub fn resolve(&self, frame_index: u32) -> Resource {
        let (ty, index_in_pool) = match self.view.source_for_frame(frame_index) {
            ResourceSource::User(ty) => (ty, 0),
            ResourceSource::Pool(slot) => (slot.kind().resource_type(), slot.index()),
        };
        Resource {
            state_needed: self.state,
            ty,
            index_in_pool,
            mip_offset: self.view.mip_offset,
            mip_num: self.view.mip_num,
        }
    }
}
