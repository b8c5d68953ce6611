//! Declarative construction of a method's pools and passes.

use super::{
    PassDesc, PassId, PipelineRegistry, ResourceBinding, ResourceSource, ResourceView, ShaderRef,
    TileSize, derive_descriptor_ranges,
};
use crate::constants::{ConstantLayout, validate_constant_size};
use crate::error::{DenoiserError, Result};
use crate::pool::{PoolKind, PoolRegistry, PoolSlot};
use crate::types::{DescriptorType, TextureDesc};

/// Builds one method: declares its pool textures, then its passes in order.
///
/// Every reference is validated when it is added, so a method that builds
/// successfully only references textures and mips that exist.
///
/// ```ignore
/// let history = builder.declare_permanent(TextureDesc::new(Format::Rgba16Sfloat, w, h))?;
///
/// builder.begin_pass(BLUR, "Example - blur", "Blur.cs")?;
/// builder.add_input(ResourceType::InViewZ)?;
/// builder.add_output(history)?;
/// builder.set_constant_layout(ConstantLayout::new(0, 1, 0, 0))?;
/// builder.end_pass()?;
/// ```
#[derive(Debug)]
pub struct MethodBuilder<'a> {
    method: &'a str,
    width: u16,
    height: u16,
    pools: &'a mut PoolRegistry,
    pipelines: &'a mut PipelineRegistry,
    declared: Vec<(PoolSlot, TextureDesc)>,
    passes: Vec<PassDesc>,
    open: Option<OpenPass>,
}

#[derive(Debug)]
struct OpenPass {
    id: PassId,
    name: String,
    shader: ShaderRef,
    inputs: Vec<ResourceBinding>,
    outputs: Vec<ResourceBinding>,
    constant_size: u32,
    resolution_divisor: u16,
    tile_size: TileSize,
}

impl<'a> MethodBuilder<'a> {
    /// Start building a method at the given resolution.
    pub fn new(
        method: &'a str,
        width: u16,
        height: u16,
        pools: &'a mut PoolRegistry,
        pipelines: &'a mut PipelineRegistry,
    ) -> Self {
        pools.begin_method();
        Self {
            method,
            width,
            height,
            pools,
            pipelines,
            declared: Vec::new(),
            passes: Vec::new(),
            open: None,
        }
    }

    /// Method resolution width.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Method resolution height.
    pub fn height(&self) -> u16 {
        self.height
    }

    // ========================================================================
    // Pools
    // ========================================================================

    /// Declare a texture owned by this method for its whole lifetime.
    pub fn declare_permanent(&mut self, desc: TextureDesc) -> Result<PoolSlot> {
        self.declare(PoolKind::Permanent, desc)
    }

    /// Declare a scratch texture that may alias other methods' scratch.
    pub fn declare_transient(&mut self, desc: TextureDesc) -> Result<PoolSlot> {
        self.declare(PoolKind::Transient, desc)
    }

    fn declare(&mut self, kind: PoolKind, desc: TextureDesc) -> Result<PoolSlot> {
        let slot = self.pools.declare(kind, desc)?;
        self.declared.push((slot, desc));
        Ok(slot)
    }

    // ========================================================================
    // Passes
    // ========================================================================

    /// Open a new pass.
    pub fn begin_pass(
        &mut self,
        id: PassId,
        name: impl Into<String>,
        shader: impl Into<ShaderRef>,
    ) -> Result<()> {
        let name = name.into();
        if let Some(open) = &self.open {
            return Err(DenoiserError::invalid(format!(
                "{}: cannot begin pass '{name}' while '{}' is open",
                self.method, open.name
            )));
        }
        if self.passes.iter().any(|p| p.id == id) {
            return Err(DenoiserError::invalid(format!(
                "{}: pass id {} is declared twice",
                self.method,
                id.get()
            )));
        }

        self.open = Some(OpenPass {
            id,
            name,
            shader: shader.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            constant_size: 0,
            resolution_divisor: 1,
            tile_size: TileSize::default(),
        });
        Ok(())
    }

    /// Append a read-only reference to the open pass.
    pub fn add_input(&mut self, view: impl Into<ResourceView>) -> Result<()> {
        self.add_binding(DescriptorType::Texture, view.into())
    }

    /// Append a read/write reference to the open pass.
    pub fn add_output(&mut self, view: impl Into<ResourceView>) -> Result<()> {
        self.add_binding(DescriptorType::StorageTexture, view.into())
    }

    fn add_binding(&mut self, state: DescriptorType, view: ResourceView) -> Result<()> {
        self.validate_view(state, &view)?;
        let open = self.open_pass()?;
        let binding = ResourceBinding { state, view };
        match state {
            DescriptorType::Texture => open.inputs.push(binding),
            DescriptorType::StorageTexture => open.outputs.push(binding),
        }
        Ok(())
    }

    /// Declare the constant data size of the open pass, in bytes.
    pub fn set_constant_size(&mut self, size: u32) -> Result<()> {
        validate_constant_size(size)?;
        self.open_pass()?.constant_size = size;
        Ok(())
    }

    /// Declare the constant data of the open pass from its field counts.
    pub fn set_constant_layout(&mut self, layout: ConstantLayout) -> Result<()> {
        self.set_constant_size(layout.size())
    }

    /// Run the open pass at the method resolution divided by `divisor`.
    pub fn set_resolution_divisor(&mut self, divisor: u16) -> Result<()> {
        if divisor == 0 {
            return Err(DenoiserError::invalid(format!(
                "{}: resolution divisor must be non-zero",
                self.method
            )));
        }
        self.open_pass()?.resolution_divisor = divisor;
        Ok(())
    }

    /// Use a non-default thread group size for the open pass.
    pub fn set_tile_size(&mut self, width: u16, height: u16) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(DenoiserError::invalid(format!(
                "{}: tile size must be non-zero, got {width}x{height}",
                self.method
            )));
        }
        self.open_pass()?.tile_size = TileSize::new(width, height);
        Ok(())
    }

    /// Close the open pass and register its pipeline.
    pub fn end_pass(&mut self) -> Result<PassId> {
        let open = self.open.take().ok_or_else(|| {
            DenoiserError::invalid(format!("{}: end_pass without begin_pass", self.method))
        })?;

        let ranges = derive_descriptor_ranges(open.inputs.iter().chain(open.outputs.iter()));
        let pipeline_index = self
            .pipelines
            .intern(&open.shader, ranges, open.constant_size > 0)?;

        self.passes.push(PassDesc {
            id: open.id,
            name: open.name,
            shader: open.shader,
            pipeline_index,
            inputs: open.inputs,
            outputs: open.outputs,
            constant_size: open.constant_size,
            resolution_divisor: open.resolution_divisor,
            tile_size: open.tile_size,
        });
        Ok(open.id)
    }

    /// Finish the method and return its passes in declaration order.
    pub fn finish(self) -> Result<Vec<PassDesc>> {
        if let Some(open) = &self.open {
            return Err(DenoiserError::invalid(format!(
                "{}: pass '{}' was never ended",
                self.method, open.name
            )));
        }
        if self.passes.is_empty() {
            return Err(DenoiserError::invalid(format!(
                "{}: a method needs at least one pass",
                self.method
            )));
        }
        Ok(self.passes)
    }

    fn open_pass(&mut self) -> Result<&mut OpenPass> {
        let method = self.method;
        self.open
            .as_mut()
            .ok_or_else(|| DenoiserError::invalid(format!("{method}: no pass is open")))
    }

    /// Check a view against this method's own declarations.
    fn validate_view(&self, state: DescriptorType, view: &ResourceView) -> Result<()> {
        if view.mip_num() == 0 {
            return Err(DenoiserError::invalid(format!(
                "{}: a view must cover at least one mip",
                self.method
            )));
        }

        match view.source() {
            ResourceSource::User(ty) => {
                if ty.is_pool() {
                    return Err(DenoiserError::invalid(format!(
                        "{}: {ty:?} must be referenced through a declared pool slot",
                        self.method
                    )));
                }
                if view.ping_pong_slot().is_some() {
                    return Err(DenoiserError::invalid(format!(
                        "{}: {ty:?} cannot ping-pong",
                        self.method
                    )));
                }
                if state.is_write() && !ty.is_output() {
                    return Err(DenoiserError::invalid(format!(
                        "{}: host input {ty:?} cannot be bound for writing",
                        self.method
                    )));
                }
                self.check_mips(view, 1, &format!("{ty:?}"))
            }
            ResourceSource::Pool(slot) => {
                for slot in std::iter::once(slot).chain(view.ping_pong_slot()) {
                    let desc = self.declared_desc(slot)?;
                    self.check_mips(view, desc.mip_num, &format!("{slot:?}"))?;
                }
                Ok(())
            }
        }
    }

    fn declared_desc(&self, slot: PoolSlot) -> Result<&TextureDesc> {
        self.declared
            .iter()
            .find(|(declared, _)| *declared == slot)
            .map(|(_, desc)| desc)
            .ok_or_else(|| {
                DenoiserError::invalid(format!(
                    "{}: {slot:?} was not declared by this method",
                    self.method
                ))
            })
    }

    fn check_mips(&self, view: &ResourceView, mip_num: u16, what: &str) -> Result<()> {
        let end = view.mip_offset() as u32 + view.mip_num() as u32;
        if end > mip_num as u32 {
            return Err(DenoiserError::invalid(format!(
                "{}: mips [{}, {}] of {what} exceed its {mip_num} mip(s)",
                self.method,
                view.mip_offset(),
                view.mip_num()
            )));
        }
        Ok(())
    }
}
