//! Registered methods and the global budgets derived from them.

use crate::allocator::{ArenaRegion, ConstantArena, align_up};
use crate::error::{DenoiserError, Result};
use crate::graph::{MethodBuilder, PassDesc, PipelineDesc, PipelineRegistry};
use crate::method::{DenoiseMethod, MethodDesc};
use crate::pool::{PoolRegistry, TransientMergePolicy};
use crate::types::{
    ConstantBufferDesc, DescriptorSetDesc, DescriptorType, STATIC_SAMPLERS, ShaderLibrary,
    StaticSamplerDesc, TextureDesc,
};

/// Registry state saved before a registration that may need undoing.
#[derive(Debug)]
pub(crate) struct RegistryCheckpoint {
    pools: PoolRegistry,
    pipelines: PipelineRegistry,
    method_count: usize,
}

/// Opaque handle to a registered method.
///
/// Handles are only valid for the denoiser that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodHandle(u32);

impl MethodHandle {
    /// Registration index of the method.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A method together with its resolution and built passes.
#[derive(Debug)]
pub struct MethodEntry {
    handle: MethodHandle,
    method: Box<dyn DenoiseMethod>,
    width: u16,
    height: u16,
    passes: Vec<PassDesc>,
}

impl MethodEntry {
    /// Handle of the method.
    pub fn handle(&self) -> MethodHandle {
        self.handle
    }

    /// Method name.
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// The method implementation.
    pub fn method(&self) -> &dyn DenoiseMethod {
        self.method.as_ref()
    }

    pub(crate) fn method_mut(&mut self) -> &mut dyn DenoiseMethod {
        self.method.as_mut()
    }

    /// Full resolution width.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Full resolution height.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Passes in declaration order.
    pub fn passes(&self) -> &[PassDesc] {
        &self.passes
    }
}

/// Everything the host needs to allocate for a denoiser.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiserDesc {
    pub pipelines: Vec<PipelineDesc>,
    pub static_samplers: Vec<StaticSamplerDesc>,
    pub permanent_pool: Vec<TextureDesc>,
    pub transient_pool: Vec<TextureDesc>,
    pub constant_buffer: ConstantBufferDesc,
    pub descriptor_set: DescriptorSetDesc,
}

/// Result of [`MethodRegistry::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedLayout {
    /// Static description for the host.
    pub desc: DenoiserDesc,
    /// Constant region of every pass, indexed by method then pass.
    pub constant_regions: Vec<Vec<ArenaRegion>>,
    /// Bytes of constant arena needed for a full frame.
    pub constant_arena_size: usize,
}

/// Ordered list of enabled methods with their shared pools and pipelines.
#[derive(Debug)]
pub struct MethodRegistry {
    pools: PoolRegistry,
    pipelines: PipelineRegistry,
    methods: Vec<MethodEntry>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new(policy: TransientMergePolicy, library: ShaderLibrary) -> Self {
        Self {
            pools: PoolRegistry::new(policy),
            pipelines: PipelineRegistry::new(library),
            methods: Vec::new(),
        }
    }

    /// Build and register a built-in method.
    pub fn register_method(&mut self, desc: MethodDesc) -> Result<MethodHandle> {
        self.register_custom(
            desc.method.create(),
            desc.full_resolution_width,
            desc.full_resolution_height,
        )
    }

    /// Build and register any method implementation.
    ///
    /// On failure the pools and pipelines are left exactly as before the call.
    pub fn register_custom(
        &mut self,
        method: Box<dyn DenoiseMethod>,
        width: u16,
        height: u16,
    ) -> Result<MethodHandle> {
        crate::profile_function!();

        if width == 0 || height == 0 {
            return Err(DenoiserError::invalid(format!(
                "{}: resolution must be non-zero, got {width}x{height}",
                method.name()
            )));
        }
        let max = method.max_resolution();
        if width > max || height > max {
            return Err(DenoiserError::invalid(format!(
                "{}: resolution {width}x{height} exceeds the maximum of {max}",
                method.name()
            )));
        }

        let handle = u32::try_from(self.methods.len())
            .map(MethodHandle)
            .map_err(|_| DenoiserError::failure("too many methods".to_string()))?;

        let checkpoint = self.checkpoint();
        let passes = match build_passes(
            method.as_ref(),
            width,
            height,
            &mut self.pools,
            &mut self.pipelines,
        ) {
            Ok(passes) => passes,
            Err(err) => {
                self.rollback(checkpoint);
                return Err(err);
            }
        };

        log::debug!(
            "Registered method '{}' at {width}x{height}: {} passes",
            method.name(),
            passes.len()
        );

        self.methods.push(MethodEntry {
            handle,
            method,
            width,
            height,
            passes,
        });
        Ok(handle)
    }

    /// Capture the current pools, pipelines and method count.
    pub(crate) fn checkpoint(&self) -> RegistryCheckpoint {
        RegistryCheckpoint {
            pools: self.pools.clone(),
            pipelines: self.pipelines.clone(),
            method_count: self.methods.len(),
        }
    }

    /// Drop everything registered since `checkpoint` was taken.
    pub(crate) fn rollback(&mut self, checkpoint: RegistryCheckpoint) {
        self.pools = checkpoint.pools;
        self.pipelines = checkpoint.pipelines;
        self.methods.truncate(checkpoint.method_count);
    }

    /// Registered methods in registration order.
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    /// Look up a method.
    pub fn get(&self, handle: MethodHandle) -> Option<&MethodEntry> {
        self.methods.get(handle.index())
    }

    pub(crate) fn get_mut(&mut self, handle: MethodHandle) -> Option<&mut MethodEntry> {
        self.methods.get_mut(handle.index())
    }

    /// Shared texture pools.
    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    /// Deduplicated pipelines.
    pub fn pipelines(&self) -> &[PipelineDesc] {
        self.pipelines.pipelines()
    }

    /// Compute the global description and constant layout.
    ///
    /// Must be called again after registering more methods.
    pub fn finalize(&self) -> Result<FinalizedLayout> {
        crate::profile_function!();

        if self.methods.is_empty() {
            return Err(DenoiserError::invalid("no methods registered".to_string()));
        }

        let mut descriptor_set = DescriptorSetDesc {
            static_sampler_max_num: STATIC_SAMPLERS.len() as u32,
            ..Default::default()
        };
        let mut max_data_size = 0;
        let mut arena_size = 0;
        let mut constant_regions = Vec::with_capacity(self.methods.len());

        for entry in &self.methods {
            let mut regions = Vec::with_capacity(entry.passes.len());
            for pass in &entry.passes {
                let textures = pass.count(DescriptorType::Texture);
                let storage_textures = pass.count(DescriptorType::StorageTexture);

                descriptor_set.set_max_num += 1;
                descriptor_set.texture_max_num += textures;
                descriptor_set.storage_texture_max_num += storage_textures;
                descriptor_set.texture_max_num_per_set =
                    descriptor_set.texture_max_num_per_set.max(textures);
                descriptor_set.storage_texture_max_num_per_set =
                    descriptor_set.storage_texture_max_num_per_set.max(storage_textures);
                if pass.constant_size > 0 {
                    descriptor_set.constant_buffer_max_num += 1;
                }

                max_data_size = max_data_size.max(pass.constant_size);

                let offset = align_up(arena_size, ConstantArena::ALIGNMENT);
                let region = ArenaRegion::new(offset, pass.constant_size as usize);
                arena_size = region.end();
                regions.push(region);
            }
            constant_regions.push(regions);
        }

        descriptor_set.descriptor_range_max_num_per_pipeline = self
            .pipelines()
            .iter()
            .map(|p| p.descriptor_ranges.len() as u32)
            .max()
            .unwrap_or(0);

        let desc = DenoiserDesc {
            pipelines: self.pipelines().to_vec(),
            static_samplers: STATIC_SAMPLERS.to_vec(),
            permanent_pool: self.pools.permanent().to_vec(),
            transient_pool: self.pools.transient().to_vec(),
            constant_buffer: ConstantBufferDesc {
                register_index: 0,
                max_data_size,
            },
            descriptor_set,
        };

        log::debug!(
            "Finalized {} methods: {} pipelines, {} dispatches, constant buffer {} bytes",
            self.methods.len(),
            desc.pipelines.len(),
            descriptor_set.set_max_num,
            max_data_size
        );

        Ok(FinalizedLayout {
            desc,
            constant_regions,
            constant_arena_size: align_up(arena_size, ConstantArena::ALIGNMENT),
        })
    }
}

fn build_passes(
    method: &dyn DenoiseMethod,
    width: u16,
    height: u16,
    pools: &mut PoolRegistry,
    pipelines: &mut PipelineRegistry,
) -> Result<Vec<PassDesc>> {
    let mut builder = MethodBuilder::new(method.name(), width, height, pools, pipelines);
    method.build(&mut builder)?;
    builder.finish()
}
