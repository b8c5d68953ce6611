//! The denoiser instance: creation, settings and frame recording.

use std::fmt;
use std::sync::Arc;

use static_assertions::assert_impl_all;

use crate::VERSION;
use crate::allocator::{ConstantArena, MemoryAllocator, SystemAllocator};
use crate::constants::FrameContext;
use crate::dispatch::{DispatchDesc, FrameRecorder};
use crate::error::{DenoiserError, Result};
use crate::method::{DenoiseMethod, MethodDesc};
use crate::pool::TransientMergePolicy;
use crate::registry::{DenoiserDesc, FinalizedLayout, MethodHandle, MethodRegistry};
use crate::settings::{CommonSettings, MethodSettings};
use crate::types::ShaderLibrary;

enum MethodRequest {
    Builtin(MethodDesc),
    Custom {
        method: Box<dyn DenoiseMethod>,
        width: u16,
        height: u16,
    },
}

/// Everything needed to create a [`Denoiser`].
///
/// ```
/// use redlilium_denoiser::{Denoiser, DenoiserCreationDesc, Method, MethodDesc};
///
/// let denoiser = Denoiser::new(
///     DenoiserCreationDesc::new()
///         .with_method(MethodDesc::new(Method::Specular, 1920, 1080))
///         .with_validation(true),
/// )
/// .unwrap();
/// assert_eq!(denoiser.method_handles().len(), 1);
/// ```
pub struct DenoiserCreationDesc {
    methods: Vec<MethodRequest>,
    /// Check packed constant sizes every frame.
    pub enable_validation: bool,
    pub transient_policy: TransientMergePolicy,
    /// Allocator backing the per-frame constant storage.
    pub allocator: Arc<dyn MemoryAllocator>,
    /// Bytecode for the pipelines.
    pub shaders: ShaderLibrary,
}

impl Default for DenoiserCreationDesc {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            enable_validation: cfg!(debug_assertions),
            transient_policy: TransientMergePolicy::default(),
            allocator: Arc::new(SystemAllocator),
            shaders: ShaderLibrary::empty(),
        }
    }
}

impl DenoiserCreationDesc {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a built-in method. Methods are registered in request order.
    pub fn with_method(mut self, desc: MethodDesc) -> Self {
        self.methods.push(MethodRequest::Builtin(desc));
        self
    }

    /// Request a host-defined method.
    pub fn with_custom_method(
        mut self,
        method: Box<dyn DenoiseMethod>,
        width: u16,
        height: u16,
    ) -> Self {
        self.methods.push(MethodRequest::Custom {
            method,
            width,
            height,
        });
        self
    }

    /// Enable or disable constant validation.
    pub fn with_validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Set the transient merge policy.
    pub fn with_transient_policy(mut self, policy: TransientMergePolicy) -> Self {
        self.transient_policy = policy;
        self
    }

    /// Set the allocator.
    pub fn with_allocator(mut self, allocator: Arc<dyn MemoryAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Set the shader library.
    pub fn with_shaders(mut self, shaders: ShaderLibrary) -> Self {
        self.shaders = shaders;
        self
    }
}

impl fmt::Debug for DenoiserCreationDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenoiserCreationDesc")
            .field("method_count", &self.methods.len())
            .field("enable_validation", &self.enable_validation)
            .field("transient_policy", &self.transient_policy)
            .field("shaders", &self.shaders.len())
            .finish()
    }
}

/// A denoiser instance.
///
/// Created once with its methods; [`Denoiser::desc`] tells the host what to
/// allocate. Each frame the host updates settings and calls
/// [`Denoiser::record_frame`] to get the dispatches to execute.
#[derive(Debug)]
pub struct Denoiser {
    registry: MethodRegistry,
    layout: FinalizedLayout,
    arena: ConstantArena,
    recorder: FrameRecorder,
    common_settings: CommonSettings,
    frame: FrameContext,
    validation: bool,
}

assert_impl_all!(Denoiser: Send, Sync);

impl Denoiser {
    /// Build every requested method and compute the static description.
    pub fn new(desc: DenoiserCreationDesc) -> Result<Self> {
        crate::profile_function!();

        let mut registry = MethodRegistry::new(desc.transient_policy, desc.shaders);
        for request in desc.methods {
            match request {
                MethodRequest::Builtin(method) => registry.register_method(method)?,
                MethodRequest::Custom {
                    method,
                    width,
                    height,
                } => registry.register_custom(method, width, height)?,
            };
        }

        let layout = registry.finalize()?;
        let mut arena = ConstantArena::new(desc.allocator);
        arena.reserve(layout.constant_arena_size)?;

        let common_settings = CommonSettings::default();
        let frame = FrameContext::new(&common_settings)?;

        log::info!(
            "RedLilium denoiser v{VERSION} created: {} methods, {} pipelines, {} permanent and {} transient textures",
            registry.methods().len(),
            layout.desc.pipelines.len(),
            layout.desc.permanent_pool.len(),
            layout.desc.transient_pool.len()
        );

        Ok(Self {
            registry,
            layout,
            arena,
            recorder: FrameRecorder::new(),
            common_settings,
            frame,
            validation: desc.enable_validation,
        })
    }

    /// Static description for host-side allocation.
    pub fn desc(&self) -> &DenoiserDesc {
        &self.layout.desc
    }

    /// Registered methods.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Handles of all methods, in registration order.
    pub fn method_handles(&self) -> Vec<MethodHandle> {
        self.registry.methods().iter().map(|m| m.handle()).collect()
    }

    /// Whether constant validation is enabled.
    pub fn validation_enabled(&self) -> bool {
        self.validation
    }

    /// Current common settings.
    pub fn common_settings(&self) -> &CommonSettings {
        &self.common_settings
    }

    /// Frame state derived from the current common settings.
    pub fn frame_context(&self) -> &FrameContext {
        &self.frame
    }

    /// Register another built-in method and recompute the description.
    ///
    /// Pool slots of existing methods keep their indices; the host must
    /// reallocate from the new [`Denoiser::desc`].
    pub fn register_method(&mut self, desc: MethodDesc) -> Result<MethodHandle> {
        self.register_with(|registry| registry.register_method(desc))
    }

    /// Register another host-defined method and recompute the description.
    pub fn register_custom(
        &mut self,
        method: Box<dyn DenoiseMethod>,
        width: u16,
        height: u16,
    ) -> Result<MethodHandle> {
        self.register_with(|registry| registry.register_custom(method, width, height))
    }

    /// Register through `register`, then finalize and grow the arena.
    ///
    /// The registration is only kept if every step succeeds; otherwise the
    /// denoiser is left exactly as it was.
    fn register_with(
        &mut self,
        register: impl FnOnce(&mut MethodRegistry) -> Result<MethodHandle>,
    ) -> Result<MethodHandle> {
        let checkpoint = self.registry.checkpoint();
        let handle = register(&mut self.registry)?;

        let layout = match self
            .registry
            .finalize()
            .and_then(|layout| self.arena.reserve(layout.constant_arena_size).map(|()| layout))
        {
            Ok(layout) => layout,
            Err(err) => {
                log::warn!("Rolling back registration of method {}: {err}", handle.index());
                self.registry.rollback(checkpoint);
                return Err(err);
            }
        };

        self.layout = layout;
        Ok(handle)
    }

    /// Replace the common settings for the following frames.
    ///
    /// Invalid settings are rejected and the previous ones stay in effect.
    pub fn set_common_settings(&mut self, settings: CommonSettings) -> Result<()> {
        self.frame = FrameContext::new(&settings)?;
        self.common_settings = settings;
        Ok(())
    }

    /// Replace the settings of one method.
    pub fn set_method_settings(
        &mut self,
        handle: MethodHandle,
        settings: &MethodSettings,
    ) -> Result<()> {
        let entry = self
            .registry
            .get_mut(handle)
            .ok_or_else(|| unknown_handle(handle))?;
        entry.method_mut().set_settings(settings)
    }

    /// Record the dispatches of every method.
    pub fn record_frame(&mut self) -> Result<Vec<DispatchDesc<'_>>> {
        self.record(None)
    }

    /// Record the dispatches of the listed methods only.
    ///
    /// Dispatches still follow registration order, not the order of `handles`.
    pub fn record_methods(&mut self, handles: &[MethodHandle]) -> Result<Vec<DispatchDesc<'_>>> {
        if let Some(&handle) = handles.iter().find(|&&h| self.registry.get(h).is_none()) {
            return Err(unknown_handle(handle));
        }
        self.record(Some(handles))
    }

    fn record(&mut self, only: Option<&[MethodHandle]>) -> Result<Vec<DispatchDesc<'_>>> {
        self.recorder.record(
            &self.registry,
            &self.layout.constant_regions,
            &mut self.arena,
            &self.frame,
            only,
            self.validation,
        )?;
        self.recorder.dispatches(&self.registry, &self.arena)
    }
}

fn unknown_handle(handle: MethodHandle) -> DenoiserError {
    DenoiserError::invalid(format!("unknown method handle {}", handle.index()))
}
