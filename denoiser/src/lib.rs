//! # RedLilium Denoiser
//!
//! Construction and per-frame recording of real-time denoisers that run as a
//! chain of GPU compute passes. The crate never touches a GPU: it tells the
//! host which textures, pipelines and descriptors to create, and each frame
//! hands back an ordered list of dispatches with packed constant data.
//!
//! ## Overview
//!
//! - [`Denoiser`] - A denoiser instance built from one or more methods
//! - [`DenoiseMethod`] - Trait implemented by built-in and host methods
//! - [`MethodBuilder`] - Declares pool textures and passes of a method
//! - [`DenoiserDesc`] - Pipelines, pools and descriptor budgets for the host
//! - [`DispatchDesc`] - One compute dispatch of a recorded frame
//!
//! ## Example
//!
//! ```
//! use redlilium_denoiser::{
//!     CommonSettings, Denoiser, DenoiserCreationDesc, Method, MethodDesc,
//! };
//!
//! let mut denoiser = Denoiser::new(
//!     DenoiserCreationDesc::new().with_method(MethodDesc::new(Method::Diffuse, 1280, 720)),
//! )
//! .unwrap();
//!
//! // Allocate textures and pipelines from `denoiser.desc()` once, then per frame:
//! denoiser
//!     .set_common_settings(CommonSettings {
//!         frame_index: 1,
//!         ..Default::default()
//!     })
//!     .unwrap();
//! for dispatch in denoiser.record_frame().unwrap() {
//!     assert!(dispatch.grid_width > 0 && dispatch.grid_height > 0);
//! }
//! ```

pub mod allocator;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod math;
pub mod method;
pub mod pool;
pub mod profiling;
pub mod registry;
pub mod settings;
pub mod types;

mod denoiser;
mod library;

pub use allocator::{MemoryAllocator, SystemAllocator};
pub use denoiser::{Denoiser, DenoiserCreationDesc};
pub use dispatch::DispatchDesc;
pub use error::{DenoiserError, Result, ResultCode};
pub use graph::{MethodBuilder, PassId, ResourceView, ShaderRef};
pub use library::{LibraryDesc, SpirvBindingOffsets, library_desc};
pub use method::{DenoiseMethod, Method, MethodDesc, PackContext};
pub use pool::{PoolSlot, TransientMergePolicy};
pub use registry::{DenoiserDesc, MethodHandle};
pub use settings::{
    CommonSettings, DiffuseSettings, MethodSettings, ReferenceSettings, ReflectionMvSettings,
    ShadowSettings, SpecularSettings,
};
pub use types::{
    ComputeShader, Format, Resource, ResourceType, ShaderBackends, ShaderLibrary, TextureDesc,
};

/// Denoiser library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
