//! Pass graph construction.
//!
//! A method is described once, at creation time, as an ordered list of compute
//! passes. Each pass names a shader, the resources it reads and writes, and the
//! size of its constant data. The order of passes and of references inside a
//! pass is exactly the order the host must execute and bind them in; the
//! binding state of each reference is what the host uses to place barriers.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MethodBuilder`] | Declares pools and passes of one method |
//! | [`PassDesc`] | A finalized pass |
//! | [`ResourceView`] | Mip range and ping-pong partner of a reference |
//! | [`PipelineRegistry`] | Deduplicated pipelines shared by all methods |

mod builder;
mod pass;
mod pipeline;
mod resource;

pub use builder::MethodBuilder;
pub use pass::{PassDesc, PassId, ShaderRef, TileSize, derive_descriptor_ranges};
pub use pipeline::{PipelineDesc, PipelineRegistry};
pub use resource::{ResourceBinding, ResourceSource, ResourceView};
