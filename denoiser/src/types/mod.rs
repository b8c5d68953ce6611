//! Core types shared by the builder, the registry and the recorder.

mod descriptor;
mod format;
mod resource;
mod sampler;
mod shader;
mod texture;

pub use descriptor::*;
pub use format::*;
pub use resource::*;
pub use sampler::*;
pub use shader::*;
pub use texture::*;
