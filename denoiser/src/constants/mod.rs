//! Per-frame constant packing.
//!
//! Every pass declares the size of its constant data at build time (usually
//! through a [`ConstantLayout`]). Each frame the recorder writes the
//! [`SharedConstants`] block into the pass's region, lets the method append its
//! pass-specific fields through a [`ConstantWriter`], and checks the packed
//! size against the declaration.

mod frame;
mod layout;
mod writer;

pub use frame::{FrameContext, SharedConstants};
pub use layout::{
    ConstantLayout, MAX_CONSTANT_DATA_SIZE, SHARED_CONSTANT_SIZE, validate_constant_size,
};
pub use writer::ConstantWriter;
