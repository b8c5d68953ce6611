//! Shared helpers for denoiser integration tests.

#![allow(dead_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use redlilium_denoiser::constants::ConstantWriter;
use redlilium_denoiser::math::Vec4;
use redlilium_denoiser::{
    DenoiseMethod, DenoiserError, Format, MemoryAllocator, MethodBuilder, PackContext, PassId,
    ResourceType, Result, TextureDesc,
};

/// Install a test logger once per binary.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Read a native-endian f32 at a byte offset.
pub fn float_at(bytes: &[u8], offset: usize) -> f32 {
    f32::from_ne_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read a native-endian u32 at a byte offset.
pub fn uint_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

// ============================================================================
// Custom methods
// ============================================================================

pub const FIRST: PassId = PassId::new(0);
pub const SECOND: PassId = PassId::new(1);

/// Two passes sharing one permanent and one transient texture.
///
/// The first pass declares 64 bytes of constants, the second 96. `extra_words`
/// makes the second pass pack more (or, if negative, fewer) words than it
/// declares.
#[derive(Debug, Default)]
pub struct TwoPassMethod {
    pub extra_words: i32,
}

impl DenoiseMethod for TwoPassMethod {
    fn name(&self) -> &str {
        "Two pass"
    }

    fn build(&self, b: &mut MethodBuilder<'_>) -> Result<()> {
        let (w, h) = (b.width(), b.height());
        let history = b.declare_permanent(TextureDesc::new(Format::Rg32Uint, w, h))?;
        let scratch = b.declare_transient(TextureDesc::new(Format::Rgba16Sfloat, w, h))?;

        b.begin_pass(FIRST, "Two pass - first", "TwoPass_First.cs")?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(history)?;
        b.add_output(scratch)?;
        b.set_constant_size(64)?;
        b.end_pass()?;

        b.begin_pass(SECOND, "Two pass - second", "TwoPass_Second.cs")?;
        b.add_input(scratch)?;
        b.add_output(history)?;
        b.add_output(ResourceType::OutRadiance)?;
        b.set_constant_size(96)?;
        b.end_pass()?;
        Ok(())
    }

    fn pack_constants(
        &self,
        pass: PassId,
        _ctx: &PackContext<'_>,
        out: &mut ConstantWriter<'_>,
    ) -> Result<()> {
        match pass {
            FIRST => out.add_float4(Vec4::new(1.0, 2.0, 3.0, 4.0)),
            SECOND => {
                let words = 12 + self.extra_words;
                for i in 0..words.max(0) {
                    out.add_uint(i as u32 + 1);
                }
            }
            other => {
                return Err(DenoiserError::Failure(format!(
                    "unknown pass {}",
                    other.get()
                )));
            }
        }
        Ok(())
    }
}

/// Declares a one-mip transient and binds its mips `[2, 3)`.
#[derive(Debug, Default)]
pub struct BadMipMethod;

impl DenoiseMethod for BadMipMethod {
    fn name(&self) -> &str {
        "Bad mip"
    }

    fn build(&self, b: &mut MethodBuilder<'_>) -> Result<()> {
        let (w, h) = (b.width(), b.height());
        let scratch = b.declare_transient(TextureDesc::new(Format::Rgba8Unorm, w, h))?;

        b.begin_pass(FIRST, "Bad mip - only", "BadMip.cs")?;
        b.add_input(redlilium_denoiser::ResourceView::from(scratch).mips(2, 1))?;
        b.add_output(ResourceType::OutRadiance)?;
        b.end_pass()?;
        Ok(())
    }

    fn pack_constants(
        &self,
        _pass: PassId,
        _ctx: &PackContext<'_>,
        _out: &mut ConstantWriter<'_>,
    ) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Allocators
// ============================================================================

/// System allocator that counts live blocks and bytes.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    pub allocations: AtomicUsize,
    pub frees: AtomicUsize,
    pub live_bytes: AtomicUsize,
}

impl MemoryAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_add(layout.size(), Ordering::SeqCst);
        NonNull::new(unsafe { System.alloc(layout) })
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        self.live_bytes.fetch_sub(layout.size(), Ordering::SeqCst);
        self.live_bytes.fetch_add(new_size, Ordering::SeqCst);
        NonNull::new(unsafe { System.realloc(ptr.as_ptr(), layout, new_size) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_sub(layout.size(), Ordering::SeqCst);
        unsafe { System.dealloc(ptr.as_ptr(), layout) }
    }
}

/// Allocator that always reports exhaustion.
#[derive(Debug, Default)]
pub struct ExhaustedAllocator;

impl MemoryAllocator for ExhaustedAllocator {
    fn allocate(&self, _layout: Layout) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn reallocate(
        &self,
        _ptr: NonNull<u8>,
        _layout: Layout,
        _new_size: usize,
    ) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn free(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

/// System allocator that refuses to grow a block.
#[derive(Debug, Default)]
pub struct NoGrowAllocator;

impl MemoryAllocator for NoGrowAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        NonNull::new(unsafe { System.alloc(layout) })
    }

    unsafe fn reallocate(
        &self,
        _ptr: NonNull<u8>,
        _layout: Layout,
        _new_size: usize,
    ) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { System.dealloc(ptr.as_ptr(), layout) }
    }
}
