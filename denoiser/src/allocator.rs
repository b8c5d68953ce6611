//! Host-pluggable memory allocation and the per-frame constant arena.
//!
//! The denoiser performs all of its per-frame constant packing inside one
//! arena obtained through a [`MemoryAllocator`]. Hosts that track memory can
//! supply their own allocator in the creation descriptor; everyone else gets
//! [`SystemAllocator`].

use std::alloc::{GlobalAlloc, Layout, System};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::{DenoiserError, Result};

/// Interface for host-provided memory allocation.
///
/// Sizes and alignments are passed explicitly through [`Layout`]. Returning
/// `None` signals exhaustion and makes the calling operation fail.
pub trait MemoryAllocator: Send + Sync {
    /// Allocate a block with the given layout. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Grow or shrink a block, preserving its first `min(old, new_size)` bytes.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator with `layout`, and must
    /// not be used after this call returns `Some`.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator with `layout`.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Allocator backed by the Rust system allocator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl MemoryAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: callers never request zero-sized blocks.
        NonNull::new(unsafe { System.alloc(layout) })
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        // SAFETY: upheld by the caller.
        NonNull::new(unsafe { System.realloc(ptr.as_ptr(), layout, new_size) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: upheld by the caller.
        unsafe { System.dealloc(ptr.as_ptr(), layout) }
    }
}

/// Align a byte offset up to the given power-of-two alignment.
pub fn align_up(offset: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (offset + alignment - 1) & !(alignment - 1)
}

/// A byte region inside a [`ConstantArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArenaRegion {
    /// Byte offset into the arena.
    pub offset: usize,
    /// Size of the region in bytes.
    pub size: usize,
}

impl ArenaRegion {
    /// Create a new region.
    pub fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// Get the end offset (offset + size).
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Zero-initialized byte storage for per-pass constant data.
///
/// Each pass owns a segregated [`ArenaRegion`]; writes through one region can
/// never reach another.
pub struct ConstantArena {
    allocator: Arc<dyn MemoryAllocator>,
    block: Option<(NonNull<u8>, Layout)>,
}

// SAFETY: the arena exclusively owns its block; shared access only hands out
// `&[u8]` and mutation requires `&mut self`.
unsafe impl Send for ConstantArena {}
// SAFETY: see above.
unsafe impl Sync for ConstantArena {}

impl ConstantArena {
    /// Alignment of the arena block and of every pass region.
    pub const ALIGNMENT: usize = 16;

    /// Create an empty arena that allocates through `allocator`.
    pub fn new(allocator: Arc<dyn MemoryAllocator>) -> Self {
        Self {
            allocator,
            block: None,
        }
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.block.map_or(0, |(_, layout)| layout.size())
    }

    /// Ensure the arena holds at least `size` bytes. Grows only.
    ///
    /// New bytes are zeroed.
    pub fn reserve(&mut self, size: usize) -> Result<()> {
        let size = align_up(size, Self::ALIGNMENT);
        let old_size = self.capacity();
        if size <= old_size {
            return Ok(());
        }

        let new_layout = Layout::from_size_align(size, Self::ALIGNMENT)
            .map_err(|e| DenoiserError::failure(format!("invalid arena layout: {e}")))?;

        let ptr = match self.block {
            // SAFETY: `ptr` was allocated by `self.allocator` with `layout`.
            Some((ptr, layout)) => unsafe { self.allocator.reallocate(ptr, layout, size) },
            None => self.allocator.allocate(new_layout),
        }
        .ok_or_else(|| {
            DenoiserError::failure(format!("failed to allocate {size} bytes of constant storage"))
        })?;

        // SAFETY: the block is `size` bytes long and the tail past `old_size`
        // is uninitialized.
        unsafe { ptr.as_ptr().add(old_size).write_bytes(0, size - old_size) };
        self.block = Some((ptr, new_layout));

        log::debug!("Constant arena grew from {old_size} to {size} bytes");
        Ok(())
    }

    /// Whole arena contents.
    pub fn bytes(&self) -> &[u8] {
        match self.block {
            // SAFETY: the block is initialized and `layout.size()` bytes long.
            Some((ptr, layout)) => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), layout.size())
            },
            None => &[],
        }
    }

    /// Whole arena contents, mutable.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match self.block {
            // SAFETY: as in `bytes`, with exclusive access through `&mut self`.
            Some((ptr, layout)) => unsafe {
                std::slice::from_raw_parts_mut(ptr.as_ptr(), layout.size())
            },
            None => &mut [],
        }
    }

    /// Bytes of one region, or `None` if it lies outside the arena.
    pub fn region(&self, region: ArenaRegion) -> Option<&[u8]> {
        self.bytes().get(region.offset..region.end())
    }

    /// Mutable bytes of one region, or `None` if it lies outside the arena.
    pub fn region_mut(&mut self, region: ArenaRegion) -> Option<&mut [u8]> {
        self.bytes_mut().get_mut(region.offset..region.end())
    }
}

impl Drop for ConstantArena {
    fn drop(&mut self) {
        if let Some((ptr, layout)) = self.block.take() {
            // SAFETY: `ptr` was allocated by `self.allocator` with `layout`.
            unsafe { self.allocator.free(ptr, layout) };
        }
    }
}

impl fmt::Debug for ConstantArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantArena")
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAllocator {
        allocations: AtomicUsize,
        reallocations: AtomicUsize,
        frees: AtomicUsize,
    }

    impl MemoryAllocator for CountingAllocator {
        fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
            self.allocations.fetch_add(1, Ordering::SeqCst);
            SystemAllocator.allocate(layout)
        }

        unsafe fn reallocate(
            &self,
            ptr: NonNull<u8>,
            layout: Layout,
            new_size: usize,
        ) -> Option<NonNull<u8>> {
            self.reallocations.fetch_add(1, Ordering::SeqCst);
            unsafe { SystemAllocator.reallocate(ptr, layout, new_size) }
        }

        unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
            self.frees.fetch_add(1, Ordering::SeqCst);
            unsafe { SystemAllocator.free(ptr, layout) }
        }
    }

    struct FailingAllocator;

    impl MemoryAllocator for FailingAllocator {
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

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(164, 16), 176);
    }

    #[test]
    fn test_region_end() {
        let region = ArenaRegion::new(32, 64);
        assert_eq!(region.end(), 96);
    }

    #[test]
    fn test_arena_grows_zeroed() {
        let mut arena = ConstantArena::new(Arc::new(SystemAllocator));
        assert_eq!(arena.capacity(), 0);
        assert!(arena.bytes().is_empty());

        arena.reserve(40).unwrap();
        assert_eq!(arena.capacity(), 48);
        assert!(arena.bytes().iter().all(|&b| b == 0));

        arena.bytes_mut()[0] = 7;
        arena.reserve(100).unwrap();
        assert_eq!(arena.capacity(), 112);
        assert_eq!(arena.bytes()[0], 7);
        assert!(arena.bytes()[48..].iter().all(|&b| b == 0));

        // Shrinking requests keep the current block.
        arena.reserve(16).unwrap();
        assert_eq!(arena.capacity(), 112);
    }

    #[test]
    fn test_arena_regions_are_bounded() {
        let mut arena = ConstantArena::new(Arc::new(SystemAllocator));
        arena.reserve(64).unwrap();

        arena
            .region_mut(ArenaRegion::new(16, 16))
            .unwrap()
            .fill(0xAB);
        assert!(arena.region(ArenaRegion::new(0, 16)).unwrap().iter().all(|&b| b == 0));
        assert!(arena.region(ArenaRegion::new(32, 32)).unwrap().iter().all(|&b| b == 0));
        assert!(arena.region(ArenaRegion::new(48, 32)).is_none());
    }

    #[test]
    fn test_arena_uses_custom_allocator() {
        let allocator = Arc::new(CountingAllocator::default());
        {
            let mut arena = ConstantArena::new(allocator.clone());
            arena.reserve(64).unwrap();
            arena.reserve(256).unwrap();
        }
        assert_eq!(allocator.allocations.load(Ordering::SeqCst), 1);
        assert_eq!(allocator.reallocations.load(Ordering::SeqCst), 1);
        assert_eq!(allocator.frees.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arena_allocation_failure() {
        let mut arena = ConstantArena::new(Arc::new(FailingAllocator));
        let err = arena.reserve(64).unwrap_err();
        assert!(matches!(err, DenoiserError::Failure(_)));
        assert_eq!(arena.capacity(), 0);
    }
}
