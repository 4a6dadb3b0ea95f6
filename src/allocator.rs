use crate::{
    blocks::BlockTable,
    error::AllocError,
    freelist::FreeList,
    handle::Handle,
};

use anyhow::{anyhow, Result};
use log::{debug, trace};
use std::fmt::Write;

/// A relocating heap allocator over a caller-supplied arena.
///
/// The allocator carves blocks out of a single fixed-size byte
/// region and hands out [`Handle`]s instead of addresses, which
/// is what allows it to *compact* the heap: a defragmentation
/// pass slides every live block to the front of the arena and
/// rewrites the descriptors in place, and every outstanding
/// handle observes the new offset on its next resolution. The
/// caller never has to be notified of a move.
///
/// Free space is tracked as a set of disjoint regions and
/// served best-fit. Releasing a block merges it with a free
/// region that immediately *follows* it, but not with one that
/// precedes it, so adjacent free regions can accumulate; the
/// compaction pass is the way to fold them all back into one.
///
/// The allocator is single-threaded and non-reentrant. It
/// borrows the arena for its whole lifetime and never frees or
/// resizes it.
pub struct Allocator<'a> {
    arena: &'a mut [u8],
    free: FreeList,
    blocks: BlockTable,
}

impl<'a> Allocator<'a> {
    /// Creates an allocator managing `arena`, treating the
    /// whole region as initially free. The contents of the
    /// slice are taken as-is; nothing is zeroed.
    pub fn new(arena: &'a mut [u8]) -> Self {
        let mut free = FreeList::new();
        if !arena.is_empty() {
            free.insert(0, arena.len());
        }

        debug!("sycorax heap over {} bytes", arena.len());

        Self {
            arena,
            free,
            blocks: BlockTable::new(),
        }
    }

    /// Allocates `size` bytes and returns a handle to the new
    /// block. The smallest free region that fits is chosen;
    /// if it is larger than the request, the remainder stays
    /// free. Fails with [`AllocError::NoMemory`] when no single
    /// region is large enough (or when `size` is zero), in
    /// which case the allocator is left exactly as it was.
    pub fn allocate(&mut self, size: usize) -> Result<Handle> {
        if size == 0 {
            return Err(anyhow!(AllocError::NoMemory));
        }

        // The search is read-only: nothing is touched until a
        // fitting region has been found.
        let (offset, region_size) = self
            .free
            .find_fit(size)
            .ok_or(anyhow!(AllocError::NoMemory))?;

        // Carve the block off the front of the region and give
        // the rest back to the free registry.
        self.free.remove(offset);
        if region_size > size {
            self.free.insert(offset + size, region_size - size);
        }

        let handle = self.blocks.insert(offset, size);
        trace!("alloc {} bytes at {}", size, offset);

        Ok(handle)
    }

    /// Releases the block named by `handle`. The freed span is
    /// merged with a free region starting at its very next byte
    /// when there is one (forward coalescing only; a free
    /// region immediately *before* the block is left separate).
    /// The descriptor is retired, so the handle resolves to
    /// `None` from now on.
    ///
    /// Fails with [`AllocError::InvalidFree`] if the handle is
    /// null, already released, or not from this allocator; the
    /// state is unchanged in that case.
    pub fn release(&mut self, handle: Handle) -> Result<()> {
        let (offset, size) = self
            .blocks
            .retire(handle)
            .ok_or(anyhow!(AllocError::InvalidFree))?;

        // Absorb the free region that starts right after the
        // block, if any.
        match self.free.take_at(offset + size) {
            Some(following) => self.free.insert(offset, size + following),
            None => self.free.insert(offset, size),
        }

        trace!("free {} bytes at {}", size, offset);

        Ok(())
    }

    /// Resizes the allocation behind `handle` by releasing it
    /// and allocating a fresh block of `new_size` bytes, then
    /// rebinding the handle in place.
    ///
    /// The old payload is NOT copied over: contents are lost
    /// across this call. Fails with [`AllocError::InvalidFree`]
    /// if the handle is invalid (nothing is changed then), or
    /// with [`AllocError::NoMemory`] if the new allocation
    /// cannot be satisfied; in the latter case the old block
    /// has already been released and the handle is left stale.
    pub fn reallocate(&mut self, handle: &mut Handle, new_size: usize) -> Result<()> {
        self.release(*handle)?;
        *handle = self.allocate(new_size)?;

        Ok(())
    }

    /// Compacts the heap: slides every live block towards the
    /// front of the arena, in their existing offset order, so
    /// that all free space ends up as one trailing region (or
    /// none, if the arena is full). Every outstanding handle
    /// transparently resolves to its block's new offset
    /// afterwards. Runs in O(live bytes + live block count).
    pub fn compact(&mut self) {
        let mut cursor = 0;
        for i in 0..self.blocks.live_count() {
            let (offset, size) = self.blocks.live_span(i);

            // The destination never exceeds the source on a
            // forward slide, and the spans may overlap, which
            // copy_within handles.
            if offset != cursor {
                self.arena.copy_within(offset..offset + size, cursor);
                self.blocks.relocate(i, cursor);
            }

            cursor += size;
        }

        // Whatever fragmentation the free registry had
        // accumulated, it is all behind the cursor now.
        self.free.clear();
        if cursor < self.arena.len() {
            self.free.insert(cursor, self.arena.len() - cursor);
        }

        debug!(
            "compacted: {} live bytes, {} free",
            cursor,
            self.arena.len() - cursor
        );
    }

    /// Resolves a handle to its block's current offset within
    /// the arena, or `None` for a null or released handle.
    /// This is the only mechanism by which relocation and
    /// invalidation become visible to callers; offsets must
    /// not be cached across `compact` or `reallocate`.
    pub fn resolve(&self, handle: Handle) -> Option<usize> {
        self.blocks.get(handle).map(|slot| slot.offset)
    }

    /// The payload bytes of the block named by `handle`, or
    /// `None` for an invalid handle.
    pub fn block(&self, handle: Handle) -> Option<&[u8]> {
        let slot = self.blocks.get(handle)?;
        Some(&self.arena[slot.offset..slot.offset + slot.size])
    }

    /// Mutable payload access. The borrow ends before the next
    /// allocator call, so payload writes can never overlap a
    /// compaction.
    pub fn block_mut(&mut self, handle: Handle) -> Option<&mut [u8]> {
        let slot = self.blocks.get(handle)?;
        Some(&mut self.arena[slot.offset..slot.offset + slot.size])
    }

    /// Total size of the arena, in bytes.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Bytes currently sitting in free regions.
    pub fn free_bytes(&self) -> usize {
        self.free.total()
    }

    /// Bytes currently held by live blocks.
    pub fn live_bytes(&self) -> usize {
        self.blocks.live_total()
    }

    /// Number of distinct free regions.
    pub fn free_regions(&self) -> usize {
        self.free.len()
    }

    /// A human-readable snapshot of the allocator state: free
    /// regions, live blocks, and the retired descriptor count.
    /// Meant for debugging and tests; the format is not a
    /// compatibility surface.
    pub fn dump(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "heap: {} bytes, {} live ({} bytes), {} free regions ({} bytes), {} retired",
            self.arena.len(),
            self.blocks.live_count(),
            self.live_bytes(),
            self.free.len(),
            self.free.total(),
            self.blocks.retired_count(),
        );

        for (offset, size) in self.blocks.iter_live() {
            let _ = writeln!(out, "  live [{}..{}) {} bytes", offset, offset + size, size);
        }

        for (offset, size) in self.free.iter() {
            let _ = writeln!(out, "  free [{}..{}) {} bytes", offset, offset + size, size);
        }

        out
    }
}
