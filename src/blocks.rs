use crate::handle::Handle;

/// One block descriptor. A slot is created when a block is
/// allocated and then lives for as long as the table does: on
/// release it is zeroed and flagged retired rather than
/// removed, so a stale handle still lands on valid storage and
/// can be recognized by its generation mismatch. Retired slots
/// go back into a pool and may host later allocations.
#[derive(Debug)]
pub(crate) struct Slot {
    pub offset: usize,
    pub size: usize,
    pub generation: u32,
    pub retired: bool,
}

/// The live-block registry and the retired pool, folded into a
/// single slot table. `live` holds the indices of the slots
/// that currently describe an allocation, kept sorted ascending
/// by offset; compaction and the adjacency checks both rely on
/// that order.
pub(crate) struct BlockTable {
    slots: Vec<Slot>,
    live: Vec<usize>,
    pool: Vec<usize>,
}

impl BlockTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: Vec::new(),
            pool: Vec::new(),
        }
    }

    /// Records a new live block and returns its handle. The
    /// slot comes from the retired pool when one is available,
    /// otherwise the table grows; either way the handle carries
    /// the slot's current generation, which no stale handle can
    /// share.
    pub fn insert(&mut self, offset: usize, size: usize) -> Handle {
        let index = match self.pool.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.offset = offset;
                slot.size = size;
                slot.retired = false;
                index
            }
            None => {
                // Fresh slots start at generation 1, leaving
                // generation 0 to the null handle.
                self.slots.push(Slot {
                    offset,
                    size,
                    generation: 1,
                    retired: false,
                });
                self.slots.len() - 1
            }
        };

        // Keep the live sequence sorted by offset. The
        // insertion point scan is O(log n) here; the original
        // design walked a singly linked list instead.
        let position = self
            .live
            .partition_point(|&i| self.slots[i].offset < offset);
        self.live.insert(position, index);

        Handle::new(index, self.slots[index].generation)
    }

    /// Resolves a handle to its slot, or `None` if the handle
    /// is null, stale, or out of range.
    pub fn get(&self, handle: Handle) -> Option<&Slot> {
        let slot = self.slots.get(handle.index as usize)?;
        (!slot.retired && slot.generation == handle.generation).then_some(slot)
    }

    /// Retires the block named by the handle, returning its
    /// former span. The slot is zeroed, its generation bumped,
    /// and its index moved from the live sequence to the pool.
    /// An invalid handle returns `None` and mutates nothing.
    pub fn retire(&mut self, handle: Handle) -> Option<(usize, usize)> {
        self.get(handle)?;

        let index = handle.index as usize;
        let slot = &mut self.slots[index];
        let span = (slot.offset, slot.size);

        slot.offset = 0;
        slot.size = 0;
        slot.retired = true;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation == 0 {
            // Generation 0 belongs to the null handle.
            slot.generation = 1;
        }

        let position = self
            .live
            .iter()
            .position(|&i| i == index)
            .expect("live slot missing from the live sequence");
        self.live.remove(position);
        self.pool.push(index);

        Some(span)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// The span of the i-th live block in offset order.
    pub fn live_span(&self, i: usize) -> (usize, usize) {
        let slot = &self.slots[self.live[i]];
        (slot.offset, slot.size)
    }

    /// Rewrites the offset of the i-th live block. Used by
    /// compaction, which only ever moves blocks towards lower
    /// offsets and never reorders them, so the live sequence
    /// stays sorted.
    pub fn relocate(&mut self, i: usize, offset: usize) {
        self.slots[self.live[i]].offset = offset;
    }

    /// Live spans in offset order.
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.live.iter().map(|&i| {
            let slot = &self.slots[i];
            (slot.offset, slot.size)
        })
    }

    pub fn retired_count(&self) -> usize {
        self.pool.len()
    }

    /// Total bytes across all live blocks.
    pub fn live_total(&self) -> usize {
        self.live.iter().map(|&i| self.slots[i].size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_sequence_stays_sorted_by_offset() {
        let mut blocks = BlockTable::new();
        blocks.insert(40, 10);
        blocks.insert(0, 10);
        blocks.insert(20, 10);

        let offsets: Vec<usize> = blocks.iter_live().map(|(offset, _)| offset).collect();
        assert_eq!(offsets, vec![0, 20, 40]);
    }

    #[test]
    fn retired_slots_are_zeroed_and_reject_old_handles() {
        let mut blocks = BlockTable::new();
        let handle = blocks.insert(16, 32);

        assert_eq!(blocks.retire(handle), Some((16, 32)));
        assert!(blocks.get(handle).is_none());
        assert_eq!(blocks.live_count(), 0);
        assert_eq!(blocks.retired_count(), 1);

        // Double retire is rejected without touching anything.
        assert_eq!(blocks.retire(handle), None);
    }

    #[test]
    fn reused_slot_does_not_revive_stale_handles() {
        let mut blocks = BlockTable::new();
        let old = blocks.insert(0, 8);
        blocks.retire(old);

        // The new block takes the pooled slot, but under a new
        // generation.
        let new = blocks.insert(0, 8);
        assert_eq!(old.index, new.index);
        assert!(blocks.get(old).is_none());
        assert_eq!(blocks.get(new).map(|slot| slot.size), Some(8));
    }

    #[test]
    fn null_handle_never_resolves() {
        let mut blocks = BlockTable::new();
        blocks.insert(0, 8);

        assert!(blocks.get(Handle::NULL).is_none());
        assert!(blocks.get(Handle::default()).is_none());
    }
}
