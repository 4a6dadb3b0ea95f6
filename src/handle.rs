/// An indirect, nullable reference to a live block.
///
/// A handle never carries the block's address itself; it names
/// a descriptor slot inside the allocator, and the allocator is
/// free to rewrite that slot's offset when it relocates the
/// block. Resolving the handle after a compaction therefore
/// yields the new offset with no work on the caller's side, and
/// resolving it after a release yields `None` instead of a
/// dangling address.
///
/// The generation field guards against slot reuse: when a slot
/// is retired its generation is bumped, so a handle minted for
/// the old block no longer matches even if the slot later hosts
/// a new one. Generation 0 is reserved for the null handle,
/// which is what `Handle::default()` gives you.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Handle {
    /// The null handle. Resolves to `None`, always.
    pub const NULL: Handle = Handle { index: 0, generation: 0 };

    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    /// Whether this is the null handle. Note that a non-null
    /// handle may still be stale; only the allocator that
    /// minted it can tell, through `resolve`.
    pub fn is_null(&self) -> bool {
        self.generation == 0
    }
}
