//! sycorax: a relocating heap allocator for a caller-supplied
//! arena. Blocks are addressed through handles rather than raw
//! offsets, so the heap can be compacted at any time without
//! invalidating anything the caller holds.

mod allocator;
mod blocks;
mod error;
mod freelist;
mod handle;

pub use allocator::Allocator;
pub use error::AllocError;
pub use handle::Handle;
