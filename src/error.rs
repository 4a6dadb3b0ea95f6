use thiserror::Error;

/// The error taxonomy of the allocator. Errors are surfaced
/// through `anyhow`, so callers that care about the kind can
/// recover it with `err.downcast_ref::<AllocError>()`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// No single free region is large enough to satisfy the
    /// request. The allocator state is left exactly as it was
    /// before the failed call.
    #[error("no free region large enough for the request")]
    NoMemory,

    /// The handle does not name a live block of this
    /// allocator: it is the null handle, it was already
    /// released, or it came from somewhere else entirely.
    #[error("handle does not name a live block")]
    InvalidFree,
}
