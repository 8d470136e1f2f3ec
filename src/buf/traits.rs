//! Contract the reference-counted buffer collaborator must provide.
//!
//! The crate never implements refcount arithmetic, pooling, or byte storage;
//! it only forwards to these operations and intercepts the ones that affect
//! leak tracking (release, view production, byte-order changes).

use crate::detect::{LeakHandle, ResourceId};

/// Byte order of a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

/// A manually reference-counted buffer.
///
/// `release` returns `true` iff this call dropped the shared refcount to
/// zero; that is the moment leak tracking for the whole view family ends.
/// View producers return new views sharing the same underlying allocation
/// (and therefore the same [`storage_id`](Self::storage_id)).
pub trait RcBuf: Send + Sync {
    /// Stable identity of the underlying allocation, shared by all views.
    ///
    /// Only valid while the allocation is live: once the refcount reaches
    /// zero the storage may be recycled, so callers capture the id before a
    /// release that might free it.
    fn storage_id(&self) -> ResourceId;

    /// Capacity of this view in bytes.
    fn capacity(&self) -> usize;

    /// Bytes remaining between the reader index and the end of the view.
    fn readable_bytes(&self) -> usize;

    /// True if writes through this view are rejected.
    fn is_read_only(&self) -> bool;

    /// Byte order of this view.
    fn byte_order(&self) -> ByteOrder;

    /// Current shared reference count.
    fn ref_count(&self) -> u32;

    /// Increment the shared reference count.
    fn retain(&self);

    /// Decrement the shared reference count by one.
    ///
    /// Returns `true` iff the count reached zero and the allocation was
    /// freed by this call.
    fn release(&self) -> bool;

    /// Decrement the shared reference count by `decrement`.
    fn release_n(&self, decrement: u32) -> bool;

    /// View over the readable bytes. Does not retain.
    fn slice(&self) -> Box<dyn RcBuf>;

    /// View over `length` bytes starting at `index`. Does not retain.
    fn slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf>;

    /// Retained view over the readable bytes.
    fn retained_slice(&self) -> Box<dyn RcBuf>;

    /// Retained view over `length` bytes starting at `index`.
    fn retained_slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf>;

    /// View sharing content and indices. Does not retain.
    fn duplicate(&self) -> Box<dyn RcBuf>;

    /// Retained view sharing content and indices.
    fn retained_duplicate(&self) -> Box<dyn RcBuf>;

    /// View over the next `length` readable bytes, advancing the reader
    /// index. Does not retain.
    fn read_slice(&mut self, length: usize) -> Box<dyn RcBuf>;

    /// Retained view over the next `length` readable bytes, advancing the
    /// reader index.
    fn read_retained_slice(&mut self, length: usize) -> Box<dyn RcBuf>;

    /// Read-only view of this buffer.
    fn as_read_only(&self) -> Box<dyn RcBuf>;

    /// View with the requested byte order.
    ///
    /// Implementations return `self` unchanged when `order` already matches.
    fn ordered(self: Box<Self>, order: ByteOrder) -> Box<dyn RcBuf>;

    /// The leak handle tracking this buffer, if it is wrapped by a
    /// leak-aware decorator.
    fn leak_handle(&self) -> Option<&LeakHandle> {
        None
    }
}

/// An aggregate buffer composed of multiple component buffers.
pub trait RcCompositeBuf: RcBuf {
    /// Number of component buffers in the aggregate.
    fn component_count(&self) -> usize;
}
