//! Leak-aware decorator over a single buffer view.
//!
//! Forwards every operation to the wrapped buffer unchanged except release
//! (ties a refcount-zero release to handle close) and view production (new
//! views share this decorator's handle, so a whole view family is one leak
//! tracking unit and is reported at most once).

use crate::detect::{LeakDetector, LeakHandle};

use super::traits::{ByteOrder, RcBuf};

/// Observe an allocation and wrap `buf` when the detector samples it.
///
/// Allocator-side entry point: call this once on every freshly allocated
/// buffer. Unsampled buffers are returned unchanged and stay invisible to
/// the detector.
pub fn track(detector: &LeakDetector, buf: Box<dyn RcBuf>) -> Box<dyn RcBuf> {
    match detector.open(buf.storage_id()) {
        Some(handle) => Box::new(LeakAwareBuf::new(buf, handle)),
        None => buf,
    }
}

/// Decorator pairing a buffer view with its family's leak handle.
pub struct LeakAwareBuf {
    wrapped: Box<dyn RcBuf>,
    handle: LeakHandle,
}

impl LeakAwareBuf {
    /// Wrap `wrapped`, attaching it to `handle`'s tracking family.
    pub fn new(wrapped: Box<dyn RcBuf>, handle: LeakHandle) -> Self {
        Self { wrapped, handle }
    }

    /// The handle shared by every view in this family.
    pub fn handle(&self) -> &LeakHandle {
        &self.handle
    }

    fn wrap_view(&self, site: &str, view: Box<dyn RcBuf>) -> Box<dyn RcBuf> {
        self.handle.record(site);
        Box::new(LeakAwareBuf::new(view, self.handle.clone()))
    }
}

impl RcBuf for LeakAwareBuf {
    fn storage_id(&self) -> crate::detect::ResourceId {
        self.wrapped.storage_id()
    }

    fn capacity(&self) -> usize {
        self.wrapped.capacity()
    }

    fn readable_bytes(&self) -> usize {
        self.wrapped.readable_bytes()
    }

    fn is_read_only(&self) -> bool {
        self.wrapped.is_read_only()
    }

    fn byte_order(&self) -> ByteOrder {
        self.wrapped.byte_order()
    }

    fn ref_count(&self) -> u32 {
        self.wrapped.ref_count()
    }

    fn retain(&self) {
        self.wrapped.retain();
    }

    fn release(&self) -> bool {
        // Capture the identity first: a release that frees the storage may
        // recycle it, and close() must compare against what open() saw.
        let tracked = self.wrapped.storage_id();
        if self.wrapped.release() {
            let closed = self.handle.close(tracked);
            assert!(
                closed,
                "leak handle already closed: tracking desynchronized from refcount"
            );
            return true;
        }
        false
    }

    fn release_n(&self, decrement: u32) -> bool {
        let tracked = self.wrapped.storage_id();
        if self.wrapped.release_n(decrement) {
            let closed = self.handle.close(tracked);
            assert!(
                closed,
                "leak handle already closed: tracking desynchronized from refcount"
            );
            return true;
        }
        false
    }

    fn slice(&self) -> Box<dyn RcBuf> {
        self.wrap_view("slice", self.wrapped.slice())
    }

    fn slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf> {
        self.wrap_view("slice", self.wrapped.slice_at(index, length))
    }

    fn retained_slice(&self) -> Box<dyn RcBuf> {
        self.wrap_view("retained_slice", self.wrapped.retained_slice())
    }

    fn retained_slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf> {
        self.wrap_view("retained_slice", self.wrapped.retained_slice_at(index, length))
    }

    fn duplicate(&self) -> Box<dyn RcBuf> {
        self.wrap_view("duplicate", self.wrapped.duplicate())
    }

    fn retained_duplicate(&self) -> Box<dyn RcBuf> {
        self.wrap_view("retained_duplicate", self.wrapped.retained_duplicate())
    }

    fn read_slice(&mut self, length: usize) -> Box<dyn RcBuf> {
        let view = self.wrapped.read_slice(length);
        self.wrap_view("read_slice", view)
    }

    fn read_retained_slice(&mut self, length: usize) -> Box<dyn RcBuf> {
        let view = self.wrapped.read_retained_slice(length);
        self.wrap_view("read_retained_slice", view)
    }

    fn as_read_only(&self) -> Box<dyn RcBuf> {
        self.wrap_view("as_read_only", self.wrapped.as_read_only())
    }

    fn ordered(self: Box<Self>, order: ByteOrder) -> Box<dyn RcBuf> {
        // Same order: identical wrapper, no new handle, no record entry.
        if order == self.wrapped.byte_order() {
            return self;
        }
        let Self { wrapped, handle } = *self;
        handle.record("order");
        Box::new(LeakAwareBuf::new(wrapped.ordered(order), handle))
    }

    fn leak_handle(&self) -> Option<&LeakHandle> {
        Some(&self.handle)
    }
}
