//! Leak-aware decorator over a composite (aggregate) buffer.
//!
//! Same interception rules as the single-view decorator; views produced from
//! a composite are plain views and come back wrapped in [`LeakAwareBuf`],
//! still sharing this family's handle.

use crate::detect::{LeakDetector, LeakHandle};

use super::leak_aware::LeakAwareBuf;
use super::traits::{ByteOrder, RcBuf, RcCompositeBuf};

/// Observe a composite allocation and wrap it when the detector samples it.
pub fn track_composite(
    detector: &LeakDetector,
    buf: Box<dyn RcCompositeBuf>,
) -> Box<dyn RcCompositeBuf> {
    match detector.open(buf.storage_id()) {
        Some(handle) => Box::new(LeakAwareCompositeBuf::new(buf, handle)),
        None => buf,
    }
}

/// Decorator pairing a composite buffer with its family's leak handle.
pub struct LeakAwareCompositeBuf {
    wrapped: Box<dyn RcCompositeBuf>,
    handle: LeakHandle,
}

impl LeakAwareCompositeBuf {
    /// Wrap `wrapped`, attaching it to `handle`'s tracking family.
    pub fn new(wrapped: Box<dyn RcCompositeBuf>, handle: LeakHandle) -> Self {
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

impl RcBuf for LeakAwareCompositeBuf {
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
        // Identity first: releasing to zero may recycle the storage.
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

impl RcCompositeBuf for LeakAwareCompositeBuf {
    fn component_count(&self) -> usize {
        self.wrapped.component_count()
    }
}
