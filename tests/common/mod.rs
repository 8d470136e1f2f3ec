//! Shared test doubles: a manually refcounted test buffer and a counting
//! leak reporter.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use leaktrace::{ByteOrder, LeakReporter, RcBuf, RcCompositeBuf, ResourceId};

/// Shared allocation behind a family of test buffer views.
pub struct TestStorage {
    refs: AtomicU32,
}

/// Minimal reference-counted buffer over a shared storage.
///
/// All views produced from one buffer share the storage and its refcount,
/// matching the collaborator contract the decorators rely on.
pub struct TestBuf {
    storage: Arc<TestStorage>,
    order: ByteOrder,
    read_only: bool,
    reader: usize,
    len: usize,
}

impl TestBuf {
    pub fn new(len: usize) -> Self {
        Self {
            storage: Arc::new(TestStorage {
                refs: AtomicU32::new(1),
            }),
            order: ByteOrder::BigEndian,
            read_only: false,
            reader: 0,
            len,
        }
    }

    pub fn boxed(len: usize) -> Box<dyn RcBuf> {
        Box::new(Self::new(len))
    }

    fn view(&self, reader: usize, len: usize) -> TestBuf {
        TestBuf {
            storage: Arc::clone(&self.storage),
            order: self.order,
            read_only: self.read_only,
            reader,
            len,
        }
    }
}

impl RcBuf for TestBuf {
    fn storage_id(&self) -> ResourceId {
        ResourceId::from_ptr(Arc::as_ptr(&self.storage))
    }

    fn capacity(&self) -> usize {
        self.len
    }

    fn readable_bytes(&self) -> usize {
        self.len - self.reader
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn byte_order(&self) -> ByteOrder {
        self.order
    }

    fn ref_count(&self) -> u32 {
        self.storage.refs.load(Ordering::SeqCst)
    }

    fn retain(&self) {
        self.storage.refs.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) -> bool {
        self.release_n(1)
    }

    fn release_n(&self, decrement: u32) -> bool {
        let prev = self.storage.refs.fetch_sub(decrement, Ordering::SeqCst);
        assert!(prev >= decrement, "refcount underflow");
        prev == decrement
    }

    fn slice(&self) -> Box<dyn RcBuf> {
        Box::new(self.view(0, self.readable_bytes()))
    }

    fn slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf> {
        assert!(index + length <= self.len);
        Box::new(self.view(0, length))
    }

    fn retained_slice(&self) -> Box<dyn RcBuf> {
        self.retain();
        self.slice()
    }

    fn retained_slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf> {
        self.retain();
        self.slice_at(index, length)
    }

    fn duplicate(&self) -> Box<dyn RcBuf> {
        Box::new(self.view(self.reader, self.len))
    }

    fn retained_duplicate(&self) -> Box<dyn RcBuf> {
        self.retain();
        self.duplicate()
    }

    fn read_slice(&mut self, length: usize) -> Box<dyn RcBuf> {
        assert!(length <= self.readable_bytes());
        let view = self.view(0, length);
        self.reader += length;
        Box::new(view)
    }

    fn read_retained_slice(&mut self, length: usize) -> Box<dyn RcBuf> {
        self.retain();
        self.read_slice(length)
    }

    fn as_read_only(&self) -> Box<dyn RcBuf> {
        let mut view = self.view(self.reader, self.len);
        view.read_only = true;
        Box::new(view)
    }

    fn ordered(self: Box<Self>, order: ByteOrder) -> Box<dyn RcBuf> {
        if order == self.order {
            return self;
        }
        let mut view = self.view(self.reader, self.len);
        view.order = order;
        Box::new(view)
    }
}

/// Aggregate test buffer: one shared storage, several logical components.
pub struct TestCompositeBuf {
    inner: TestBuf,
    components: usize,
}

impl TestCompositeBuf {
    pub fn new(components: usize, component_len: usize) -> Self {
        Self {
            inner: TestBuf::new(components * component_len),
            components,
        }
    }

    pub fn boxed(components: usize, component_len: usize) -> Box<dyn RcCompositeBuf> {
        Box::new(Self::new(components, component_len))
    }
}

impl RcBuf for TestCompositeBuf {
    fn storage_id(&self) -> ResourceId {
        self.inner.storage_id()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn readable_bytes(&self) -> usize {
        self.inner.readable_bytes()
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    fn byte_order(&self) -> ByteOrder {
        self.inner.byte_order()
    }

    fn ref_count(&self) -> u32 {
        self.inner.ref_count()
    }

    fn retain(&self) {
        self.inner.retain();
    }

    fn release(&self) -> bool {
        self.inner.release()
    }

    fn release_n(&self, decrement: u32) -> bool {
        self.inner.release_n(decrement)
    }

    fn slice(&self) -> Box<dyn RcBuf> {
        self.inner.slice()
    }

    fn slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf> {
        self.inner.slice_at(index, length)
    }

    fn retained_slice(&self) -> Box<dyn RcBuf> {
        self.inner.retained_slice()
    }

    fn retained_slice_at(&self, index: usize, length: usize) -> Box<dyn RcBuf> {
        self.inner.retained_slice_at(index, length)
    }

    fn duplicate(&self) -> Box<dyn RcBuf> {
        self.inner.duplicate()
    }

    fn retained_duplicate(&self) -> Box<dyn RcBuf> {
        self.inner.retained_duplicate()
    }

    fn read_slice(&mut self, length: usize) -> Box<dyn RcBuf> {
        self.inner.read_slice(length)
    }

    fn read_retained_slice(&mut self, length: usize) -> Box<dyn RcBuf> {
        self.inner.read_retained_slice(length)
    }

    fn as_read_only(&self) -> Box<dyn RcBuf> {
        self.inner.as_read_only()
    }

    fn ordered(self: Box<Self>, order: ByteOrder) -> Box<dyn RcBuf> {
        Box::new(self.inner).ordered(order)
    }
}

impl RcCompositeBuf for TestCompositeBuf {
    fn component_count(&self) -> usize {
        self.components
    }
}

/// Reporter that counts report kinds and remembers the last traced records.
#[derive(Default)]
pub struct CountingReporter {
    pub traced: AtomicUsize,
    pub untraced: AtomicUsize,
    pub instances: AtomicUsize,
    pub last_records: Mutex<Option<String>>,
}

impl CountingReporter {
    pub fn traced(&self) -> usize {
        self.traced.load(Ordering::SeqCst)
    }

    pub fn untraced(&self) -> usize {
        self.untraced.load(Ordering::SeqCst)
    }

    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::SeqCst)
    }

    pub fn total_leaks(&self) -> usize {
        self.traced() + self.untraced() + self.instances()
    }

    pub fn last_records(&self) -> Option<String> {
        self.last_records.lock().unwrap().clone()
    }
}

impl LeakReporter for CountingReporter {
    fn report_traced_leak(&self, _resource_type: &str, records: &str) {
        self.traced.fetch_add(1, Ordering::SeqCst);
        *self.last_records.lock().unwrap() = Some(records.to_string());
    }

    fn report_untraced_leak(&self, _resource_type: &str) {
        self.untraced.fetch_add(1, Ordering::SeqCst);
    }

    fn report_instances_leak(&self, _resource_type: &str) {
        self.instances.fetch_add(1, Ordering::SeqCst);
    }
}
