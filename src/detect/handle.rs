//! Per-resource leak tracking handle.
//!
//! A handle is created by [`LeakDetector::open`](super::LeakDetector::open)
//! and shared by every decorator in one resource family. It transitions
//! open -> closed exactly once; a family whose handle state is dropped while
//! still open is enqueued for leak reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::detector::{DetectorShared, PendingLeak};
use super::record::RecordChain;

/// Stable, non-owning identity of a tracked resource.
///
/// Derived from the address of the resource's underlying allocation, so all
/// views of one allocation share the same identity. The identity is only
/// valid while the allocation is live; callers capture it *before* a release
/// that may recycle the storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

impl ResourceId {
    /// Build an identity from a raw address.
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Build an identity from a pointer to the underlying allocation.
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<u8>() as usize)
    }
}

pub(crate) struct HandleState {
    pub(crate) id: u64,
    pub(crate) tracked: ResourceId,
    pub(crate) closed: AtomicBool,
    /// Present only when the detection level keeps operation history.
    pub(crate) records: Option<Mutex<RecordChain>>,
    pub(crate) shared: Arc<DetectorShared>,
}

impl Drop for HandleState {
    fn drop(&mut self) {
        // The last decorator in the family is gone. If nobody closed the
        // handle, the resource was abandoned with a non-zero refcount:
        // enqueue it so the next open() reports it.
        if !self.closed.load(Ordering::Acquire) {
            let chain = self
                .records
                .as_mut()
                .map(|r| std::mem::take(&mut *r.get_mut()));
            self.shared.enqueue_leak(PendingLeak {
                handle_id: self.id,
                chain,
            });
        }
    }
}

/// Tracking record for one resource family.
///
/// Cloning is cheap and shares state; all views produced from one tracked
/// buffer carry clones of the same handle.
#[derive(Clone)]
pub struct LeakHandle {
    state: Arc<HandleState>,
}

impl LeakHandle {
    pub(crate) fn new(state: Arc<HandleState>) -> Self {
        Self { state }
    }

    /// Unique id of this handle within its detector.
    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// True if the handle shares state with `other`.
    pub fn ptr_eq(&self, other: &LeakHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// True once the open -> closed transition has happened.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Append a call-site description to the operation history.
    ///
    /// No-op when the handle is closed or when the detection level does not
    /// keep history. Safe under concurrent calls from decorators sharing the
    /// handle.
    pub fn record(&self, site: &str) {
        let Some(records) = &self.state.records else {
            return;
        };
        if self.is_closed() {
            return;
        }
        records.lock().append(site);
    }

    /// Render the current operation history, most recent first.
    ///
    /// `None` when the detection level does not keep history.
    pub fn render_records(&self) -> Option<String> {
        self.state.records.as_ref().map(|r| r.lock().render())
    }

    /// Close the handle for `resource`.
    ///
    /// Returns `true` only for the caller that performed the open -> closed
    /// transition. Every other call, including one with a mismatched
    /// identity, returns `false`; a mismatch means tracking has
    /// desynchronized from the real refcount and the caller is expected to
    /// surface that loudly.
    pub fn close(&self, resource: ResourceId) -> bool {
        if resource != self.state.tracked {
            return false;
        }
        if self
            .state
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.state.shared.deregister(self.state.id);
        true
    }
}

impl std::fmt::Debug for LeakHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeakHandle")
            .field("id", &self.state.id)
            .field("tracked", &self.state.tracked)
            .field("closed", &self.is_closed())
            .finish()
    }
}
