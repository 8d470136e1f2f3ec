//! Sampling leak detector.
//!
//! One detector instance tracks one resource type. It decides which
//! allocations to sample, keeps a registry of open handles, and reports the
//! handles whose resource family was dropped without an explicit close.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::handle::{HandleState, LeakHandle, ResourceId};
use super::record::RecordChain;
use super::report::LeakReporter;
use crate::config::{DetectionLevel, DetectorConfig};

/// A handle whose resource family became unreachable while still open.
pub(crate) struct PendingLeak {
    pub(crate) handle_id: u64,
    pub(crate) chain: Option<RecordChain>,
}

fn level_to_u8(level: DetectionLevel) -> u8 {
    match level {
        DetectionLevel::Disabled => 0,
        DetectionLevel::Simple => 1,
        DetectionLevel::Advanced => 2,
        DetectionLevel::Paranoid => 3,
    }
}

fn level_from_u8(raw: u8) -> DetectionLevel {
    match raw {
        0 => DetectionLevel::Disabled,
        1 => DetectionLevel::Simple,
        2 => DetectionLevel::Advanced,
        _ => DetectionLevel::Paranoid,
    }
}

/// State shared between a detector, its handles, and its pending queue.
pub(crate) struct DetectorShared {
    resource_type: String,
    config: DetectorConfig,
    /// Current detection level; may be lowered or raised at runtime.
    level: AtomicU8,
    reporter: Arc<dyn LeakReporter>,
    /// Currently-open handles, keyed by handle id. Values are weak so the
    /// registry never keeps a handle's family alive.
    registry: DashMap<u64, Weak<HandleState>>,
    /// Number of handles in the open state.
    active: AtomicUsize,
    /// Families dropped without close, awaiting the next drain.
    pending: Mutex<Vec<PendingLeak>>,
    next_id: AtomicU64,
    /// Rolling allocation counter driving deterministic sampling.
    allocations: AtomicUsize,
}

impl DetectorShared {
    /// Called from `HandleState::drop`; multi-producer, any thread.
    pub(crate) fn enqueue_leak(&self, leak: PendingLeak) {
        self.pending.lock().push(leak);
    }

    /// Remove a closed handle from the registry and the active count.
    pub(crate) fn deregister(&self, handle_id: u64) {
        self.registry.remove(&handle_id);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Per-resource-type leak detector.
///
/// Cheap to clone; clones share the registry. Construct one detector per
/// resource type (or per test, for isolation) and route every allocation of
/// that type through [`open`](Self::open).
#[derive(Clone)]
pub struct LeakDetector {
    shared: Arc<DetectorShared>,
}

impl LeakDetector {
    /// Create a detector for `resource_type` using the default
    /// tracing-backed reporter.
    pub fn new(resource_type: impl Into<String>, config: DetectorConfig) -> Self {
        Self::with_reporter(
            resource_type,
            config,
            Arc::new(super::report::TracingReporter),
        )
    }

    /// Create a detector with a custom report sink.
    ///
    /// The reporter is invoked synchronously from within [`open`](Self::open)
    /// and must not panic; reporting failures must never break the caller's
    /// allocation path.
    pub fn with_reporter(
        resource_type: impl Into<String>,
        config: DetectorConfig,
        reporter: Arc<dyn LeakReporter>,
    ) -> Self {
        let config = config.validated();
        Self {
            shared: Arc::new(DetectorShared {
                resource_type: resource_type.into(),
                level: AtomicU8::new(level_to_u8(config.level)),
                config,
                reporter,
                registry: DashMap::new(),
                active: AtomicUsize::new(0),
                pending: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                allocations: AtomicUsize::new(0),
            }),
        }
    }

    /// Name of the tracked resource type, as used in reports.
    pub fn resource_type(&self) -> &str {
        &self.shared.resource_type
    }

    /// Current detection level.
    pub fn level(&self) -> DetectionLevel {
        level_from_u8(self.shared.level.load(Ordering::Relaxed))
    }

    /// Change the detection level at runtime.
    ///
    /// Lowering to `Disabled` stops sampling new allocations but keeps
    /// checking handles opened at a higher level: draining runs on every
    /// [`open`](Self::open) regardless of level.
    pub fn set_level(&self, level: DetectionLevel) {
        self.shared.level.store(level_to_u8(level), Ordering::Relaxed);
    }

    /// Number of handles currently in the open state.
    pub fn active_handles(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Observe an allocation, possibly returning a tracking handle.
    ///
    /// Always drains and reports pending leaks first, even when detection is
    /// disabled, so previously-sampled handles keep being checked. Sampling
    /// is deterministic: `Paranoid` tracks every allocation, `Simple` and
    /// `Advanced` track one in `sampling_interval` via a rolling counter.
    pub fn open(&self, resource: ResourceId) -> Option<LeakHandle> {
        self.drain_pending();

        let shared = &self.shared;
        match self.level() {
            DetectionLevel::Disabled => None,
            DetectionLevel::Paranoid => Some(self.register(resource)),
            DetectionLevel::Simple | DetectionLevel::Advanced => {
                let n = shared.allocations.fetch_add(1, Ordering::Relaxed);
                if n % shared.config.sampling_interval == 0 {
                    Some(self.register(resource))
                } else {
                    None
                }
            }
        }
    }

    /// Close `handle` on behalf of `resource`.
    ///
    /// Identity-checked: returns `false` if `resource` is not the identity
    /// the handle was opened with, or if the handle was already closed.
    /// Exactly one caller ever observes `true` per handle.
    pub fn close(&self, handle: &LeakHandle, resource: ResourceId) -> bool {
        handle.close(resource)
    }

    fn register(&self, resource: ResourceId) -> LeakHandle {
        let shared = &self.shared;
        let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
        let records = self
            .level()
            .keeps_records()
            .then(|| Mutex::new(RecordChain::new(shared.config.target_records)));
        let state = Arc::new(HandleState {
            id,
            tracked: resource,
            closed: AtomicBool::new(false),
            records,
            shared: Arc::clone(shared),
        });
        shared.registry.insert(id, Arc::downgrade(&state));

        let active = shared.active.fetch_add(1, Ordering::SeqCst) + 1;
        if active > shared.config.max_active {
            // Count pressure, not a confirmed leak: warn but keep tracking.
            shared.reporter.report_instances_leak(&shared.resource_type);
        }

        let handle = LeakHandle::new(state);
        handle.record("create");
        debug!(
            resource_type = %shared.resource_type,
            handle_id = id,
            active,
            "opened leak handle"
        );
        handle
    }

    /// Report every family that was dropped without a close.
    ///
    /// Safe to run concurrently from multiple callers: each pending entry is
    /// taken out of the queue exactly once, and `HandleState::drop` enqueues
    /// each handle at most once.
    fn drain_pending(&self) {
        let shared = &self.shared;
        let drained = {
            let mut pending = shared.pending.lock();
            if pending.is_empty() {
                return;
            }
            std::mem::take(&mut *pending)
        };

        for leak in drained {
            shared.registry.remove(&leak.handle_id);
            shared.active.fetch_sub(1, Ordering::SeqCst);
            match leak.chain {
                Some(chain) if !chain.is_empty() => {
                    shared
                        .reporter
                        .report_traced_leak(&shared.resource_type, &chain.render());
                }
                _ => shared.reporter.report_untraced_leak(&shared.resource_type),
            }
        }
    }
}

impl std::fmt::Debug for LeakDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeakDetector")
            .field("resource_type", &self.shared.resource_type)
            .field("level", &self.level())
            .field("active", &self.active_handles())
            .finish()
    }
}
