//! Leak report sinks.
//!
//! Reports are pure observations: they are invoked synchronously from the
//! detector's drain step and must never feed failures back into the caller's
//! allocation path. Implementations must not panic.

use tracing::{error, warn};

/// Destination for leak reports.
///
/// Three severities: traced and untraced leaks are confirmed abandoned
/// resources (error), instances pressure is a heuristic signal that the
/// active-handle bound was exceeded (warning).
pub trait LeakReporter: Send + Sync {
    /// A sampled resource was dropped without close and has operation
    /// history. `records` is the rendered chain, most recent first.
    fn report_traced_leak(&self, resource_type: &str, records: &str);

    /// A sampled resource was dropped without close but no history is
    /// available (level too low, or nothing was recorded).
    fn report_untraced_leak(&self, resource_type: &str);

    /// The number of open handles exceeded the configured bound. Not a
    /// confirmed leak; may recur while pressure persists.
    fn report_instances_leak(&self, resource_type: &str);
}

/// Default reporter that emits structured log events through `tracing`.
pub struct TracingReporter;

impl LeakReporter for TracingReporter {
    fn report_traced_leak(&self, resource_type: &str, records: &str) {
        error!(
            resource_type,
            "LEAK: {resource_type} was dropped before its refcount reached zero. \
             Recent operations (most recent first):\n{records}"
        );
    }

    fn report_untraced_leak(&self, resource_type: &str) {
        error!(
            resource_type,
            "LEAK: {resource_type} was dropped before its refcount reached zero. \
             Enable advanced leak detection to record operation history."
        );
    }

    fn report_instances_leak(&self, resource_type: &str) {
        warn!(
            resource_type,
            "LEAK: too many open {resource_type} tracking handles; \
             releases may not be keeping up with allocations"
        );
    }
}
