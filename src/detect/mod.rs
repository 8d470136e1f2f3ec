//! Leak detection core: record chains, handles, and the sampling detector.

mod detector;
mod handle;
mod record;
mod report;

pub use detector::LeakDetector;
pub use handle::{LeakHandle, ResourceId};
pub use record::{RecordChain, DEFAULT_TARGET_RECORDS};
pub use report::{LeakReporter, TracingReporter};
