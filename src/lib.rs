//! Leaktrace
//!
//! Sampling leak detection for manually reference-counted buffers. A
//! reference-counted buffer is freed by an explicit `release()`; if a caller
//! forgets, the memory is never reclaimed. This crate catches such mistakes
//! in development and staging without materially slowing production:
//!
//! - A [`LeakDetector`] statistically samples allocations and hands out
//!   [`LeakHandle`]s for the tracked ones.
//! - Leak-aware decorators ([`LeakAwareBuf`], [`LeakAwareCompositeBuf`])
//!   forward every buffer operation unchanged, tie refcount-zero releases to
//!   handle close, and propagate one shared handle across every view sliced
//!   or duplicated from the same allocation.
//! - A family dropped without a close is reported on the next allocation,
//!   with its recorded operation history when the level keeps one.
//!
//! The refcounting buffer itself is an external collaborator behind the
//! [`RcBuf`] trait; this crate observes lifetimes, it never controls them.
//!
//! # Example
//!
//! ```ignore
//! let detector = LeakDetector::new("PooledBuf", DetectorConfig::from_env());
//! // In the allocator, right after every allocation:
//! let buf = leaktrace::buf::track(&detector, allocate());
//! ```

pub mod buf;
pub mod config;
pub mod detect;
pub mod telemetry;

pub use buf::{track, track_composite, ByteOrder, LeakAwareBuf, LeakAwareCompositeBuf, RcBuf, RcCompositeBuf};
pub use config::{ConfigError, DetectionLevel, DetectorConfig, DEFAULT_SAMPLING_INTERVAL};
pub use detect::{
    LeakDetector, LeakHandle, LeakReporter, RecordChain, ResourceId, TracingReporter,
    DEFAULT_TARGET_RECORDS,
};
