//! Detector configuration loading from environment variables.
//!
//! The crate consumes configuration, it does not own a config file format.
//! All values are read from `LEAKTRACE_*` environment variables with
//! sensible defaults; invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `LEAKTRACE_LEVEL` | simple | Detection level (disabled/simple/advanced/paranoid) |
//! | `LEAKTRACE_SAMPLING_INTERVAL` | 128 | Allocations per sampled allocation |
//! | `LEAKTRACE_MAX_ACTIVE` | unbounded | Open-handle count that triggers pressure reports |
//! | `LEAKTRACE_TARGET_RECORDS` | 4 | Records retained per handle before eliding |

use std::str::FromStr;

use thiserror::Error;

use crate::detect::DEFAULT_TARGET_RECORDS;

/// Default sampling interval: one tracked allocation in 128.
pub const DEFAULT_SAMPLING_INTERVAL: usize = 128;

/// Errors from parsing configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown detection level: {0:?}")]
    UnknownLevel(String),
}

/// How aggressively allocations are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DetectionLevel {
    /// No tracking. Draining of previously-sampled handles still runs.
    Disabled,
    /// Sample at the configured interval, report leaks without history.
    #[default]
    Simple,
    /// Sample at the configured interval, record operation history.
    Advanced,
    /// Track every allocation with full history. Development only.
    Paranoid,
}

impl DetectionLevel {
    /// True if any allocation can be sampled at this level.
    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }

    /// True if handles at this level keep an operation record chain.
    pub fn keeps_records(self) -> bool {
        matches!(self, Self::Advanced | Self::Paranoid)
    }
}

impl FromStr for DetectionLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "simple" => Ok(Self::Simple),
            "advanced" => Ok(Self::Advanced),
            "paranoid" => Ok(Self::Paranoid),
            _ => Err(ConfigError::UnknownLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for DetectionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::Simple => "simple",
            Self::Advanced => "advanced",
            Self::Paranoid => "paranoid",
        };
        f.write_str(name)
    }
}

/// Configuration for one [`LeakDetector`](crate::detect::LeakDetector).
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Detection level.
    pub level: DetectionLevel,
    /// One allocation in `sampling_interval` is tracked (ignored by
    /// `Paranoid`, which tracks everything).
    pub sampling_interval: usize,
    /// Open-handle count above which instances-pressure reports are emitted.
    pub max_active: usize,
    /// Records retained per handle before further appends are elided.
    pub target_records: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            level: DetectionLevel::default(),
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            max_active: usize::MAX,
            target_records: DEFAULT_TARGET_RECORDS,
        }
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a detection level env var, returning `default` on missing or invalid.
fn parse_level(key: &str, default: DetectionLevel) -> DetectionLevel {
    match std::env::var(key) {
        Ok(val) => val.parse::<DetectionLevel>().unwrap_or(default),
        Err(_) => default,
    }
}

impl DetectorConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing or invalid values fall back to defaults without panicking.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let level = parse_level("LEAKTRACE_LEVEL", defaults.level);
        let sampling_interval =
            parse_usize("LEAKTRACE_SAMPLING_INTERVAL", defaults.sampling_interval);
        let max_active = parse_usize("LEAKTRACE_MAX_ACTIVE", defaults.max_active);
        let target_records = parse_usize("LEAKTRACE_TARGET_RECORDS", defaults.target_records);
        Self {
            level,
            sampling_interval,
            max_active,
            target_records,
        }
        .validated()
    }

    /// Clamp values to their floors (interval and bound must be positive).
    pub(crate) fn validated(mut self) -> Self {
        self.sampling_interval = self.sampling_interval.max(1);
        self.max_active = self.max_active.max(1);
        self
    }
}
