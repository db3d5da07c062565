//! Logger metrics for observability
//!
//! Counters for how events left the pipeline: suppressed by the level gate,
//! rejected by a filter, or dispatched to sinks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// Shared by a logger and every logger derived from it.
///
/// # Example
///
/// ```
/// use rust_structured_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_suppressed();
/// metrics.record_emitted();
///
/// assert_eq!(metrics.suppressed_count(), 1);
/// assert_eq!(metrics.emitted_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Events below the logger's minimum level
    suppressed_count: AtomicU64,

    /// Events rejected by a filter
    filtered_count: AtomicU64,

    /// Events dispatched to the sinks
    emitted_count: AtomicU64,

    /// Individual sink operations that failed or panicked
    sink_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            suppressed_count: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
            emitted_count: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn emitted_count(&self) -> u64 {
        self.emitted_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_suppressed(&self) -> u64 {
        self.suppressed_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failures(&self, count: u64) -> u64 {
        self.sink_failures.fetch_add(count, Ordering::Relaxed)
    }

    /// Share of calls that reached the sinks, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been logged.
    pub fn emit_rate(&self) -> f64 {
        let emitted = self.emitted_count() as f64;
        let total = emitted + self.suppressed_count() as f64 + self.filtered_count() as f64;
        if total == 0.0 {
            0.0
        } else {
            (emitted / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.suppressed_count.store(0, Ordering::Relaxed);
        self.filtered_count.store(0, Ordering::Relaxed);
        self.emitted_count.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            suppressed_count: AtomicU64::new(self.suppressed_count()),
            filtered_count: AtomicU64::new(self.filtered_count()),
            emitted_count: AtomicU64::new(self.emitted_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
        }
    }
}
