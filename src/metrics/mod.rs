//! Pluggable metrics recording, grounded on the teacher's `stats` module but
//! generalized behind a trait so callers can wire in a real backend instead
//! of the teacher's fixed in-process counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::PaginationMode;
use crate::error::RenderError;

/// Recording hook for pipeline events.
///
/// Implementations must be cheap to call from hot paths — expect calls on
/// every document render and every pool acquisition.
pub trait Metrics: Send + Sync {
    /// A document finished rendering successfully.
    fn incr_generated(&self) {}

    /// A document failed to render, dimensioned by the failure's stable
    /// metric tag (see [`RenderError::metric_tag`]).
    fn incr_failed(&self, _tag: &'static str) {}

    /// A pooled worker was recycled after failing validation.
    fn incr_pool_replacements(&self) {}

    /// Total wall-clock time spent rendering one document, start to commit
    /// (or to failure). `mode` is the pagination mode that was chosen, when
    /// one was — it's absent for documents that failed before a mode was
    /// selected.
    fn record_render_duration(&self, _duration: Duration, _mode: Option<PaginationMode>) {}

    /// Current pool in-use fraction, `0.0..=1.0`.
    fn update_pool_utilization(&self, _fraction: f64) {}

    /// Documents committed per second, measured over the caller's own window.
    fn update_throughput(&self, _documents_per_second: f64) {}

    /// Time spent waiting for a pool acquisition to succeed.
    fn record_pool_acquisition_time(&self, _duration: Duration) {}

    /// Time spent inside the rendering engine (load + render calls).
    fn record_webengine_time(&self, _duration: Duration) {}

    /// Time spent splicing injected CSS into a document.
    fn record_css_injection_time(&self, _duration: Duration) {}

    /// Time spent converting rendered bytes into the final committed file.
    fn record_data_conversion_time(&self, _duration: Duration) {}

    /// Convenience: record both the duration and the success counter for a
    /// document that rendered successfully, dimensioned by the pagination
    /// mode it was rendered with.
    fn record_success(&self, duration: Duration, mode: PaginationMode) {
        self.incr_generated();
        self.record_render_duration(duration, Some(mode));
    }

    /// Convenience: record both the duration and the failure counter for a
    /// document that did not render, attaching the error's stable metric tag
    /// as a dimension on the failure counter.
    fn record_failure(&self, duration: Duration, error: &RenderError) {
        self.incr_failed(error.metric_tag());
        self.record_render_duration(duration, None);
    }
}

/// A [`Metrics`] implementation that discards everything. The default when
/// no backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {}

/// An in-process [`Metrics`] implementation backed by atomics, useful for
/// tests and for exposing a quick summary without wiring a real collector.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    generated: AtomicU64,
    failed: AtomicU64,
    pool_replacements: AtomicU64,
    render_duration_micros_total: AtomicU64,
    pool_acquisition_micros_total: AtomicU64,
    webengine_micros_total: AtomicU64,
    css_injection_micros_total: AtomicU64,
    data_conversion_micros_total: AtomicU64,
    failed_by_tag: std::sync::Mutex<std::collections::HashMap<&'static str, u64>>,
}

impl RecordingMetrics {
    /// A fresh, all-zero recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total documents recorded as generated.
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Total documents recorded as failed.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Total worker replacements recorded.
    pub fn pool_replacements(&self) -> u64 {
        self.pool_replacements.load(Ordering::Relaxed)
    }

    /// Failures recorded under a specific [`RenderError::metric_tag`].
    pub fn failed_with_tag(&self, tag: &str) -> u64 {
        *self.failed_by_tag.lock().unwrap().get(tag).unwrap_or(&0)
    }

    /// Sum of all recorded render durations.
    pub fn total_render_duration(&self) -> Duration {
        Duration::from_micros(self.render_duration_micros_total.load(Ordering::Relaxed))
    }

    /// Sum of all recorded pool acquisition wait times.
    pub fn total_pool_acquisition_time(&self) -> Duration {
        Duration::from_micros(self.pool_acquisition_micros_total.load(Ordering::Relaxed))
    }
}

impl Metrics for RecordingMetrics {
    fn incr_generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_failed(&self, tag: &'static str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self.failed_by_tag.lock().unwrap().entry(tag).or_insert(0) += 1;
    }

    fn incr_pool_replacements(&self) {
        self.pool_replacements.fetch_add(1, Ordering::Relaxed);
    }

    fn record_render_duration(&self, duration: Duration, _mode: Option<PaginationMode>) {
        self.render_duration_micros_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn record_pool_acquisition_time(&self, duration: Duration) {
        self.pool_acquisition_micros_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn record_webengine_time(&self, duration: Duration) {
        self.webengine_micros_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn record_css_injection_time(&self, duration: Duration) {
        self.css_injection_micros_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn record_data_conversion_time(&self, duration: Duration) {
        self.data_conversion_micros_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_accepts_every_call_without_panicking() {
        let metrics = NoopMetrics;
        metrics.incr_generated();
        metrics.incr_failed("render_timeout");
        metrics.record_success(Duration::from_millis(5), PaginationMode::Continuous);
        metrics.record_failure(Duration::from_millis(5), &RenderError::RenderTimeout);
    }

    #[test]
    fn recording_metrics_tallies_success_and_failure() {
        let metrics = RecordingMetrics::new();
        metrics.record_success(Duration::from_millis(10), PaginationMode::Continuous);
        metrics.record_success(Duration::from_millis(20), PaginationMode::Paginated);
        metrics.record_failure(Duration::from_millis(5), &RenderError::RenderTimeout);

        assert_eq!(metrics.generated(), 2);
        assert_eq!(metrics.failed(), 1);
        assert_eq!(metrics.total_render_duration(), Duration::from_millis(35));
        assert_eq!(metrics.failed_with_tag("render_timeout"), 1);
        assert_eq!(metrics.failed_with_tag("document_timeout"), 0);
    }

    #[test]
    fn recording_metrics_tracks_pool_replacements() {
        let metrics = RecordingMetrics::new();
        metrics.incr_pool_replacements();
        metrics.incr_pool_replacements();
        assert_eq!(metrics.pool_replacements(), 2);
    }

    #[test]
    fn recording_metrics_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordingMetrics>();
    }
}
