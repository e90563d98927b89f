//! [`WorkerResource`]: a [`Worker`] plus the use-count tracking and
//! validate/reset contract the pool relies on to decide when to recycle it.

use super::{Worker, WorkerResourceConfig};
use crate::config::{Margins, PaperSize};
use crate::error::Result;

/// A pooled worker, wrapping an engine-agnostic [`Worker`] with the
/// bookkeeping the pool needs: how many times it's been used, and whether
/// it's still healthy enough to hand out again.
///
/// # Invariants
///
/// - No in-progress navigation survives a [`reset`](Self::reset) call.
/// - [`validate`](Self::validate) returns `false` if and only if
///   `use_count >= max_uses_before_recreate`, or the underlying worker fails
///   [`probe`](Worker::probe).
pub struct WorkerResource {
    inner: Box<dyn Worker>,
    config: WorkerResourceConfig,
    use_count: u64,
}

impl WorkerResource {
    /// Wrap a freshly created worker.
    pub fn new(inner: Box<dyn Worker>, config: WorkerResourceConfig) -> Self {
        Self {
            inner,
            config,
            use_count: 0,
        }
    }

    /// Number of times this worker has been used since creation.
    pub fn use_count(&self) -> u64 {
        self.use_count
    }

    /// Load an HTML payload into the underlying worker.
    pub fn load(&mut self, html: &[u8], base_url: Option<&str>) -> Result<()> {
        self.inner.load(html, base_url)
    }

    /// Render the currently loaded document as a single continuous page.
    pub fn render_single_page(&mut self, paper_size: PaperSize) -> Result<Vec<u8>> {
        self.inner.render_single_page(paper_size)
    }

    /// Render the currently loaded document as paginated pages.
    pub fn render_paginated(&mut self, paper_size: PaperSize, margins: Margins) -> Result<Vec<u8>> {
        self.inner.render_paginated(paper_size, margins)
    }

    /// Query the content height of the currently loaded document, in points.
    pub fn query_content_height(&mut self) -> Result<f64> {
        self.inner.query_content_height()
    }

    /// Whether the currently loaded document defines `@media print` rules.
    pub fn query_has_print_media(&mut self) -> Result<bool> {
        self.inner.query_has_print_media()
    }

    /// Whether the currently loaded document uses explicit page-break styling.
    pub fn query_has_page_break_style(&mut self) -> Result<bool> {
        self.inner.query_has_page_break_style()
    }

    /// Cancel any in-flight work, bump the use count, and flush engine
    /// caches if this use crosses a `clear_caches_every` boundary.
    ///
    /// Called on every release back to the pool, independent of whether the
    /// release follows success or failure.
    pub fn reset(&mut self) -> Result<()> {
        self.inner.cancel();
        self.use_count += 1;

        if self.config.clear_caches_every > 0 && self.use_count % self.config.clear_caches_every == 0
        {
            self.inner.clear_caches()?;
        }

        Ok(())
    }

    /// Whether this worker is still healthy enough to hand out again.
    ///
    /// Returns `false` (and the caller should recycle) if the use-count
    /// threshold has been reached, or if the underlying worker fails its
    /// liveness probe. Does not mutate any state beyond what `probe` does.
    pub fn validate(&mut self) -> bool {
        if self.use_count >= self.config.max_uses_before_recreate {
            return false;
        }
        self.inner.probe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::mock::MockWorkerFactory;
    use crate::worker::WorkerFactory;
    use crate::config::PipelineConfig;

    fn resource(max_uses: u64, clear_every: u64) -> WorkerResource {
        let factory = MockWorkerFactory::new();
        let worker = factory.create(&PipelineConfig::default()).unwrap();
        WorkerResource::new(
            worker,
            WorkerResourceConfig {
                max_uses_before_recreate: max_uses,
                clear_caches_every: clear_every,
            },
        )
    }

    #[test]
    fn validate_is_healthy_below_threshold() {
        let mut resource = resource(3, 0);
        assert!(resource.validate());
        resource.reset().unwrap();
        assert!(resource.validate());
    }

    #[test]
    fn validate_fails_once_use_count_reaches_threshold() {
        let mut resource = resource(2, 0);
        resource.reset().unwrap();
        resource.reset().unwrap();
        assert_eq!(resource.use_count(), 2);
        assert!(!resource.validate());
    }

    #[test]
    fn reset_increments_use_count_every_call() {
        let mut resource = resource(1000, 0);
        for expected in 1..=5u64 {
            resource.reset().unwrap();
            assert_eq!(resource.use_count(), expected);
        }
    }
}
