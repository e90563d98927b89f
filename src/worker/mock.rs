//! A configurable fake [`Worker`]/[`WorkerFactory`] pair for tests, grounded
//! on the teacher crate's `MockBrowserFactory`: supports unconditional
//! failure, failure after N successes, and a configurable rendered payload
//! so tests can exercise the full document-render path without a real
//! engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{Worker, WorkerFactory};
use crate::config::{Margins, PaperSize, PipelineConfig};
use crate::error::{RenderError, Result};

/// A minimal byte sequence that satisfies "looks like a PDF" (starts with
/// `%PDF-`) without being a real, page-parseable document.
const DEFAULT_PAYLOAD: &[u8] = b"%PDF-1.4\n%mock\n%%EOF";

/// A [`WorkerFactory`] that hands out [`MockWorker`]s instead of driving a
/// real engine.
pub struct MockWorkerFactory {
    should_fail: bool,
    error_message: String,
    creation_count: Arc<AtomicUsize>,
    fail_after: Option<usize>,
    rendered_payload: Vec<u8>,
    content_height: f64,
    has_print_media: bool,
    has_page_break_style: bool,
}

impl MockWorkerFactory {
    /// A factory that always succeeds, returning a healthy [`MockWorker`].
    pub fn new() -> Self {
        Self {
            should_fail: false,
            error_message: String::new(),
            creation_count: Arc::new(AtomicUsize::new(0)),
            fail_after: None,
            rendered_payload: DEFAULT_PAYLOAD.to_vec(),
            content_height: 792.0,
            has_print_media: false,
            has_page_break_style: false,
        }
    }

    /// A factory whose every `create` call fails with `message`.
    pub fn always_fails(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: message.into(),
            ..Self::new()
        }
    }

    /// A factory that succeeds for the first `n` calls, then fails with
    /// `message` on every call after that.
    pub fn fail_after_n(n: usize, message: impl Into<String>) -> Self {
        Self {
            fail_after: Some(n),
            error_message: message.into(),
            ..Self::new()
        }
    }

    /// Override the bytes returned from `render_single_page`/`render_paginated`.
    pub fn with_rendered_payload(mut self, payload: Vec<u8>) -> Self {
        self.rendered_payload = payload;
        self
    }

    /// Override the content height reported by `query_content_height`.
    pub fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = height;
        self
    }

    /// Override whether created workers report print-media styling.
    pub fn with_print_media(mut self, value: bool) -> Self {
        self.has_print_media = value;
        self
    }

    /// Override whether created workers report page-break styling.
    pub fn with_page_break_style(mut self, value: bool) -> Self {
        self.has_page_break_style = value;
        self
    }

    /// Number of workers created so far.
    pub fn creation_count(&self) -> usize {
        self.creation_count.load(Ordering::SeqCst)
    }

    /// Reset the creation counter to zero.
    pub fn reset_count(&self) {
        self.creation_count.store(0, Ordering::SeqCst);
    }

    /// Share the creation counter with another owner, e.g. to observe it
    /// from outside the factory.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.creation_count)
    }
}

impl Default for MockWorkerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerFactory for MockWorkerFactory {
    fn create(&self, _config: &PipelineConfig) -> Result<Box<dyn Worker>> {
        let count = self.creation_count.fetch_add(1, Ordering::SeqCst) + 1;

        if self.should_fail {
            return Err(RenderError::PoolInitFailed(self.error_message.clone()));
        }
        if let Some(n) = self.fail_after {
            if count > n {
                return Err(RenderError::PoolInitFailed(self.error_message.clone()));
            }
        }

        Ok(Box::new(MockWorker {
            loaded: false,
            alive: true,
            rendered_payload: self.rendered_payload.clone(),
            content_height: self.content_height,
            has_print_media: self.has_print_media,
            has_page_break_style: self.has_page_break_style,
        }))
    }
}

impl std::fmt::Debug for MockWorkerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockWorkerFactory")
            .field("should_fail", &self.should_fail)
            .field("fail_after", &self.fail_after)
            .field("creation_count", &self.creation_count())
            .finish()
    }
}

/// A fake [`Worker`] backed by in-memory state instead of a real engine.
struct MockWorker {
    loaded: bool,
    alive: bool,
    rendered_payload: Vec<u8>,
    content_height: f64,
    has_print_media: bool,
    has_page_break_style: bool,
}

impl Worker for MockWorker {
    fn load(&mut self, html: &[u8], _base_url: Option<&str>) -> Result<()> {
        if html.is_empty() {
            return Err(RenderError::InvalidHtml("empty document".to_string()));
        }
        self.loaded = true;
        Ok(())
    }

    fn render_single_page(&mut self, _paper_size: PaperSize) -> Result<Vec<u8>> {
        if !self.loaded {
            return Err(RenderError::EngineLoadFailed("no document loaded".to_string()));
        }
        Ok(self.rendered_payload.clone())
    }

    fn render_paginated(&mut self, _paper_size: PaperSize, _margins: Margins) -> Result<Vec<u8>> {
        if !self.loaded {
            return Err(RenderError::EngineLoadFailed("no document loaded".to_string()));
        }
        Ok(self.rendered_payload.clone())
    }

    fn query_content_height(&mut self) -> Result<f64> {
        Ok(self.content_height)
    }

    fn query_has_print_media(&mut self) -> Result<bool> {
        Ok(self.has_print_media)
    }

    fn query_has_page_break_style(&mut self) -> Result<bool> {
        Ok(self.has_page_break_style)
    }

    fn probe(&mut self) -> bool {
        self.alive
    }

    fn cancel(&mut self) {
        self.loaded = false;
    }

    fn clear_caches(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_factory_creates_workers() {
        let factory = MockWorkerFactory::new();
        let worker = factory.create(&PipelineConfig::default());
        assert!(worker.is_ok());
        assert_eq!(factory.creation_count(), 1);
    }

    #[test]
    fn always_fails_rejects_every_call() {
        let factory = MockWorkerFactory::always_fails("boom");
        assert!(factory.create(&PipelineConfig::default()).is_err());
        assert!(factory.create(&PipelineConfig::default()).is_err());
        assert_eq!(factory.creation_count(), 2);
    }

    #[test]
    fn fail_after_n_switches_to_failing() {
        let factory = MockWorkerFactory::fail_after_n(2, "exhausted");
        assert!(factory.create(&PipelineConfig::default()).is_ok());
        assert!(factory.create(&PipelineConfig::default()).is_ok());
        assert!(factory.create(&PipelineConfig::default()).is_err());
    }

    #[test]
    fn reset_count_zeroes_the_counter() {
        let factory = MockWorkerFactory::new();
        factory.create(&PipelineConfig::default()).unwrap();
        factory.reset_count();
        assert_eq!(factory.creation_count(), 0);
    }

    #[test]
    fn worker_requires_load_before_render() {
        let factory = MockWorkerFactory::new();
        let mut worker = factory.create(&PipelineConfig::default()).unwrap();
        let result = worker.render_single_page(PaperSize::default());
        assert!(matches!(result, Err(RenderError::EngineLoadFailed(_))));
    }

    #[test]
    fn worker_renders_configured_payload_after_load() {
        let factory = MockWorkerFactory::new().with_rendered_payload(b"%PDF-1.7\n".to_vec());
        let mut worker = factory.create(&PipelineConfig::default()).unwrap();
        worker.load(b"<html></html>", None).unwrap();
        let bytes = worker.render_single_page(PaperSize::default()).unwrap();
        assert_eq!(bytes, b"%PDF-1.7\n");
    }

    #[test]
    fn empty_html_is_rejected() {
        let factory = MockWorkerFactory::new();
        let mut worker = factory.create(&PipelineConfig::default()).unwrap();
        assert!(matches!(worker.load(b"", None), Err(RenderError::InvalidHtml(_))));
    }
}
