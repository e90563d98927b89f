//! The engine-agnostic worker contract: the black-box rendering primitives a
//! pooled worker must expose, and the factory seam used to create them.
//!
//! [`Worker`] is deliberately synchronous and thread-affine — a real
//! implementation wraps a single headless browser instance that must only
//! ever be driven from one OS thread (see [`crate::pool`] for how callers
//! run it via `spawn_blocking`). [`WorkerResource`] adds use-count tracking
//! and the validate/reset contract on top of a bare `Worker`.

mod chrome;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod resource;

pub use chrome::{create_chrome_options, ChromeWorker, ChromeWorkerFactory};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockWorkerFactory;
pub use resource::WorkerResource;

use crate::config::{Margins, PaperSize, PipelineConfig};
use crate::error::Result;

/// The black-box rendering engine contract.
///
/// Out of scope for this crate: what "render" actually *means* internally —
/// implementors own that. What's in scope is the sequence a
/// [`DocumentRenderer`](crate::render::DocumentRenderer) drives every worker
/// through: load, optionally query, render, and eventually reset.
pub trait Worker: Send {
    /// Load an HTML payload, resolving relative references against
    /// `base_url` if given. Must fully replace any previously loaded
    /// document.
    fn load(&mut self, html: &[u8], base_url: Option<&str>) -> Result<()>;

    /// Render the currently loaded document as a single, arbitrarily tall
    /// page sized to its content.
    fn render_single_page(&mut self, paper_size: PaperSize) -> Result<Vec<u8>>;

    /// Render the currently loaded document as standard paginated pages with
    /// the given margins.
    fn render_paginated(&mut self, paper_size: PaperSize, margins: Margins) -> Result<Vec<u8>>;

    /// Query the content height of the currently loaded document, in points.
    /// Used by [`AutomaticHeuristic::ContentLength`](crate::config::AutomaticHeuristic::ContentLength).
    fn query_content_height(&mut self) -> Result<f64>;

    /// Whether the currently loaded document defines `@media print` rules.
    /// Used by [`AutomaticHeuristic::HtmlStructure`](crate::config::AutomaticHeuristic::HtmlStructure).
    fn query_has_print_media(&mut self) -> Result<bool>;

    /// Whether the currently loaded document uses explicit page-break
    /// styling. Used by [`AutomaticHeuristic::HtmlStructure`](crate::config::AutomaticHeuristic::HtmlStructure).
    fn query_has_page_break_style(&mut self) -> Result<bool>;

    /// Liveness probe. Should be fast and side-effect-free beyond whatever
    /// minimal round-trip it takes to confirm the engine is still responsive.
    fn probe(&mut self) -> bool;

    /// Cancel any in-flight load/render and drop per-document state. Must
    /// not navigate to a blank page — that round-trip is far slower than
    /// simply abandoning the in-flight operation.
    fn cancel(&mut self);

    /// Flush internal engine caches (compiled stylesheets, image decode
    /// caches, …) without recreating the whole worker. Called periodically
    /// rather than on every use; see [`PipelineConfig::clear_caches_every`].
    fn clear_caches(&mut self) -> Result<()>;
}

/// Creates [`Worker`] instances. The seam real callers use to bind a
/// concrete engine, and the seam tests use to substitute
/// [`mock::MockWorkerFactory`].
pub trait WorkerFactory: Send + Sync {
    /// Create a new, ready-to-use worker configured per `config`.
    fn create(&self, config: &PipelineConfig) -> Result<Box<dyn Worker>>;
}

/// Per-worker settings that don't vary per render call: the recycle
/// threshold and cache-flush interval from [`PipelineConfig`].
#[derive(Debug, Clone, Copy)]
pub struct WorkerResourceConfig {
    /// Number of uses after which the worker is recycled rather than reused.
    pub max_uses_before_recreate: u64,
    /// Use-count interval at which internal engine caches are flushed
    /// without a full recycle. `0` disables interval flushing.
    pub clear_caches_every: u64,
}

impl From<&PipelineConfig> for WorkerResourceConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_uses_before_recreate: config.max_uses_before_recreate,
            clear_caches_every: config.clear_caches_every,
        }
    }
}
