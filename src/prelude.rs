//! Convenient imports for common usage patterns.
//!
//! This module re-exports the most commonly used types from `html2pdf-api`,
//! allowing you to quickly get started with a single import.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use html2pdf_api::prelude::*;
//! ```
//!
//! This single line gives you access to the core types needed to configure a
//! [`ResourcePool`], build a [`BatchScheduler`], and drive a batch of
//! [`Document`]s through to committed PDFs.
//!
//! # What's Included
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResourcePool`] | Fixed-capacity pool of rendering workers |
//! | [`ResourcePoolBuilder`] | Builder for creating configured pools |
//! | [`PoolHandle`] | RAII handle for a checked-out worker |
//! | [`PoolStats`] | Real-time pool statistics |
//! | [`SharedResourcePool`] | Type alias for `Arc<ResourcePool>` |
//! | [`Worker`] | Trait for rendering engines |
//! | [`WorkerFactory`] | Trait for worker creation strategies |
//! | [`ChromeWorkerFactory`] | Default headless-Chrome factory |
//! | [`BatchScheduler`] | Dispatches a batch of documents at bounded concurrency |
//! | [`BatchStream`] | Async stream of [`ScheduledItem`]s |
//! | [`ScheduledItem`] | One rendered or failed document |
//! | [`Document`] | An HTML document paired with its output destination |
//! | [`RenderResult`] | A successfully rendered document's outcome |
//! | [`FailedDocument`] | A document that failed in resilient batch mode |
//! | [`PageDimensions`] | A page's media-box dimensions |
//! | [`PipelineConfig`] | Configuration for pagination, margins, concurrency |
//! | [`PipelineConfigBuilder`] | Builder for [`PipelineConfig`] |
//! | [`Metrics`] | Trait for observing pipeline behavior |
//! | [`NoopMetrics`] | Zero-cost default metrics implementation |
//! | [`RecordingMetrics`] | Atomics-based in-process metrics implementation |
//! | [`RenderError`] | Error type for pipeline operations |
//! | [`Result`] | Type alias for `Result<T, RenderError>` |
//!
//! ## Standard Library Re-exports
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Arc`] | Thread-safe reference counting |
//!
//! ## Feature-Gated Exports
//!
//! ### `env-config` Feature
//!
//! | Export | Description |
//! |--------|-------------|
//! | [`from_env`] | Load a [`PipelineConfig`] from environment variables |
//! | [`chrome_path_from_env`] | Get Chrome path from `CHROME_PATH` env var |
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use html2pdf_api::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(PipelineConfigBuilder::new().build()?);
//!
//!     let pool = ResourcePoolBuilder::new()
//!         .capacity(4)
//!         .factory(Arc::new(ChromeWorkerFactory::with_defaults()))
//!         .pipeline_config((*config).clone())
//!         .build()?;
//!     pool.warmup().await?;
//!
//!     let scheduler = BatchScheduler::new(
//!         pool,
//!         Arc::new(CssInjectionCache::new()),
//!         config,
//!         Arc::new(NoopMetrics),
//!     );
//!
//!     let mut stream = scheduler.documents(vec![Document::new(
//!         b"<h1>Hello</h1>".to_vec(),
//!         "out/hello.pdf",
//!     )]);
//!
//!     while let Some(item) = stream.next().await {
//!         match item? {
//!             ScheduledItem::Rendered(result) => println!("wrote {:?}", result.url),
//!             ScheduledItem::Failed(failed) => eprintln!("failed: {}", failed.error),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Using Environment Configuration
//!
//! With the `env-config` feature (enabled by default), configuration can be
//! loaded straight from the process environment:
//!
//! ```rust,no_run
//! use html2pdf_api::prelude::*;
//!
//! let config = from_env().expect("invalid environment configuration");
//! ```
//!
//! ## Checking Pool Statistics
//!
//! ```rust,no_run
//! use html2pdf_api::prelude::*;
//!
//! fn log_pool_status(pool: &ResourcePool) {
//!     let stats = pool.stats();
//!     println!("Pool status: available={} in_use={} under_replacement={}",
//!         stats.available, stats.in_use, stats.under_replacement);
//!     if stats.available == 0 && stats.under_replacement == 0 {
//!         println!("  warning: no idle workers available");
//!     }
//! }
//! ```
//!
//! # Feature Flag Reference
//!
//! | Feature | Adds to Prelude |
//! |---------|-----------------|
//! | (none) | Core types only |
//! | `env-config` | `from_env`, `chrome_path_from_env` |
//! | `test-utils` | `MockWorkerFactory` (in `worker`) |
//!
//! # See Also
//!
//! - [`crate::pool`] - Resource pool implementation details
//! - [`crate::render`] - Per-document rendering state machine
//! - [`crate::schedule`] - Batch dispatch
//! - [`crate::config`] - Configuration options

// ============================================================================
// Core Types (Always Available)
// ============================================================================

/// The fixed-capacity pool of rendering workers.
///
/// See [`crate::pool::ResourcePool`] for full documentation.
pub use crate::pool::ResourcePool;

/// Builder for creating configured [`ResourcePool`] instances.
///
/// See [`crate::pool::ResourcePoolBuilder`] for full documentation.
pub use crate::pool::ResourcePoolBuilder;

/// RAII handle for a worker checked out from the pool.
///
/// When dropped, the worker is reset, validated, and returned to the pool
/// (or recycled, if it failed validation). See [`crate::pool::PoolHandle`]
/// for full documentation, including why it must be dropped from inside a
/// blocking context.
pub use crate::pool::PoolHandle;

/// Real-time statistics about the resource pool.
///
/// See [`crate::pool::PoolStats`] for full documentation.
pub use crate::pool::PoolStats;

/// Type alias for a shared, reference-counted resource pool.
///
/// This is defined as `Arc<ResourcePool>`. Note that [`ResourcePool`] is
/// already internally `Arc`-backed and cheaply `Clone`, so most callers can
/// clone it directly instead of wrapping it further; this alias exists for
/// hosts that want a single named type to store in shared application state.
///
/// # Example
///
/// ```rust,no_run
/// use html2pdf_api::prelude::*;
///
/// # fn build() -> html2pdf_api::Result<()> {
/// let pool: SharedResourcePool = Arc::new(
///     ResourcePoolBuilder::new()
///         .factory(Arc::new(ChromeWorkerFactory::with_defaults()))
///         .build()?,
/// );
/// # Ok(())
/// # }
/// ```
pub use crate::SharedResourcePool;

/// Trait for rendering engines plugged into the pool.
///
/// Implement this trait to use an engine other than headless Chrome.
/// See [`crate::worker::Worker`] for full documentation.
pub use crate::worker::Worker;

/// Trait for worker creation strategies.
///
/// See [`crate::worker::WorkerFactory`] for full documentation.
pub use crate::worker::WorkerFactory;

/// Default factory for creating headless-Chrome workers.
///
/// See [`crate::worker::ChromeWorkerFactory`] for full documentation.
pub use crate::worker::ChromeWorkerFactory;

/// Dispatches a batch of documents at bounded concurrency and streams
/// results back in completion order.
///
/// See [`crate::schedule::BatchScheduler`] for full documentation.
pub use crate::schedule::BatchScheduler;

/// Async stream of [`ScheduledItem`]s produced by [`BatchScheduler::documents`].
///
/// See [`crate::schedule::BatchStream`] for full documentation.
pub use crate::schedule::BatchStream;

/// One item yielded from a running batch: a rendered document, or (in
/// resilient mode) a failed one.
///
/// See [`crate::schedule::ScheduledItem`] for full documentation.
pub use crate::schedule::ScheduledItem;

/// An HTML document paired with its intended output destination.
///
/// See [`crate::pdf::Document`] for full documentation.
pub use crate::pdf::Document;

/// The successful outcome of rendering one document.
///
/// See [`crate::pdf::RenderResult`] for full documentation.
pub use crate::pdf::RenderResult;

/// A document that failed to render, yielded only in resilient batch mode.
///
/// See [`crate::pdf::FailedDocument`] for full documentation.
pub use crate::pdf::FailedDocument;

/// A page's media-box dimensions, in points.
///
/// See [`crate::pdf::PageDimensions`] for full documentation.
pub use crate::pdf::PageDimensions;

/// Configuration for pagination, margins, appearance, and concurrency.
///
/// See [`crate::config::PipelineConfig`] for full documentation.
pub use crate::config::PipelineConfig;

/// Builder for creating [`PipelineConfig`] instances.
///
/// See [`crate::config::PipelineConfigBuilder`] for full documentation.
pub use crate::config::PipelineConfigBuilder;

/// Cache for the spliced-in margin/appearance CSS, shared across a batch.
///
/// See [`crate::cache::CssInjectionCache`] for full documentation.
pub use crate::cache::CssInjectionCache;

/// Trait for observing pipeline behavior (counts, durations, utilization).
///
/// See [`crate::metrics::Metrics`] for full documentation.
pub use crate::metrics::Metrics;

/// Zero-cost default [`Metrics`] implementation that records nothing.
///
/// See [`crate::metrics::NoopMetrics`] for full documentation.
pub use crate::metrics::NoopMetrics;

/// Atomics-based in-process [`Metrics`] implementation.
///
/// See [`crate::metrics::RecordingMetrics`] for full documentation.
pub use crate::metrics::RecordingMetrics;

/// Error type for pipeline operations.
///
/// See [`crate::error::RenderError`] for full documentation.
pub use crate::error::RenderError;

/// Result type alias using [`RenderError`].
///
/// Equivalent to `std::result::Result<T, RenderError>`.
pub use crate::error::Result;

// ============================================================================
// Standard Library Re-exports
// ============================================================================

/// Thread-safe reference counting pointer.
///
/// Re-exported for convenience when working with [`SharedResourcePool`] and
/// the various `Arc<dyn Trait>` fields the pipeline types take.
pub use std::sync::Arc;

// ============================================================================
// Environment Configuration (env-config feature)
// ============================================================================

/// Load pipeline configuration from environment variables.
///
/// # Example
///
/// ```rust,no_run
/// use html2pdf_api::prelude::*;
///
/// let config = from_env()?;
/// let pool = ResourcePoolBuilder::new()
///     .pipeline_config(config)
///     .factory(Arc::new(ChromeWorkerFactory::with_defaults()))
///     .build()?;
/// # Ok::<(), html2pdf_api::RenderError>(())
/// ```
#[cfg(feature = "env-config")]
pub use crate::config::env::from_env;

/// Get Chrome path from the `CHROME_PATH` environment variable.
///
/// Returns `Some(path)` if the variable is set, `None` otherwise.
///
/// # Example
///
/// ```rust,no_run
/// use html2pdf_api::prelude::*;
///
/// let factory = match chrome_path_from_env() {
///     Some(path) => ChromeWorkerFactory::with_path(path),
///     None => ChromeWorkerFactory::with_defaults(),
/// };
/// ```
#[cfg(feature = "env-config")]
pub use crate::config::env::chrome_path_from_env;

// ============================================================================
// Tests
// ============================================================================
