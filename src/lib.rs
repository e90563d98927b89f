//! # html2pdf-api
//!
//! A concurrent HTML-to-PDF rendering pipeline built around a fixed-size
//! pool of rendering engines.
//!
//! This crate turns batches of HTML documents into committed PDF files with
//! bounded concurrency, configurable pagination and appearance, and a
//! recycling worker pool so no single document's failure corrupts the
//! workers behind it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              BatchScheduler                  │
//! │   dispatches N documents concurrently,       │
//! │   streams results back in completion order   │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │            DocumentRenderer                  │
//! │  directory check → load → mode choice →      │
//! │  render → atomic commit → page parsing       │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │              ResourcePool                    │
//! │  fixed-capacity pool of WorkerResource,      │
//! │  FIFO waiter queue, recycle on use-count      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │         Worker (engine-agnostic)             │
//! │   ChromeWorker (headless_chrome) by default  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2pdf_api::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(PipelineConfigBuilder::new().build()?);
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
//!     let documents = vec![Document::new(
//!         b"<h1>Hello</h1>".to_vec(),
//!         "out/hello.pdf",
//!     )];
//!
//!     let mut stream = scheduler.documents(documents);
//!     while let Some(item) = stream.next().await {
//!         match item? {
//!             ScheduledItem::Rendered(result) => println!("wrote {:?}", result.url),
//!             ScheduledItem::Failed(failed) => eprintln!("failed: {}", failed.error),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! When the `env-config` feature is enabled (the default), a
//! [`PipelineConfig`] can be built from environment variables loaded from an
//! `app.env` file or the process environment:
//!
//! ```rust,no_run
//! use html2pdf_api::config::env::from_env;
//!
//! let config = from_env().expect("invalid environment configuration");
//! ```
//!
//! ### Environment Variables
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `PIPELINE_CONCURRENCY` | usize | automatic | Fixed in-flight document count |
//! | `PIPELINE_MAX_USES_BEFORE_RECREATE` | u64 | 2000 | Worker recycle threshold |
//! | `PIPELINE_CLEAR_CACHES_EVERY` | u64 | 100 | Engine cache flush interval |
//! | `PIPELINE_ACQUISITION_TIMEOUT_SECONDS` | u64 | 60 | Pool acquisition timeout |
//! | `PIPELINE_CREATE_DIRECTORIES` | bool | false | Create missing output directories |
//! | `CHROME_PATH` | String | auto | Custom Chrome binary path |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Enable environment-based configuration |
//! | `test-utils` | Enable [`worker::MockWorkerFactory`] for testing outside this crate |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, RenderError>`](Result). See
//! [`RenderError`] for the closed taxonomy of what can go wrong and its
//! `metric_tag`/`is_retryable`/`retires_worker` classification methods.
//!
//! ## Testing
//!
//! For testing without a real browser, enable the `test-utils` feature and
//! use [`worker::MockWorkerFactory`]:
//!
//! ```rust
//! use html2pdf_api::worker::MockWorkerFactory;
//!
//! let factory = MockWorkerFactory::always_fails("simulated engine failure");
//! assert!(factory.creation_count() == 0);
//! ```

#![doc(html_root_url = "https://docs.rs/html2pdf-api/0.2.7")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pdf;
pub mod pool;
pub mod prelude;
pub mod render;
pub mod schedule;
pub mod worker;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

pub use config::{
    Appearance, AutomaticHeuristic, Concurrency, Margins, NamingStrategy, PaginationMode,
    PaperSize, PipelineConfig, PipelineConfigBuilder,
};
pub use error::{RenderError, Result};
pub use metrics::{Metrics, NoopMetrics, RecordingMetrics};
pub use pdf::{Document, FailedDocument, PageDimensions, RenderResult};
pub use pool::{PoolHandle, PoolStats, ResourcePool, ResourcePoolBuilder};
pub use schedule::{BatchScheduler, BatchStream, ScheduledItem};
pub use worker::{ChromeWorkerFactory, Worker, WorkerFactory};

#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};

// ============================================================================
// Convenience type aliases
// ============================================================================

/// Shared resource pool type for hosts embedding this pipeline behind a
/// long-lived service.
///
/// # Example
///
/// ```rust,no_run
/// use html2pdf_api::{SharedResourcePool, ResourcePoolBuilder, ChromeWorkerFactory};
/// use std::sync::Arc;
///
/// # async fn build() -> html2pdf_api::Result<()> {
/// let pool: SharedResourcePool = Arc::new(
///     ResourcePoolBuilder::new()
///         .capacity(4)
///         .factory(Arc::new(ChromeWorkerFactory::with_defaults()))
///         .build()?,
/// );
/// # Ok(())
/// # }
/// ```
pub type SharedResourcePool = std::sync::Arc<ResourcePool>;
