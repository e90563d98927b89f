//! Error types for the rendering pipeline.
//!
//! This module provides [`RenderError`], a single unified error type for
//! every fallible operation in this crate — worker lifecycle, pool
//! acquisition, per-document rendering, and batch scheduling all report
//! through it — plus a convenient [`Result`] type alias.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_api::{RenderError, Result};
//!
//! fn process_pdf() -> Result<Vec<u8>> {
//!     // Your logic here...
//!     Err(RenderError::Configuration("example error".to_string()))
//! }
//!
//! match process_pdf() {
//!     Ok(pdf) => println!("Generated {} bytes", pdf.len()),
//!     Err(RenderError::Cancelled) => println!("Render was cancelled"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

/// Closed taxonomy of everything that can go wrong while turning HTML into a
/// committed PDF.
///
/// Each variant has a stable [`metric_tag`](RenderError::metric_tag) used to
/// dimension counters, and is classified by [`is_retryable`](RenderError::is_retryable)
/// (safe for a caller to retry the same document) and
/// [`retires_worker`](RenderError::retires_worker) (the worker that produced it
/// should be recycled rather than trusted again).
///
/// # Example
///
/// ```rust
/// use html2pdf_api::RenderError;
///
/// fn handle_error(error: RenderError) {
///     match error {
///         RenderError::EngineLoadFailed(msg) => {
///             eprintln!("Engine failed to load document: {}", msg);
///         }
///         RenderError::AcquisitionTimeout => {
///             eprintln!("Timed out waiting for a worker");
///         }
///         RenderError::Configuration(msg) => {
///             eprintln!("Configuration error: {}", msg);
///         }
///         other => eprintln!("Error: {}", other),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// HTML payload could not be used by the pipeline.
    ///
    /// Not about malformed UTF-8 (the engine tolerates that) — this is for
    /// payloads the pipeline itself refuses, such as empty input.
    #[error("invalid html: {0}")]
    InvalidHtml(String),

    /// The destination path is not usable as a render target.
    #[error("invalid file path: {0}")]
    InvalidFilePath(String),

    /// `create_directories` was requested but the parent directory could not
    /// be created.
    #[error("failed to create destination directory: {0}")]
    DirectoryCreationFailed(#[source] std::io::Error),

    /// The rendered PDF could not be written to its destination, either at
    /// the temporary-file write or the final atomic rename.
    #[error("failed to commit rendered document: {0}")]
    CommitFailed(#[source] std::io::Error),

    /// The engine failed to load the HTML payload into a page.
    #[error("engine failed to load document: {0}")]
    EngineLoadFailed(String),

    /// The engine loaded the payload but navigation/readiness signaling failed.
    #[error("engine navigation failed: {0}")]
    EngineNavigationFailed(String),

    /// The engine did not finish loading within the per-document budget.
    #[error("render timed out waiting on the engine")]
    RenderTimeout,

    /// The pool has no spare capacity and cannot grow further.
    #[error("resource pool is exhausted")]
    PoolExhausted,

    /// A caller waited longer than `workerAcquisitionTimeout` for a worker.
    #[error("timed out waiting to acquire a worker")]
    AcquisitionTimeout,

    /// Pool warm-up failed; the pool is not usable.
    #[error("pool initialization failed: {0}")]
    PoolInitFailed(String),

    /// The engine's single continuous-page rendering primitive failed.
    #[error("pdf generation failed: {0}")]
    PdfGenerationFailed(String),

    /// The engine's paginated rendering primitive failed.
    #[error("print operation failed: {0}")]
    PrintOperationFailed(String),

    /// The whole per-document budget (`documentTimeout`) was exceeded.
    #[error("document exceeded its timeout budget")]
    DocumentTimeout,

    /// The whole-batch budget (`batchTimeout`) was exceeded.
    #[error("batch exceeded its timeout budget")]
    BatchTimeout,

    /// The operation was cancelled by its caller before completing.
    #[error("operation was cancelled")]
    Cancelled,

    /// A task finished without producing a result or an error. Surfaced
    /// defensively rather than panicking; should not occur in practice.
    #[error("no result was produced")]
    NoResultProduced,

    /// A requested capability (an engine query, a pagination mode, …) is not
    /// available from the current engine implementation.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Builder/validation failures that don't belong to the render path
    /// itself — invalid configuration, a bad naming strategy, and so on.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RenderError {
    /// Stable string tag used as a metrics dimension.
    ///
    /// # Example
    ///
    /// ```rust
    /// use html2pdf_api::RenderError;
    ///
    /// assert_eq!(RenderError::AcquisitionTimeout.metric_tag(), "acquisition_timeout");
    /// ```
    pub fn metric_tag(&self) -> &'static str {
        match self {
            Self::InvalidHtml(_) => "invalid_html",
            Self::InvalidFilePath(_) => "invalid_file_path",
            Self::DirectoryCreationFailed(_) => "directory_creation_failed",
            Self::CommitFailed(_) => "commit_failed",
            Self::EngineLoadFailed(_) => "engine_load_failed",
            Self::EngineNavigationFailed(_) => "engine_navigation_failed",
            Self::RenderTimeout => "render_timeout",
            Self::PoolExhausted => "pool_exhausted",
            Self::AcquisitionTimeout => "acquisition_timeout",
            Self::PoolInitFailed(_) => "pool_init_failed",
            Self::PdfGenerationFailed(_) => "pdf_generation_failed",
            Self::PrintOperationFailed(_) => "print_operation_failed",
            Self::DocumentTimeout => "document_timeout",
            Self::BatchTimeout => "batch_timeout",
            Self::Cancelled => "cancelled",
            Self::NoResultProduced => "no_result_produced",
            Self::CapabilityUnavailable(_) => "capability_unavailable",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Whether a caller might reasonably retry the same document after this
    /// error. Only timeout and pool-exhaustion kinds qualify — everything
    /// else is either a permanent input problem or already terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RenderTimeout
                | Self::PoolExhausted
                | Self::AcquisitionTimeout
                | Self::DocumentTimeout
                | Self::BatchTimeout
        )
    }

    /// Whether the worker that produced this error should be recycled rather
    /// than trusted again.
    pub fn retires_worker(&self) -> bool {
        matches!(
            self,
            Self::EngineLoadFailed(_) | Self::EngineNavigationFailed(_) | Self::RenderTimeout
        )
    }
}

/// Convenience conversion from [`String`] to [`RenderError::Configuration`].
///
/// Allows using the `?` operator with functions that return `String` errors
/// in contexts expecting [`RenderError`].
impl From<String> for RenderError {
    fn from(message: String) -> Self {
        RenderError::Configuration(message)
    }
}

/// Convenience conversion from `&str` to [`RenderError::Configuration`].
impl From<&str> for RenderError {
    fn from(message: &str) -> Self {
        RenderError::Configuration(message.to_string())
    }
}

/// Result type alias using [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_conversion_from_string_and_str() {
        let error: RenderError = "test error".into();
        match error {
            RenderError::Configuration(msg) => assert_eq!(msg, "test error"),
            _ => panic!("expected Configuration variant"),
        }

        let error: RenderError = "another error".to_string().into();
        match error {
            RenderError::Configuration(msg) => assert_eq!(msg, "another error"),
            _ => panic!("expected Configuration variant"),
        }
    }

    #[test]
    fn error_display() {
        let error = RenderError::EngineLoadFailed("timed out".to_string());
        assert_eq!(error.to_string(), "engine failed to load document: timed out");

        let error = RenderError::Cancelled;
        assert_eq!(error.to_string(), "operation was cancelled");
    }

    #[test]
    fn metric_tags_are_stable() {
        assert_eq!(RenderError::PoolExhausted.metric_tag(), "pool_exhausted");
        assert_eq!(RenderError::DocumentTimeout.metric_tag(), "document_timeout");
        assert_eq!(
            RenderError::CapabilityUnavailable("x".into()).metric_tag(),
            "capability_unavailable"
        );
    }

    #[test]
    fn only_timeouts_and_exhaustion_are_retryable() {
        assert!(RenderError::AcquisitionTimeout.is_retryable());
        assert!(RenderError::BatchTimeout.is_retryable());
        assert!(!RenderError::InvalidHtml("x".into()).is_retryable());
        assert!(!RenderError::Cancelled.is_retryable());
    }

    #[test]
    fn engine_failures_retire_the_worker() {
        assert!(RenderError::EngineLoadFailed("x".into()).retires_worker());
        assert!(RenderError::RenderTimeout.retires_worker());
        assert!(!RenderError::InvalidFilePath("x".into()).retires_worker());
    }

    #[test]
    fn is_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<RenderError>();
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderError>();
    }
}
