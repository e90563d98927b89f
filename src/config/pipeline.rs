//! Configuration for the rendering pipeline: paper geometry, pagination,
//! appearance, concurrency, and timeouts.
//!
//! This module provides [`PipelineConfig`] and [`PipelineConfigBuilder`] for
//! configuring a render run, plus the small value types ([`PaperSize`],
//! [`Margins`], [`PaginationMode`], [`Appearance`], [`Concurrency`],
//! [`NamingStrategy`]) that make up its fields.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_api::PipelineConfigBuilder;
//!
//! let config = PipelineConfigBuilder::new()
//!     .max_uses_before_recreate(500)
//!     .worker_acquisition_timeout(std::time::Duration::from_secs(30))
//!     .build()
//!     .expect("invalid configuration");
//!
//! assert_eq!(config.max_uses_before_recreate, 500);
//! ```

use std::time::Duration;

/// Page dimensions in PostScript points (1/72 inch), matching common paper
/// presets such as A4 or US Letter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

impl PaperSize {
    /// A4 portrait: 595.28 x 841.89 points.
    pub const A4: PaperSize = PaperSize {
        width: 595.28,
        height: 841.89,
    };

    /// US Letter portrait: 612 x 792 points.
    pub const LETTER: PaperSize = PaperSize {
        width: 612.0,
        height: 792.0,
    };

    /// Whether both dimensions are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Page margins in points. Negative values are clamped to zero at build time
/// (see [`PipelineConfigBuilder::build`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    /// Top margin in points.
    pub top: f64,
    /// Right margin in points.
    pub right: f64,
    /// Bottom margin in points.
    pub bottom: f64,
    /// Left margin in points.
    pub left: f64,
}

impl Margins {
    /// Equal margins on all four sides.
    pub fn uniform(points: f64) -> Self {
        Self {
            top: points,
            right: points,
            bottom: points,
            left: points,
        }
    }

    /// Clamp every component to be non-negative.
    pub fn clamped(mut self) -> Self {
        self.top = self.top.max(0.0);
        self.right = self.right.max(0.0);
        self.bottom = self.bottom.max(0.0);
        self.left = self.left.max(0.0);
        self
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(36.0)
    }
}

/// Heuristic used to pick a pagination mode when [`PaginationMode::Automatic`]
/// is configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomaticHeuristic {
    /// Treat the document as paginated once its rendered content height
    /// exceeds `threshold` points.
    ContentLength(f64),
    /// Inspect the loaded document for print-oriented markup (`@media print`
    /// rules, explicit page-break styling) and paginate if found.
    HtmlStructure,
    /// Prefer the cheaper continuous render whenever the engine can't
    /// confidently tell the two apart.
    PreferSpeed,
    /// Prefer the paginated render whenever the engine can't confidently
    /// tell the two apart.
    PreferPrintReady,
}

/// How a document's content is laid out across PDF pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaginationMode {
    /// A single, arbitrarily tall page sized to the document's content.
    Continuous,
    /// Standard paper-sized pages with margins, breaking where the engine
    /// sees fit.
    Paginated,
    /// Decide between [`Continuous`](PaginationMode::Continuous) and
    /// [`Paginated`](PaginationMode::Paginated) per document using the given
    /// heuristic.
    Automatic(AutomaticHeuristic),
}

impl Default for PaginationMode {
    fn default() -> Self {
        Self::Continuous
    }
}

/// Forces the engine's light/dark rendering mode, independent of whatever a
/// document's own media queries would otherwise pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Appearance {
    /// Force light mode.
    Light,
    /// Force dark mode.
    Dark,
    /// Defer to the document's own `prefers-color-scheme` media query.
    Auto,
}

impl Default for Appearance {
    fn default() -> Self {
        Self::Light
    }
}

/// How many documents a [`BatchScheduler`](crate::schedule::BatchScheduler)
/// renders at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Concurrency {
    /// A fixed, explicit number of documents in flight.
    Fixed(usize),
    /// Derive a sensible number from the host's CPU count.
    Automatic,
}

impl Default for Concurrency {
    fn default() -> Self {
        Self::Automatic
    }
}

impl Concurrency {
    /// Resolve to a concrete in-flight document count.
    ///
    /// `Automatic` uses the host's CPU count once it has 4 or more; below
    /// that, the host is treated as resource-constrained and capped at
    /// `min(cpus, 4)` so a 2-core box doesn't still try to hold 4 workers
    /// in flight.
    pub fn resolved(&self) -> usize {
        match self {
            Self::Fixed(n) => (*n).max(1),
            Self::Automatic => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                if cpus >= 4 {
                    cpus
                } else {
                    cpus.max(1)
                }
            }
        }
    }
}

/// How output filenames are derived for documents in a batch.
#[derive(Debug, Clone, Default)]
pub enum NamingStrategy {
    /// `"{index + 1}"` — one-based position within the batch.
    #[default]
    Sequential,
    /// A freshly generated UUID per document.
    Uuid,
}

impl NamingStrategy {
    /// Produce the base name (without extension) for the document at `index`
    /// within its batch.
    pub fn name_for(&self, index: usize) -> String {
        match self {
            Self::Sequential => (index + 1).to_string(),
            Self::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// A validated configuration snapshot for a render run.
///
/// Construct via [`PipelineConfigBuilder`] rather than directly — the
/// builder enforces the invariants documented on each field.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Page dimensions used for both continuous and paginated output.
    pub paper_size: PaperSize,
    /// Page margins, expressed as print-layer CSS padding. Always
    /// non-negative after [`build`](PipelineConfigBuilder::build).
    pub margins: Margins,
    /// Base URL used to resolve relative links/assets in the loaded HTML.
    pub base_url: Option<String>,
    /// Continuous vs. paginated vs. automatically decided.
    pub pagination_mode: PaginationMode,
    /// Forced light/dark/auto rendering mode.
    pub appearance: Appearance,
    /// In-flight document concurrency for a batch.
    pub concurrency: Concurrency,
    /// Upper bound on a single document's render time. `None` means no
    /// per-document timeout is enforced.
    pub document_timeout: Option<Duration>,
    /// Upper bound on an entire batch's wall-clock time. `None` means no
    /// batch timeout is enforced.
    pub batch_timeout: Option<Duration>,
    /// Upper bound on how long a caller waits to acquire a worker from the
    /// pool before receiving [`RenderError::AcquisitionTimeout`](crate::RenderError::AcquisitionTimeout).
    pub worker_acquisition_timeout: Duration,
    /// Whether missing destination directories should be created rather than
    /// treated as an error.
    pub create_directories: bool,
    /// How output filenames are derived.
    pub naming_strategy: NamingStrategy,
    /// Opt-in: keep rendering the rest of a batch after a document fails
    /// instead of aborting the whole batch. Default `false` (fail-fast).
    pub resilient: bool,
    /// Number of uses after which a worker is recycled rather than reused.
    pub max_uses_before_recreate: u64,
    /// Worker use-count interval at which internal engine caches are
    /// flushed without a full recycle.
    pub clear_caches_every: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::default(),
            margins: Margins::default(),
            base_url: None,
            pagination_mode: PaginationMode::default(),
            appearance: Appearance::default(),
            concurrency: Concurrency::default(),
            document_timeout: None,
            batch_timeout: None,
            worker_acquisition_timeout: Duration::from_secs(60),
            create_directories: false,
            naming_strategy: NamingStrategy::default(),
            resilient: false,
            max_uses_before_recreate: 2000,
            clear_caches_every: 100,
        }
    }
}

/// Builder for [`PipelineConfig`] with validation.
///
/// # Example
///
/// ```rust
/// use html2pdf_api::{PipelineConfigBuilder, PaperSize};
///
/// let config = PipelineConfigBuilder::new()
///     .paper_size(PaperSize::LETTER)
///     .create_directories(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.paper_size, PaperSize::LETTER);
/// ```
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder seeded with [`PipelineConfig::default`].
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Set the paper size used for rendering.
    pub fn paper_size(mut self, size: PaperSize) -> Self {
        self.config.paper_size = size;
        self
    }

    /// Set page margins.
    pub fn margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    /// Set the base URL used to resolve relative assets.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Set the pagination mode.
    pub fn pagination_mode(mut self, mode: PaginationMode) -> Self {
        self.config.pagination_mode = mode;
        self
    }

    /// Set the forced appearance mode.
    pub fn appearance(mut self, appearance: Appearance) -> Self {
        self.config.appearance = appearance;
        self
    }

    /// Set batch concurrency.
    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the per-document timeout.
    pub fn document_timeout(mut self, timeout: Duration) -> Self {
        self.config.document_timeout = Some(timeout);
        self
    }

    /// Set the whole-batch timeout.
    pub fn batch_timeout(mut self, timeout: Duration) -> Self {
        self.config.batch_timeout = Some(timeout);
        self
    }

    /// Set how long a caller waits to acquire a worker (must be > 0).
    pub fn worker_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.config.worker_acquisition_timeout = timeout;
        self
    }

    /// Create destination directories on demand rather than erroring.
    pub fn create_directories(mut self, create: bool) -> Self {
        self.config.create_directories = create;
        self
    }

    /// Set the output naming strategy.
    pub fn naming_strategy(mut self, strategy: NamingStrategy) -> Self {
        self.config.naming_strategy = strategy;
        self
    }

    /// Enable resilient (continue-on-error) batch mode.
    pub fn resilient(mut self, resilient: bool) -> Self {
        self.config.resilient = resilient;
        self
    }

    /// Set the use-count recycle threshold (must be > 0).
    pub fn max_uses_before_recreate(mut self, uses: u64) -> Self {
        self.config.max_uses_before_recreate = uses;
        self
    }

    /// Set the use-count interval for flushing engine caches without a full
    /// recycle. `0` disables interval flushing.
    pub fn clear_caches_every(mut self, uses: u64) -> Self {
        self.config.clear_caches_every = uses;
        self
    }

    /// Build and validate the configuration.
    ///
    /// - Paper size with a non-positive dimension falls back to
    ///   [`PaperSize::default`] rather than erroring.
    /// - Margins are clamped to be non-negative rather than erroring.
    /// - `worker_acquisition_timeout` must be greater than zero.
    /// - `max_uses_before_recreate` must be greater than zero.
    pub fn build(mut self) -> std::result::Result<PipelineConfig, String> {
        if !self.config.paper_size.is_valid() {
            self.config.paper_size = PaperSize::default();
        }
        self.config.margins = self.config.margins.clamped();

        if self.config.worker_acquisition_timeout.is_zero() {
            return Err("worker_acquisition_timeout must be greater than zero".to_string());
        }
        if self.config.max_uses_before_recreate == 0 {
            return Err("max_uses_before_recreate must be greater than zero".to_string());
        }

        Ok(self.config)
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.paper_size, PaperSize::A4);
        assert_eq!(config.margins, Margins::uniform(36.0));
        assert_eq!(config.pagination_mode, PaginationMode::Continuous);
        assert_eq!(config.appearance, Appearance::Light);
        assert_eq!(config.concurrency, Concurrency::Automatic);
        assert_eq!(config.worker_acquisition_timeout, Duration::from_secs(60));
    }

    #[test]
    fn non_positive_paper_size_falls_back_to_default() {
        let config = PipelineConfigBuilder::new()
            .paper_size(PaperSize { width: 0.0, height: -5.0 })
            .build()
            .unwrap();
        assert_eq!(config.paper_size, PaperSize::default());
    }

    #[test]
    fn negative_margins_are_clamped() {
        let config = PipelineConfigBuilder::new()
            .margins(Margins { top: -10.0, right: 5.0, bottom: -1.0, left: 2.0 })
            .build()
            .unwrap();
        assert_eq!(config.margins, Margins { top: 0.0, right: 5.0, bottom: 0.0, left: 2.0 });
    }

    #[test]
    fn zero_acquisition_timeout_is_rejected() {
        let result = PipelineConfigBuilder::new()
            .worker_acquisition_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn zero_max_uses_is_rejected() {
        let result = PipelineConfigBuilder::new()
            .max_uses_before_recreate(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn fixed_concurrency_resolves_verbatim() {
        assert_eq!(Concurrency::Fixed(7).resolved(), 7);
        assert_eq!(Concurrency::Fixed(0).resolved(), 1);
    }

    #[test]
    fn automatic_concurrency_matches_cpu_count_on_four_or_more_cores() {
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        let resolved = Concurrency::Automatic.resolved();
        if cpus >= 4 {
            assert_eq!(resolved, cpus);
        } else {
            assert_eq!(resolved, cpus.max(1));
        }
        assert!(resolved >= 1);
    }

    #[test]
    fn sequential_naming_is_one_based() {
        let strategy = NamingStrategy::Sequential;
        assert_eq!(strategy.name_for(0), "1");
        assert_eq!(strategy.name_for(9), "10");
    }

    #[test]
    fn builder_chains_all_setters() {
        let config = PipelineConfigBuilder::new()
            .paper_size(PaperSize::LETTER)
            .margins(Margins::uniform(10.0))
            .appearance(Appearance::Dark)
            .concurrency(Concurrency::Fixed(3))
            .create_directories(true)
            .resilient(true)
            .max_uses_before_recreate(10)
            .clear_caches_every(5)
            .build()
            .unwrap();

        assert_eq!(config.paper_size, PaperSize::LETTER);
        assert_eq!(config.margins, Margins::uniform(10.0));
        assert_eq!(config.appearance, Appearance::Dark);
        assert_eq!(config.concurrency, Concurrency::Fixed(3));
        assert!(config.create_directories);
        assert!(config.resilient);
        assert_eq!(config.max_uses_before_recreate, 10);
        assert_eq!(config.clear_caches_every, 5);
    }
}
