//! [`DocumentRenderer`]: drives one document through acquisition, load,
//! pagination-mode selection, rendering, and atomic commit.
//!
//! Grounded on the teacher's `generate_pdf_internal`/`acquire_browser` flow
//! in `service/pdf.rs`: acquire a worker, drive it, always release it on the
//! way out, log at the same trace/debug/error levels around the same
//! phases. Like the teacher's synchronous browser calls, the engine-facing
//! half of this runs inside `spawn_blocking` rather than on the async task
//! directly — see the teacher's own doc comments on `generate_pdf_internal`
//! for the same caller contract.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CssInjectionCache, DirectoryCache};
use crate::config::{Appearance, AutomaticHeuristic, PaginationMode, PipelineConfig};
use crate::error::{RenderError, Result};
use crate::metrics::Metrics;
use crate::pdf::{appearance_css, margin_css, Document, PageDimensions, RenderResult};
use crate::pool::{PoolHandle, ResourcePool};

const POINTS_PER_PIXEL: f64 = 72.0 / 96.0;

/// Renders one document end to end and commits it to disk.
///
/// Cheap to clone — shares its pool, caches, config, and metrics backend
/// with every other clone, so one renderer can be handed to each concurrent
/// task in a batch.
#[derive(Clone)]
pub struct DocumentRenderer {
    pool: ResourcePool,
    directory_cache: Arc<DirectoryCache>,
    css_cache: Arc<CssInjectionCache>,
    config: Arc<PipelineConfig>,
    metrics: Arc<dyn Metrics>,
}

impl DocumentRenderer {
    /// Build a renderer sharing the given resources.
    pub fn new(
        pool: ResourcePool,
        directory_cache: Arc<DirectoryCache>,
        css_cache: Arc<CssInjectionCache>,
        config: Arc<PipelineConfig>,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        Self {
            pool,
            directory_cache,
            css_cache,
            config,
            metrics,
        }
    }

    /// Render `document`, writing the result atomically to its destination.
    pub async fn render(&self, document: Document, index: usize) -> Result<RenderResult> {
        let start = Instant::now();

        // Start -> DirectoryOk
        let parent = document
            .destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.directory_cache
            .ensure(&parent, self.config.create_directories)?;

        // DirectoryOk -> Acquired
        let prepared_html = self.prepare_html(&document.html);

        log::trace!("acquiring worker for document {}", index);
        let acquire_start = Instant::now();
        let handle = self
            .pool
            .acquire(self.config.worker_acquisition_timeout)
            .await?;
        self.metrics
            .record_pool_acquisition_time(acquire_start.elapsed());

        let config = Arc::clone(&self.config);
        let metrics = Arc::clone(&self.metrics);
        let destination = document.destination.clone();

        let result = tokio::task::spawn_blocking(move || {
            drive(handle, &prepared_html, &destination, index, &config, &metrics, start)
        })
        .await
        .unwrap_or(Err(RenderError::Cancelled));

        match &result {
            Ok(render_result) => self
                .metrics
                .record_success(start.elapsed(), render_result.chosen_pagination_mode),
            Err(err) => self.metrics.record_failure(start.elapsed(), err),
        }
        result
    }

    fn prepare_html(&self, html: &[u8]) -> Vec<u8> {
        let mut css = margin_css(&self.config.margins);
        let appearance = appearance_css(self.config.appearance);
        if !appearance.is_empty() {
            css.extend_from_slice(&appearance);
        }
        self.css_cache.inject(html, &css).as_ref().clone()
    }
}

/// The synchronous half of a render: drives the worker, commits the result,
/// and parses page geometry back out of it. Runs inside `spawn_blocking`;
/// dropping `handle` at the end of this function releases the worker back
/// to the pool from the blocking thread, matching [`PoolHandle`]'s contract.
fn drive(
    mut handle: PoolHandle,
    html: &[u8],
    destination: &Path,
    index: usize,
    config: &PipelineConfig,
    metrics: &dyn Metrics,
    start: Instant,
) -> Result<RenderResult> {
    // One deadline shared across load, mode selection, and render — the
    // whole of "all phases" per the per-document timeout budget, not a
    // fresh budget per phase.
    let deadline = config.document_timeout.map(|timeout| Instant::now() + timeout);

    // Acquired -> Loaded
    let engine_start = Instant::now();
    load_with_timeout(&mut handle, html, config, deadline)?;

    // Loaded -> ModeChosen
    let chosen_mode = choose_pagination_mode(&mut handle, config, deadline)?;

    // ModeChosen -> Rendered
    let bytes = render_with_timeout(&mut handle, chosen_mode, config, deadline)?;
    metrics.record_webengine_time(engine_start.elapsed());

    // Rendered -> Committed
    let conversion_start = Instant::now();
    commit_atomically(destination, &bytes)?;
    metrics.record_data_conversion_time(conversion_start.elapsed());

    // Committed -> Done
    let (page_count, page_dimensions) = parse_pdf_pages(&bytes, config.paper_size);

    Ok(RenderResult {
        url: destination.to_path_buf(),
        index,
        duration: start.elapsed(),
        chosen_pagination_mode: chosen_mode,
        page_count,
        page_dimensions,
    })
}

fn load_with_timeout(
    handle: &mut PoolHandle,
    html: &[u8],
    config: &PipelineConfig,
    deadline: Option<Instant>,
) -> Result<()> {
    let base_url = config.base_url.as_deref();
    run_within_deadline(deadline, || handle.load(html, base_url))
}

fn choose_pagination_mode(
    handle: &mut PoolHandle,
    config: &PipelineConfig,
    deadline: Option<Instant>,
) -> Result<PaginationMode> {
    run_within_deadline(deadline, || match config.pagination_mode {
        PaginationMode::Continuous => Ok(PaginationMode::Continuous),
        PaginationMode::Paginated => Ok(PaginationMode::Paginated),
        PaginationMode::Automatic(AutomaticHeuristic::PreferSpeed) => Ok(PaginationMode::Continuous),
        PaginationMode::Automatic(AutomaticHeuristic::PreferPrintReady) => Ok(PaginationMode::Paginated),
        PaginationMode::Automatic(AutomaticHeuristic::ContentLength(threshold)) => {
            let height_px = handle.query_content_height()?;
            let height_pt = height_px * POINTS_PER_PIXEL;
            let page_height = config.paper_size.height - (config.margins.top + config.margins.bottom);
            let paginated = page_height > 0.0 && height_pt / page_height > threshold;
            Ok(resolved_mode(paginated))
        }
        PaginationMode::Automatic(AutomaticHeuristic::HtmlStructure) => {
            let has_print_media = handle.query_has_print_media()?;
            let has_page_break = handle.query_has_page_break_style()?;
            Ok(resolved_mode(has_print_media || has_page_break))
        }
    })
}

fn render_with_timeout(
    handle: &mut PoolHandle,
    mode: PaginationMode,
    config: &PipelineConfig,
    deadline: Option<Instant>,
) -> Result<Vec<u8>> {
    let paper_size = config.paper_size;
    let margins = config.margins;
    run_within_deadline(deadline, || match mode {
        PaginationMode::Paginated => handle.render_paginated(paper_size, margins),
        _ => handle.render_single_page(paper_size),
    })
}

fn resolved_mode(paginated: bool) -> PaginationMode {
    if paginated {
        PaginationMode::Paginated
    } else {
        PaginationMode::Continuous
    }
}

/// Run a synchronous, thread-affine operation against a shared deadline.
///
/// Bails out before even calling `f` if the deadline has already passed —
/// this is what lets one phase's overrun cut the rest of the pipeline short
/// instead of each phase getting its own fresh budget. The underlying engine
/// call is blocking by contract, so it can't be cancelled mid-flight; if `f`
/// itself runs past the deadline, that's caught on return instead.
fn run_within_deadline<T>(deadline: Option<Instant>, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let Some(deadline) = deadline else {
        return f();
    };

    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(RenderError::DocumentTimeout);
    }

    let result = f();
    if Instant::now() >= deadline {
        return Err(RenderError::DocumentTimeout);
    }
    result
}

/// Write `bytes` to a sibling temporary file, then atomically rename it into
/// place, so a crash mid-write never leaves a partial file at `destination`.
fn commit_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_name = format!(
        ".{}.{}.tmp",
        destination
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("output"),
        uuid::Uuid::new_v4()
    );
    let tmp_path: PathBuf = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(tmp_name);

    std::fs::write(&tmp_path, bytes).map_err(RenderError::CommitFailed)?;

    std::fs::rename(&tmp_path, destination).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        RenderError::CommitFailed(e)
    })?;

    Ok(())
}

/// Extract page count and per-page media-box dimensions from rendered PDF
/// bytes. Falls back to `(1, [paper_size])` if the bytes don't parse.
fn parse_pdf_pages(bytes: &[u8], paper_size: crate::config::PaperSize) -> (usize, Vec<PageDimensions>) {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => {
            let pages = doc.get_pages();
            if pages.is_empty() {
                return fallback(paper_size);
            }
            let mut dimensions = Vec::with_capacity(pages.len());
            for (_page_num, object_id) in pages.iter() {
                let dims = media_box_dimensions(&doc, *object_id).unwrap_or(PageDimensions {
                    width: paper_size.width,
                    height: paper_size.height,
                });
                dimensions.push(dims);
            }
            (dimensions.len(), dimensions)
        }
        Err(_) => fallback(paper_size),
    }
}

fn fallback(paper_size: crate::config::PaperSize) -> (usize, Vec<PageDimensions>) {
    (
        1,
        vec![PageDimensions {
            width: paper_size.width,
            height: paper_size.height,
        }],
    )
}

fn media_box_dimensions(doc: &lopdf::Document, object_id: lopdf::ObjectId) -> Option<PageDimensions> {
    let page = doc.get_object(object_id).ok()?.as_dict().ok()?;
    let media_box = page
        .get(b"MediaBox")
        .ok()
        .and_then(|obj| doc.dereference(obj).ok())
        .and_then(|(_, obj)| obj.as_array().ok().cloned())?;
    if media_box.len() != 4 {
        return None;
    }
    let values: Vec<f64> = media_box
        .iter()
        .filter_map(|obj| {
            obj.as_float()
                .ok()
                .map(|v| v as f64)
                .or_else(|| obj.as_i64().ok().map(|v| v as f64))
        })
        .collect();
    if values.len() != 4 {
        return None;
    }
    Some(PageDimensions {
        width: (values[2] - values[0]).abs(),
        height: (values[3] - values[1]).abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Margins, PaperSize, PipelineConfigBuilder};
    use crate::metrics::NoopMetrics;
    use crate::pool::ResourcePoolBuilder;
    use crate::worker::MockWorkerFactory;

    async fn test_pool(factory: MockWorkerFactory) -> ResourcePool {
        let pool = ResourcePoolBuilder::new()
            .capacity(1)
            .factory(Arc::new(factory))
            .build()
            .unwrap();
        pool.warmup().await.unwrap();
        pool
    }

    fn renderer(pool: ResourcePool, config: PipelineConfig) -> DocumentRenderer {
        DocumentRenderer::new(
            pool,
            Arc::new(DirectoryCache::new()),
            Arc::new(CssInjectionCache::new()),
            Arc::new(config),
            Arc::new(NoopMetrics),
        )
    }

    #[tokio::test]
    async fn renders_and_commits_a_simple_document() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");

        let pool = test_pool(MockWorkerFactory::new()).await;
        let renderer = renderer(pool, PipelineConfigBuilder::new().build().unwrap());

        let document = Document::new(b"<html><body>hi</body></html>".to_vec(), destination.clone());
        let result = renderer.render(document, 0).await.unwrap();

        assert_eq!(result.index, 0);
        assert_eq!(result.url, destination);
        assert!(destination.exists());
        assert_eq!(result.page_count, 1);
    }

    #[tokio::test]
    async fn automatic_content_length_selects_paginated_for_tall_documents() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");

        let factory = MockWorkerFactory::new().with_content_height(1_000_000.0);
        let pool = test_pool(factory).await;
        let config = PipelineConfigBuilder::new()
            .pagination_mode(PaginationMode::Automatic(AutomaticHeuristic::ContentLength(1.5)))
            .margins(Margins::uniform(36.0))
            .paper_size(PaperSize::A4)
            .build()
            .unwrap();
        let renderer = renderer(pool, config);

        let document = Document::new(b"<html><body>hi</body></html>".to_vec(), destination);
        let result = renderer.render(document, 0).await.unwrap();

        assert_eq!(result.chosen_pagination_mode, PaginationMode::Paginated);
    }

    #[tokio::test]
    async fn automatic_html_structure_selects_paginated_when_print_media_present() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");

        let factory = MockWorkerFactory::new().with_print_media(true);
        let pool = test_pool(factory).await;
        let config = PipelineConfigBuilder::new()
            .pagination_mode(PaginationMode::Automatic(AutomaticHeuristic::HtmlStructure))
            .build()
            .unwrap();
        let renderer = renderer(pool, config);

        let document = Document::new(b"<html><body>hi</body></html>".to_vec(), destination);
        let result = renderer.render(document, 0).await.unwrap();

        assert_eq!(result.chosen_pagination_mode, PaginationMode::Paginated);
    }

    #[tokio::test]
    async fn missing_directory_without_create_flag_fails() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing").join("out.pdf");

        let pool = test_pool(MockWorkerFactory::new()).await;
        let renderer = renderer(pool, PipelineConfigBuilder::new().build().unwrap());

        let document = Document::new(b"<html></html>".to_vec(), destination);
        let result = renderer.render(document, 0).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn one_nanosecond_document_timeout_yields_document_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");

        let pool = test_pool(MockWorkerFactory::new()).await;
        let config = PipelineConfigBuilder::new()
            .document_timeout(Duration::from_nanos(1))
            .build()
            .unwrap();
        let renderer = renderer(pool, config);

        let document = Document::new(b"<html><body>hi</body></html>".to_vec(), destination);
        let result = renderer.render(document, 0).await;
        assert!(matches!(result, Err(RenderError::DocumentTimeout)));
    }

    #[tokio::test]
    async fn empty_html_is_rejected_as_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");

        let pool = test_pool(MockWorkerFactory::new()).await;
        let renderer = renderer(pool, PipelineConfigBuilder::new().build().unwrap());

        let document = Document::new(Vec::new(), destination);
        let result = renderer.render(document, 0).await;
        assert!(matches!(result, Err(RenderError::InvalidHtml(_))));
    }
}
