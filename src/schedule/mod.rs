//! [`BatchScheduler`]: bounded-concurrency streaming dispatch over a batch of
//! documents.
//!
//! Grounded on the teacher's `tokio::task::JoinSet` fan-out-and-join idiom
//! (already used in `tests/concurrent_tests.rs`), combined with a bounded
//! `tokio::sync::mpsc` channel so a slow consumer applies backpressure to
//! the scheduler instead of the scheduler buffering unboundedly.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::cache::{CssInjectionCache, DirectoryCache};
use crate::config::PipelineConfig;
use crate::error::{RenderError, Result};
use crate::metrics::Metrics;
use crate::pdf::{Document, FailedDocument, RenderResult};
use crate::pool::ResourcePool;
use crate::render::DocumentRenderer;

/// Channel depth for the result stream. Bounds how far the scheduler can run
/// ahead of a consumer that isn't draining the stream.
const RESULT_CHANNEL_CAPACITY: usize = 32;

/// One item yielded from [`BatchScheduler::documents`].
///
/// In fail-fast mode (the default) only [`Rendered`](ScheduledItem::Rendered)
/// is ever yielded — any failure terminates the stream via
/// [`BatchStream::next`]'s `Err` arm instead. In resilient mode, a per-document
/// failure is yielded as [`Failed`](ScheduledItem::Failed) and the batch
/// keeps going.
#[derive(Debug)]
pub enum ScheduledItem {
    /// A document rendered and committed successfully.
    Rendered(RenderResult),
    /// A document failed; only produced when [`PipelineConfig::resilient`] is set.
    Failed(FailedDocument),
}

/// Dispatches a batch of documents at bounded concurrency and streams
/// results back in completion order.
#[derive(Clone)]
pub struct BatchScheduler {
    pool: ResourcePool,
    css_cache: Arc<CssInjectionCache>,
    config: Arc<PipelineConfig>,
    metrics: Arc<dyn Metrics>,
}

impl BatchScheduler {
    /// Build a scheduler sharing the given pool, CSS cache, configuration,
    /// and metrics backend across every batch it runs.
    pub fn new(
        pool: ResourcePool,
        css_cache: Arc<CssInjectionCache>,
        config: Arc<PipelineConfig>,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        Self {
            pool,
            css_cache,
            config,
            metrics,
        }
    }

    /// Render `documents`, starting `config.concurrency.resolved()` of them
    /// concurrently and yielding each as it completes.
    ///
    /// A fresh [`DirectoryCache`] is created for this call and cleared when
    /// the batch ends (see the crate's documented choice to scope it per
    /// batch rather than process-wide).
    pub fn documents(&self, documents: Vec<Document>) -> BatchStream {
        let directory_cache = Arc::new(DirectoryCache::new());
        let renderer = DocumentRenderer::new(
            self.pool.clone(),
            Arc::clone(&directory_cache),
            Arc::clone(&self.css_cache),
            Arc::clone(&self.config),
            Arc::clone(&self.metrics),
        );

        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let concurrency = self.config.concurrency.resolved();
        let resilient = self.config.resilient;
        let batch_timeout = self.config.batch_timeout;

        tokio::spawn(run_batch(
            documents,
            renderer,
            directory_cache,
            tx,
            concurrency,
            resilient,
            batch_timeout,
        ));

        BatchStream { rx }
    }
}

async fn run_batch(
    documents: Vec<Document>,
    renderer: DocumentRenderer,
    directory_cache: Arc<DirectoryCache>,
    tx: mpsc::Sender<Result<ScheduledItem>>,
    concurrency: usize,
    resilient: bool,
    batch_timeout: Option<std::time::Duration>,
) {
    let dispatch = dispatch_loop(documents, renderer, tx.clone(), concurrency, resilient);

    let outcome = match batch_timeout {
        Some(timeout) => tokio::time::timeout(timeout, dispatch).await,
        None => Ok(dispatch.await),
    };

    if outcome.is_err() {
        let _ = tx.send(Err(RenderError::BatchTimeout)).await;
    }

    directory_cache.clear();
}

async fn dispatch_loop(
    documents: Vec<Document>,
    renderer: DocumentRenderer,
    tx: mpsc::Sender<Result<ScheduledItem>>,
    concurrency: usize,
    resilient: bool,
) {
    let total = documents.len();
    let mut documents: Vec<Option<Document>> = documents.into_iter().map(Some).collect();
    type TaskOutput = (usize, Document, std::result::Result<RenderResult, RenderError>, std::time::Duration);
    let mut tasks: JoinSet<TaskOutput> = JoinSet::new();

    fn spawn_one(index: usize, document: Document, renderer: &DocumentRenderer, tasks: &mut JoinSet<TaskOutput>) {
        let renderer = renderer.clone();
        let document_for_failure = document.clone();
        tasks.spawn(async move {
            let start = Instant::now();
            let result = renderer.render(document, index).await;
            (index, document_for_failure, result, start.elapsed())
        });
    }

    for index in 0..concurrency.min(total) {
        let document = documents[index].take().expect("each index spawned once");
        spawn_one(index, document, &renderer, &mut tasks);
    }
    let mut next_index = concurrency.min(total);

    while let Some(joined) = tasks.join_next().await {
        let (index, document_for_failure, result, duration) = match joined {
            Ok(value) => value,
            Err(join_error) => {
                log::error!("render task panicked: {}", join_error);
                let _ = tx.send(Err(RenderError::NoResultProduced)).await;
                tasks.abort_all();
                return;
            }
        };

        match result {
            Ok(rendered) => {
                if tx.send(Ok(ScheduledItem::Rendered(rendered))).await.is_err() {
                    tasks.abort_all();
                    return;
                }
            }
            Err(error) if resilient => {
                log::warn!("document {} failed in resilient mode: {}", index, error);
                let failed = FailedDocument {
                    document: document_for_failure,
                    index,
                    error,
                    duration,
                };
                if tx.send(Ok(ScheduledItem::Failed(failed))).await.is_err() {
                    tasks.abort_all();
                    return;
                }
            }
            Err(error) => {
                log::error!("document {} failed, aborting batch: {}", index, error);
                let _ = tx.send(Err(error)).await;
                tasks.abort_all();
                return;
            }
        }

        if next_index < total {
            let index = next_index;
            next_index += 1;
            let document = documents[index].take().expect("each index spawned once");
            spawn_one(index, document, &renderer, &mut tasks);
        }
    }
}

/// Streams [`ScheduledItem`]s from a running batch.
///
/// Not a `futures::Stream` — this crate doesn't otherwise depend on the
/// `futures` ecosystem, so this exposes the same shape as a plain async
/// iterator via [`next`](Self::next) instead of pulling in that trait for
/// one call site.
pub struct BatchStream {
    rx: mpsc::Receiver<Result<ScheduledItem>>,
}

impl BatchStream {
    /// Await the next item. Returns `None` once the batch has finished
    /// (successfully or otherwise) and every result has been drained.
    pub async fn next(&mut self) -> Option<Result<ScheduledItem>> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use crate::metrics::NoopMetrics;
    use crate::pool::ResourcePoolBuilder;
    use crate::worker::MockWorkerFactory;

    async fn scheduler(factory: MockWorkerFactory, config: PipelineConfig) -> (BatchScheduler, tempfile::TempDir) {
        let pool = ResourcePoolBuilder::new()
            .capacity(config.concurrency.resolved().max(1))
            .factory(Arc::new(factory))
            .build()
            .unwrap();
        pool.warmup().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        (
            BatchScheduler::new(
                pool,
                Arc::new(CssInjectionCache::new()),
                Arc::new(config),
                Arc::new(NoopMetrics),
            ),
            dir,
        )
    }

    fn documents_in(dir: &tempfile::TempDir, n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document::new(b"<html><body>x</body></html>".to_vec(), dir.path().join(format!("{i}.pdf"))))
            .collect()
    }

    #[tokio::test]
    async fn renders_every_document_in_a_small_batch() {
        let config = PipelineConfigBuilder::new()
            .concurrency(crate::config::Concurrency::Fixed(2))
            .build()
            .unwrap();
        let (scheduler, dir) = scheduler(MockWorkerFactory::new(), config).await;
        let documents = documents_in(&dir, 5);

        let mut stream = scheduler.documents(documents);
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            match item.unwrap() {
                ScheduledItem::Rendered(result) => seen.push(result.index),
                ScheduledItem::Failed(_) => panic!("unexpected failure"),
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn fail_fast_aborts_remaining_on_first_error() {
        let config = PipelineConfigBuilder::new()
            .concurrency(crate::config::Concurrency::Fixed(1))
            .build()
            .unwrap();
        let (scheduler, dir) = scheduler(MockWorkerFactory::always_fails("boom"), config).await;
        let documents = documents_in(&dir, 3);

        let mut stream = scheduler.documents(documents);
        let first = stream.next().await.unwrap();
        assert!(first.is_err());
    }

    #[tokio::test]
    async fn resilient_mode_yields_failures_instead_of_aborting() {
        let config = PipelineConfigBuilder::new()
            .concurrency(crate::config::Concurrency::Fixed(2))
            .resilient(true)
            .build()
            .unwrap();
        let (scheduler, dir) = scheduler(MockWorkerFactory::always_fails("boom"), config).await;
        let documents = documents_in(&dir, 3);

        let mut stream = scheduler.documents(documents);
        let mut failures = 0;
        while let Some(item) = stream.next().await {
            match item.unwrap() {
                ScheduledItem::Failed(_) => failures += 1,
                ScheduledItem::Rendered(_) => panic!("expected failures from an always-failing factory"),
            }
        }
        assert_eq!(failures, 3);
    }
}
