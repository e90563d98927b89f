//! Concurrent access tests for the resource pool and batch scheduler.

use html2pdf_api::prelude::*;
use html2pdf_api::worker::MockWorkerFactory;
use tokio::task::JoinSet;

async fn warmed_pool(capacity: usize) -> ResourcePool {
    let pool = ResourcePoolBuilder::new()
        .capacity(capacity)
        .factory(Arc::new(MockWorkerFactory::new()))
        .build()
        .unwrap();
    pool.warmup().await.unwrap();
    pool
}

/// Test concurrent access to pool stats.
#[tokio::test]
async fn test_concurrent_stats_access() {
    let pool = warmed_pool(5).await;

    let mut tasks = JoinSet::new();

    for _ in 0..10 {
        let pool = pool.clone();
        tasks.spawn(async move {
            for _ in 0..100 {
                let _stats = pool.stats();
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "task should complete without panic");
    }
}

/// Many tasks racing to acquire and release workers never violate the
/// capacity invariant and every task eventually gets served.
#[tokio::test]
async fn test_concurrent_acquire_release_holds_capacity_invariant() {
    let pool = warmed_pool(3).await;

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let pool = pool.clone();
        tasks.spawn(async move {
            let handle = pool
                .acquire(std::time::Duration::from_secs(5))
                .await
                .expect("acquisition should eventually succeed");
            let stats = pool.stats();
            assert!(stats.total_live() <= 3);
            drop(handle);
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "task should complete without panic");
    }

    let stats = pool.stats();
    assert_eq!(stats.available, 3);
    assert_eq!(stats.in_use, 0);
}

/// A batch scheduled across many more documents than pool capacity still
/// delivers every document, proving the refill-on-completion fan-out holds
/// up under contention.
#[tokio::test]
async fn test_batch_scheduler_drains_large_batch_with_small_pool() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(
        PipelineConfigBuilder::new()
            .concurrency(html2pdf_api::config::Concurrency::Fixed(2))
            .build()
            .unwrap(),
    );
    let pool = ResourcePoolBuilder::new()
        .capacity(2)
        .factory(Arc::new(MockWorkerFactory::new()))
        .pipeline_config((*config).clone())
        .build()
        .unwrap();
    pool.warmup().await.unwrap();

    let scheduler = BatchScheduler::new(
        pool,
        Arc::new(CssInjectionCache::new()),
        config,
        Arc::new(NoopMetrics),
    );

    let documents: Vec<Document> = (0..25)
        .map(|i| {
            Document::new(
                b"<html><body>batch</body></html>".to_vec(),
                dir.path().join(format!("{i}.pdf")),
            )
        })
        .collect();

    let mut stream = scheduler.documents(documents);
    let mut indices = Vec::new();
    while let Some(item) = stream.next().await {
        match item.unwrap() {
            ScheduledItem::Rendered(result) => indices.push(result.index),
            ScheduledItem::Failed(failed) => panic!("unexpected failure: {}", failed.error),
        }
    }
    indices.sort_unstable();
    assert_eq!(indices, (0..25).collect::<Vec<_>>());
}
