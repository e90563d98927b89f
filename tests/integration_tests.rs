//! Integration tests for the resource pool and pipeline configuration.

use html2pdf_api::prelude::*;
use html2pdf_api::worker::MockWorkerFactory;
use std::time::Duration;

/// Test that a pool can be created with default configuration.
#[tokio::test]
async fn test_pool_creation() {
    let result = ResourcePoolBuilder::new()
        .capacity(2)
        .factory(Arc::new(MockWorkerFactory::always_fails("test mode")))
        .build();

    assert!(result.is_ok(), "pool creation should succeed");
}

/// Test that pool stats work correctly before anything is warmed up.
#[tokio::test]
async fn test_pool_stats_before_warmup() {
    let pool = ResourcePoolBuilder::new()
        .capacity(5)
        .factory(Arc::new(MockWorkerFactory::always_fails("test mode")))
        .build()
        .unwrap();

    let stats = pool.stats();

    assert_eq!(stats.available, 0);
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.capacity, 5);
}

/// Test configuration validation.
#[test]
fn test_config_validation() {
    // Zero acquisition timeout should fail.
    let result = PipelineConfigBuilder::new()
        .worker_acquisition_timeout(Duration::ZERO)
        .build();
    assert!(result.is_err());

    // Zero max-uses-before-recreate should fail.
    let result = PipelineConfigBuilder::new()
        .max_uses_before_recreate(0)
        .build();
    assert!(result.is_err());

    // A valid config should succeed.
    let result = PipelineConfigBuilder::new()
        .worker_acquisition_timeout(Duration::from_secs(60))
        .max_uses_before_recreate(2000)
        .build();
    assert!(result.is_ok());
}

/// Test that warmup actually brings the pool up to capacity and that
/// workers are returned to idle on drop.
#[tokio::test]
async fn test_warmup_and_acquire_release_cycle() {
    let pool = ResourcePoolBuilder::new()
        .capacity(2)
        .factory(Arc::new(MockWorkerFactory::new()))
        .build()
        .unwrap();

    pool.warmup().await.unwrap();
    assert_eq!(pool.stats().available, 2);

    let handle = pool.acquire(Duration::from_secs(1)).await.unwrap();
    assert_eq!(pool.stats().in_use, 1);
    drop(handle);

    assert_eq!(pool.stats().available, 2);
    assert_eq!(pool.stats().in_use, 0);
}

/// Test that acquisition against an exhausted pool times out rather than
/// hanging indefinitely.
#[tokio::test]
async fn test_acquire_times_out_when_exhausted() {
    let pool = ResourcePoolBuilder::new()
        .capacity(1)
        .factory(Arc::new(MockWorkerFactory::new()))
        .build()
        .unwrap();
    pool.warmup().await.unwrap();

    let _held = pool.acquire(Duration::from_secs(1)).await.unwrap();

    let result = pool.acquire(Duration::from_millis(50)).await;
    assert!(matches!(result, Err(RenderError::AcquisitionTimeout)));
}
