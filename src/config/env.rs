//! Environment-based configuration loading (feature-gated behind `env-config`).
//!
//! This is a convenience layer on top of [`PipelineConfigBuilder`] — it never
//! replaces the builder, it just reads a handful of `PIPELINE_*` variables
//! (optionally via an `app.env` file, loaded with `dotenvy`) and feeds them
//! into it.
//!
//! # Environment Variables
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `PIPELINE_CONCURRENCY` | usize | automatic | Fixed batch concurrency |
//! | `PIPELINE_MAX_USES_BEFORE_RECREATE` | u64 | 2000 | Worker recycle threshold |
//! | `PIPELINE_CLEAR_CACHES_EVERY` | u64 | 100 | Cache-flush interval |
//! | `PIPELINE_ACQUISITION_TIMEOUT_SECONDS` | u64 | 60 | Worker acquisition timeout |
//! | `PIPELINE_CREATE_DIRECTORIES` | bool | false | Create missing destination dirs |
//! | `CHROME_PATH` | String | auto | Custom Chrome binary path |

use super::*;
use crate::error::RenderError;

/// Default environment file name.
pub const ENV_FILE_NAME: &str = "app.env";

/// Load environment variables from `app.env` file, if present.
pub fn load_env_file() -> std::result::Result<std::path::PathBuf, dotenvy::Error> {
    dotenvy::from_filename(ENV_FILE_NAME)
}

/// Load a [`PipelineConfig`] from environment variables, falling back to
/// [`PipelineConfig::default`] for anything unset or unparseable.
pub fn from_env() -> std::result::Result<PipelineConfig, RenderError> {
    match load_env_file() {
        Ok(path) => log::info!("loaded configuration from: {:?}", path),
        Err(e) => log::debug!(
            "no {} file found or failed to load: {} (using environment variables and defaults)",
            ENV_FILE_NAME,
            e
        ),
    }

    let mut builder = PipelineConfigBuilder::new();

    if let Some(n) = std::env::var("PIPELINE_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        builder = builder.concurrency(Concurrency::Fixed(n));
    }

    if let Some(n) = std::env::var("PIPELINE_MAX_USES_BEFORE_RECREATE")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        builder = builder.max_uses_before_recreate(n);
    }

    if let Some(n) = std::env::var("PIPELINE_CLEAR_CACHES_EVERY")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        builder = builder.clear_caches_every(n);
    }

    if let Some(secs) = std::env::var("PIPELINE_ACQUISITION_TIMEOUT_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        builder = builder.worker_acquisition_timeout(std::time::Duration::from_secs(secs));
    }

    if let Some(create) = std::env::var("PIPELINE_CREATE_DIRECTORIES")
        .ok()
        .and_then(|s| s.parse::<bool>().ok())
    {
        builder = builder.create_directories(create);
    }

    builder.build().map_err(RenderError::Configuration)
}

/// Get the configured Chrome binary path from the environment, if any.
///
/// Call [`from_env`] or [`load_env_file`] first if you rely on `app.env`.
pub fn chrome_path_from_env() -> Option<String> {
    std::env::var("CHROME_PATH").ok()
}
