//! Configuration for pipeline behavior, paper geometry, and limits.
//!
//! See [`PipelineConfig`] and [`PipelineConfigBuilder`] for the main entry
//! points, and [`mod@env`] (behind the `env-config` feature) for loading a
//! configuration from the environment.

mod pipeline;
pub use pipeline::{
    Appearance, AutomaticHeuristic, Concurrency, Margins, NamingStrategy, PaginationMode,
    PaperSize, PipelineConfig, PipelineConfigBuilder,
};

#[cfg(feature = "env-config")]
pub mod env;
