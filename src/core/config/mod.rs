//! Configuration management for the pipeline.
//!
//! This module provides configuration types, validation traits, and utilities
//! for managing conditioning and recognition settings.

pub mod errors;
pub mod parallel;
pub mod pipeline;

// Re-export commonly used types
pub use errors::{ConfigError, ConfigValidator};
pub use parallel::ParallelPolicy;
pub use pipeline::{
    ConditioningConfig, DEFAULT_UPSCALE_TARGET, PageSegmentation, PipelineConfig,
    RecognitionParams,
};
