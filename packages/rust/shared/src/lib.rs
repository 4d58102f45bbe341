//! Shared types, error model, and configuration for postcrew.
//!
//! This crate is the foundation depended on by all other postcrew crates.
//! It provides:
//! - [`PostcrewError`]: the unified error type
//! - Domain types ([`GenerationRequest`], [`TaskDescriptor`], [`PostRecord`], ...)
//! - Configuration ([`AppConfig`], config loading, credential lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ImagesConfig, ModelConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, optional_key,
    require_model_key,
};
pub use error::{PostcrewError, Result};
pub use types::{
    Capability, DEFAULT_FOCUS, DateRange, GenerationFailure, GenerationOutcome,
    GenerationRequest, GeneratedPost, PipelineResult, PostId, PostLength, PostRecord, Role,
    SentimentScores, TaskDescriptor, TaskId,
};
