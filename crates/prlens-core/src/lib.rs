//! Core types, configuration, and error handling for prlens.
//!
//! This crate provides the shared foundation used by the other prlens crates:
//! - [`PrLensError`]: unified error type using `thiserror`
//! - [`PrLensConfig`]: configuration from `.prlens.toml` and the environment
//! - Shared types: [`FileDiff`], [`FileStatus`], [`PrMetadata`],
//!   [`PullSummary`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{GitHubConfig, LlmConfig, PrLensConfig, ServerConfig};
pub use error::PrLensError;
pub use types::{FileDiff, FileStatus, OutputFormat, PrMetadata, PullSummary};

/// A convenience `Result` type for prlens operations.
pub type Result<T> = std::result::Result<T, PrLensError>;
