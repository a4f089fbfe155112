//! Configuration loading and validation.
//!
//! This module provides the loader trait and the client manager configuration it loads.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::path::Path;

mod client_config;
mod error;

pub use client_config::{
	BeaconClientConfig, ClientManagerConfig, ExecutionClientConfig, DEFAULT_BLOCK_GAS_LIMIT,
	DEFAULT_CLIENT_TIMEOUT_MS, DEFAULT_SAFE_GAS_MULTIPLIER,
};
pub use error::ConfigError;

/// Common interface for loading configuration files
#[async_trait]
pub trait ConfigLoader: Sized {
	/// Load configuration from a specific file path
	async fn load_from_path(path: &Path) -> Result<Self, error::ConfigError>;

	/// Apply values from the process environment (and a `.env` file, if present) on top of the
	/// values read from disk
	fn apply_env_overrides(self) -> Self;

	/// Validate the configuration
	///
	/// Returns Ok(()) if valid, or an error message if invalid.
	fn validate(&self) -> Result<(), error::ConfigError>;

	/// Check if a file is a JSON file based on extension
	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}
}
