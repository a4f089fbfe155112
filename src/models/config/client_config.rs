//! Client manager configuration loading and validation.
//!
//! A single JSON file describes both endpoint pairs and the tuning knobs of the query and
//! transaction managers. Endpoint URLs can be overridden through the environment:
//! `EC_PRIMARY_URL`, `EC_FALLBACK_URL`, `BN_PRIMARY_URL` and `BN_FALLBACK_URL`.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use crate::{
	models::{config::error::ConfigError, ConfigLoader},
	utils::RetryConfig,
};

/// Default timeout for a single request against an endpoint
pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 30_000;
/// Gas limit of a mainnet block
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 30_000_000;
/// Default inflation applied to gas estimates
pub const DEFAULT_SAFE_GAS_MULTIPLIER: f64 = 1.5;

fn default_client_timeout_ms() -> u64 {
	DEFAULT_CLIENT_TIMEOUT_MS
}

fn default_block_gas_limit() -> u64 {
	DEFAULT_BLOCK_GAS_LIMIT
}

fn default_safe_gas_multiplier() -> f64 {
	DEFAULT_SAFE_GAS_MULTIPLIER
}

fn default_concurrent_call_limit() -> i64 {
	std::thread::available_parallelism()
		.map(|n| n.get() as i64)
		.unwrap_or(1)
}

/// Execution client endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExecutionClientConfig {
	/// Primary JSON-RPC endpoint
	pub primary_url: String,
	/// Optional fallback JSON-RPC endpoint
	#[serde(default)]
	pub fallback_url: Option<String>,
	/// Chain both endpoints are expected to serve
	pub chain_id: u64,
}

/// Beacon node endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BeaconClientConfig {
	/// Primary REST endpoint
	pub primary_url: String,
	/// Optional fallback REST endpoint
	#[serde(default)]
	pub fallback_url: Option<String>,
	/// Treat both endpoints as synced without probing them
	#[serde(default)]
	pub ignore_sync_check: bool,
}

/// Configuration of the execution/beacon client managers and the services built on them
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClientManagerConfig {
	pub execution: ExecutionClientConfig,

	pub beacon: BeaconClientConfig,

	/// Per-request timeout in milliseconds
	#[serde(default = "default_client_timeout_ms")]
	pub client_timeout_ms: u64,

	/// Deployed Multicall3 contract used by the query manager
	pub multicall_address: Address,

	/// Maximum number of multicall windows in flight; zero or negative means unbounded
	#[serde(default = "default_concurrent_call_limit")]
	pub concurrent_call_limit: i64,

	/// Gas added on top of the inflated estimate
	#[serde(default)]
	pub safe_gas_buffer: u64,

	/// Factor applied to gas estimates; 0 disables inflation, otherwise it must be at least 1
	#[serde(default = "default_safe_gas_multiplier")]
	pub safe_gas_multiplier: f64,

	/// Upper bound for any transaction's gas limit
	#[serde(default = "default_block_gas_limit")]
	pub block_gas_limit: u64,

	/// Retry policy for transient HTTP failures
	#[serde(default)]
	pub retry: RetryConfig,
}

impl ClientManagerConfig {
	pub fn client_timeout(&self) -> Duration {
		Duration::from_millis(self.client_timeout_ms)
	}
}

/// Endpoint override variables and the field each one replaces
static ENDPOINT_OVERRIDES: [(&str, &str); 4] = [
	("EC_PRIMARY_URL", "execution.primary_url"),
	("EC_FALLBACK_URL", "execution.fallback_url"),
	("BN_PRIMARY_URL", "beacon.primary_url"),
	("BN_FALLBACK_URL", "beacon.fallback_url"),
];

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
	let parsed = url::Url::parse(value).map_err(|e| {
		ConfigError::invalid_field(
			field,
			format!("{} is not a valid URL: {}", field, e),
			Some(Box::new(e)),
		)
	})?;
	if !matches!(parsed.scheme(), "http" | "https") {
		return Err(ConfigError::invalid_field(
			field,
			format!("{} must use http or https, got {}", field, parsed.scheme()),
			None,
		));
	}
	Ok(())
}

fn validate_pair(
	section: &str,
	label: &str,
	primary_url: &str,
	fallback_url: Option<&String>,
) -> Result<(), ConfigError> {
	validate_url(&format!("{}.primary_url", section), primary_url)?;
	if let Some(fallback) = fallback_url {
		let field = format!("{}.fallback_url", section);
		validate_url(&field, fallback)?;
		if fallback.trim_end_matches('/') == primary_url.trim_end_matches('/') {
			return Err(ConfigError::invalid_field(
				&field,
				format!("{} fallback URL must differ from the primary URL", label),
				None,
			));
		}
	}
	Ok(())
}

fn env_override(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Tags a validation failure with the override variable that set the rejected field, if any.
fn attribute_to_env(err: ConfigError) -> ConfigError {
	let var = err.field().and_then(|field| {
		ENDPOINT_OVERRIDES
			.iter()
			.find(|(_, overridden)| *overridden == field)
			.map(|(var, _)| *var)
	});
	match var {
		Some(var) if env_override(var).is_some() => err.with_env_var(var),
		_ => err,
	}
}

#[async_trait]
impl ConfigLoader for ClientManagerConfig {
	/// Load the configuration from a JSON file
	///
	/// Environment overrides are applied before the result is validated.
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		if !Self::is_json_file(path) {
			return Err(ConfigError::file_error(
				path,
				"client config must be a JSON file",
				None,
			));
		}

		let file = std::fs::File::open(path).map_err(|e| {
			ConfigError::file_error(
				path,
				format!("failed to open client config file: {}", e),
				Some(Box::new(e)),
			)
		})?;
		let config: ClientManagerConfig =
			serde_json::from_reader(file).map_err(|e| ConfigError::parse_error(path, e))?;

		let config = config.apply_env_overrides();
		config.validate().map_err(attribute_to_env)?;

		Ok(config)
	}

	fn apply_env_overrides(mut self) -> Self {
		dotenvy::dotenv().ok();

		for (var, field) in ENDPOINT_OVERRIDES.iter() {
			let Some(url) = env_override(var) else {
				continue;
			};
			tracing::debug!(var, field, "endpoint overridden from the environment");
			match *field {
				"execution.primary_url" => self.execution.primary_url = url,
				"execution.fallback_url" => self.execution.fallback_url = Some(url),
				"beacon.primary_url" => self.beacon.primary_url = url,
				_ => self.beacon.fallback_url = Some(url),
			}
		}
		self
	}

	/// Validate the client configuration
	///
	/// Ensures that:
	/// - Every endpoint URL parses and uses http(s)
	/// - A fallback never points at its own primary
	/// - The gas multiplier is either disabled (0) or at least 1
	/// - The request timeout and block gas limit are non-zero
	/// - The retry backoff bounds are consistent
	fn validate(&self) -> Result<(), ConfigError> {
		validate_pair(
			"execution",
			"Execution client",
			&self.execution.primary_url,
			self.execution.fallback_url.as_ref(),
		)?;
		validate_pair(
			"beacon",
			"Beacon node",
			&self.beacon.primary_url,
			self.beacon.fallback_url.as_ref(),
		)?;

		if self.client_timeout_ms == 0 {
			return Err(ConfigError::invalid_field(
				"client_timeout_ms",
				"client_timeout_ms must be greater than 0",
				None,
			));
		}

		if !self.safe_gas_multiplier.is_finite()
			|| (self.safe_gas_multiplier != 0.0 && self.safe_gas_multiplier < 1.0)
		{
			return Err(ConfigError::invalid_field(
				"safe_gas_multiplier",
				format!(
					"safe_gas_multiplier must be 0 (disabled) or at least 1, got {}",
					self.safe_gas_multiplier
				),
				None,
			));
		}

		if self.block_gas_limit == 0 {
			return Err(ConfigError::invalid_field(
				"block_gas_limit",
				"block_gas_limit must be greater than 0",
				None,
			));
		}

		self.retry.validate().map_err(|reason| {
			ConfigError::invalid_field("retry", format!("invalid retry policy: {}", reason), None)
		})?;

		if self.multicall_address == Address::ZERO {
			tracing::warn!("multicall_address is the zero address, queries will fail");
		}

		Ok(())
	}
}
