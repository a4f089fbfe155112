//! HTTP client construction shared by the JSON-RPC and Beacon REST transports.
//!
//! Every endpoint gets its own `reqwest` client, wrapped in a retry middleware that re-sends
//! requests failing with transient errors. Retries stay on the same endpoint; switching to the
//! fallback endpoint is the job of the client managers.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
	policies::ExponentialBackoff, Jitter, RetryTransientMiddleware, RetryableStrategy,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest time spent establishing a connection, whatever the request timeout
pub const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

fn default_max_attempts() -> u32 {
	3
}

fn default_initial_backoff() -> Duration {
	Duration::from_millis(250)
}

fn default_max_backoff() -> Duration {
	Duration::from_secs(10)
}

fn default_base_for_backoff() -> u32 {
	2
}

/// Serializable setting for jitter in retry policies
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
	/// No jitter applied to the backoff duration
	None,
	/// Full jitter applied, randomizing the backoff duration
	#[default]
	Full,
}

/// Retry policy for transient failures of a single endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
	/// Maximum number of retries for transient errors
	#[serde(default = "default_max_attempts")]
	pub max_retries: u32,
	/// Base of the exponential backoff
	#[serde(default = "default_base_for_backoff")]
	pub base_for_backoff: u32,
	/// Backoff before the first retry
	#[serde(default = "default_initial_backoff")]
	pub initial_backoff: Duration,
	/// Upper bound of any backoff
	#[serde(default = "default_max_backoff")]
	pub max_backoff: Duration,
	#[serde(default)]
	pub jitter: JitterSetting,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: default_max_attempts(),
			base_for_backoff: default_base_for_backoff(),
			initial_backoff: default_initial_backoff(),
			max_backoff: default_max_backoff(),
			jitter: JitterSetting::default(),
		}
	}
}

impl RetryConfig {
	/// A policy that never retries
	pub fn disabled() -> Self {
		Self {
			max_retries: 0,
			..Default::default()
		}
	}

	/// Checks that the backoff bounds are consistent
	pub fn validate(&self) -> Result<(), String> {
		if self.base_for_backoff == 0 {
			return Err("base_for_backoff must be at least 1".to_string());
		}
		if self.initial_backoff > self.max_backoff {
			return Err(format!(
				"initial_backoff ({:?}) must not exceed max_backoff ({:?})",
				self.initial_backoff, self.max_backoff
			));
		}
		Ok(())
	}

	/// The exponential backoff policy described by this configuration
	pub fn backoff_policy(&self) -> ExponentialBackoff {
		let jitter = match self.jitter {
			JitterSetting::None => Jitter::None,
			JitterSetting::Full => Jitter::Full,
		};
		ExponentialBackoff::builder()
			.jitter(jitter)
			.base(self.base_for_backoff)
			.retry_bounds(self.initial_backoff, self.max_backoff)
			.build_with_max_retries(self.max_retries)
	}
}

/// Creates the pooled base client of one endpoint
///
/// `timeout` bounds the whole request; the connect phase is additionally capped at
/// [`MAX_CONNECT_TIMEOUT`].
pub fn create_base_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
	reqwest::ClientBuilder::new()
		.pool_idle_timeout(Duration::from_secs(90))
		.pool_max_idle_per_host(32)
		.timeout(timeout)
		.connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
		.build()
}

/// Wraps `base_client` in the retry middleware
///
/// `custom_strategy` decides which failures are transient; without it the default
/// `reqwest-retry` classification is used.
pub fn create_retryable_http_client<S>(
	config: &RetryConfig,
	base_client: reqwest::Client,
	custom_strategy: Option<S>,
) -> ClientWithMiddleware
where
	S: RetryableStrategy + Send + Sync + 'static,
{
	let retry_policy = config.backoff_policy();
	match custom_strategy {
		Some(strategy) => ClientBuilder::new(base_client).with(
			RetryTransientMiddleware::new_with_policy_and_strategy(retry_policy, strategy),
		),
		None => ClientBuilder::new(base_client)
			.with(RetryTransientMiddleware::new_with_policy(retry_policy)),
	}
	.build()
}
