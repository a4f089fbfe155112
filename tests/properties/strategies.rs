use chain_client_manager::{
	models::ClientManagerConfig,
	utils::{tests::builders::config::ClientManagerConfigBuilder, JitterSetting, RetryConfig},
};
use proptest::prelude::*;
use std::time::Duration;

const MAX_RETRIES: u32 = 10;
const MAX_BACKOFF_MS: u64 = 60_000;

/// An http(s) URL on a generated host and port
pub fn url_strategy() -> impl Strategy<Value = String> {
	(
		prop::sample::select(vec!["http", "https"]),
		"[a-z][a-z0-9-]{0,15}",
		1024u16..65535,
	)
		.prop_map(|(scheme, host, port)| format!("{}://{}:{}", scheme, host, port))
}

/// A retry policy whose initial backoff never exceeds its maximum backoff
pub fn retry_config_strategy() -> impl Strategy<Value = RetryConfig> {
	(
		0..=MAX_RETRIES,
		1u32..=4,
		0..=MAX_BACKOFF_MS,
		any::<bool>(),
	)
		.prop_flat_map(|(max_retries, base, max_backoff_ms, jitter)| {
			(0..=max_backoff_ms).prop_map(move |initial_backoff_ms| RetryConfig {
				max_retries,
				base_for_backoff: base,
				initial_backoff: Duration::from_millis(initial_backoff_ms),
				max_backoff: Duration::from_millis(max_backoff_ms),
				jitter: if jitter {
					JitterSetting::Full
				} else {
					JitterSetting::None
				},
			})
		})
}

/// A safe gas multiplier accepted by the validation rules
pub fn valid_multiplier_strategy() -> impl Strategy<Value = f64> {
	prop_oneof![Just(0.0), 1.0f64..10.0]
}

/// A configuration that passes validation
pub fn client_config_strategy() -> impl Strategy<Value = ClientManagerConfig> {
	(
		url_strategy(),
		prop::option::of(url_strategy()),
		url_strategy(),
		prop::option::of(url_strategy()),
		1u64..=120_000,
		valid_multiplier_strategy(),
		21_000u64..=60_000_000,
		retry_config_strategy(),
		any::<u64>(),
	)
		.prop_filter(
			"fallback must differ from primary",
			|(ec, ec_fallback, bn, bn_fallback, ..)| {
				ec_fallback.as_ref() != Some(ec) && bn_fallback.as_ref() != Some(bn)
			},
		)
		.prop_map(
			|(ec, ec_fallback, bn, bn_fallback, timeout, multiplier, gas_limit, retry, chain_id)| {
				let mut builder = ClientManagerConfigBuilder::new()
					.execution_primary_url(&ec)
					.beacon_primary_url(&bn)
					.chain_id(chain_id)
					.client_timeout_ms(timeout)
					.safe_gas_multiplier(multiplier)
					.block_gas_limit(gas_limit)
					.retry(retry);
				if let Some(url) = ec_fallback {
					builder = builder.execution_fallback_url(&url);
				}
				if let Some(url) = bn_fallback {
					builder = builder.beacon_fallback_url(&url);
				}
				builder.build()
			},
		)
}
