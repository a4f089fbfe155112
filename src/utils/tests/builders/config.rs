//! Test helper utilities for client manager configuration
//!
//! - `ClientManagerConfigBuilder`: Builder for creating test ClientManagerConfig instances

use alloy::primitives::{address, Address};

use crate::{
	models::{BeaconClientConfig, ClientManagerConfig, ExecutionClientConfig},
	utils::RetryConfig,
};

/// Address Multicall3 is deployed at on most chains
pub const TEST_MULTICALL_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Builder for creating test ClientManagerConfig instances
pub struct ClientManagerConfigBuilder {
	config: ClientManagerConfig,
}

impl Default for ClientManagerConfigBuilder {
	fn default() -> Self {
		Self {
			config: ClientManagerConfig {
				execution: ExecutionClientConfig {
					primary_url: "http://localhost:8545".to_string(),
					fallback_url: None,
					chain_id: 1,
				},
				beacon: BeaconClientConfig {
					primary_url: "http://localhost:5052".to_string(),
					fallback_url: None,
					ignore_sync_check: false,
				},
				client_timeout_ms: 5_000,
				multicall_address: TEST_MULTICALL_ADDRESS,
				concurrent_call_limit: 4,
				safe_gas_buffer: 0,
				safe_gas_multiplier: 1.5,
				block_gas_limit: 30_000_000,
				retry: RetryConfig {
					max_retries: 0,
					..RetryConfig::default()
				},
			},
		}
	}
}

impl ClientManagerConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn execution_primary_url(mut self, url: &str) -> Self {
		self.config.execution.primary_url = url.to_string();
		self
	}

	pub fn execution_fallback_url(mut self, url: &str) -> Self {
		self.config.execution.fallback_url = Some(url.to_string());
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.config.execution.chain_id = chain_id;
		self
	}

	pub fn beacon_primary_url(mut self, url: &str) -> Self {
		self.config.beacon.primary_url = url.to_string();
		self
	}

	pub fn beacon_fallback_url(mut self, url: &str) -> Self {
		self.config.beacon.fallback_url = Some(url.to_string());
		self
	}

	pub fn ignore_sync_check(mut self, ignore: bool) -> Self {
		self.config.beacon.ignore_sync_check = ignore;
		self
	}

	pub fn client_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.config.client_timeout_ms = timeout_ms;
		self
	}

	pub fn multicall_address(mut self, address: Address) -> Self {
		self.config.multicall_address = address;
		self
	}

	pub fn concurrent_call_limit(mut self, limit: i64) -> Self {
		self.config.concurrent_call_limit = limit;
		self
	}

	pub fn safe_gas_buffer(mut self, buffer: u64) -> Self {
		self.config.safe_gas_buffer = buffer;
		self
	}

	pub fn safe_gas_multiplier(mut self, multiplier: f64) -> Self {
		self.config.safe_gas_multiplier = multiplier;
		self
	}

	pub fn block_gas_limit(mut self, limit: u64) -> Self {
		self.config.block_gas_limit = limit;
		self
	}

	pub fn retry(mut self, retry: RetryConfig) -> Self {
		self.config.retry = retry;
		self
	}

	pub fn build(self) -> ClientManagerConfig {
		self.config
	}
}
