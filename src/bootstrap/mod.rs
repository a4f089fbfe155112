//! Bootstrap module for building the service graph from a configuration.
//!
//! [`ServiceProvider`] owns everything a daemon needs to talk to the chain:
//! - `ExecutionClientManager`: primary/fallback JSON-RPC clients
//! - `BeaconClientManager`: primary/fallback Beacon REST clients
//! - `TransactionManager`: gas sizing, execution and inclusion waits
//! - `QueryManager`: multicall queries
//!
//! It also holds the root cancellation token handed to long running operations.

use anyhow::Context;
use std::{path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::{
	models::{ClientManagerConfig, ClientManagerStatus, ConfigLoader},
	services::{
		blockchain::{
			BeaconClient, BeaconClientManager, EvmClient, ExecutionClient, ExecutionClientManager,
			StandardBeaconClient,
		},
		query::QueryManager,
		transaction::TransactionManager,
	},
};

/// Type alias for bootstrap results
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Builds the execution client of one endpoint
pub fn create_execution_client(
	url: &str,
	config: &ClientManagerConfig,
) -> Result<Arc<dyn ExecutionClient>> {
	let client = EvmClient::new(url, config.client_timeout(), &config.retry)
		.with_context(|| format!("Failed to create execution client for {}", url))?;
	Ok(Arc::new(client))
}

/// Builds the Beacon client of one endpoint
pub fn create_beacon_client(url: &str, config: &ClientManagerConfig) -> Result<Arc<dyn BeaconClient>> {
	let client = StandardBeaconClient::new_http(url, config.client_timeout(), &config.retry)
		.with_context(|| format!("Failed to create beacon client for {}", url))?;
	Ok(Arc::new(client))
}

/// The service graph built from one configuration
pub struct ServiceProvider {
	config: ClientManagerConfig,
	execution_client: Arc<ExecutionClientManager>,
	beacon_client: Arc<BeaconClientManager>,
	transaction_manager: Arc<TransactionManager>,
	query_manager: Arc<QueryManager>,
	cancel_token: CancellationToken,
}

impl ServiceProvider {
	/// Builds every client and manager described by `config`
	///
	/// No request is sent; endpoints start out marked ready.
	pub fn new(config: ClientManagerConfig) -> Result<Self> {
		let ec_primary = create_execution_client(&config.execution.primary_url, &config)?;
		let ec_fallback = config
			.execution
			.fallback_url
			.as_deref()
			.map(|url| create_execution_client(url, &config))
			.transpose()?;
		let execution_client = Arc::new(ExecutionClientManager::new(
			ec_primary,
			ec_fallback,
			config.execution.chain_id,
		));

		let bn_primary = create_beacon_client(&config.beacon.primary_url, &config)?;
		let bn_fallback = config
			.beacon
			.fallback_url
			.as_deref()
			.map(|url| create_beacon_client(url, &config))
			.transpose()?;
		let beacon_client = Arc::new(BeaconClientManager::new(
			bn_primary,
			bn_fallback,
			config.beacon.ignore_sync_check,
		));

		let transaction_manager = Arc::new(
			TransactionManager::new(
				execution_client.clone(),
				config.safe_gas_buffer,
				config.safe_gas_multiplier,
				config.block_gas_limit,
			)
			.context("Failed to create transaction manager")?,
		);
		let query_manager = Arc::new(QueryManager::new(
			execution_client.clone(),
			config.multicall_address,
			config.concurrent_call_limit,
		));

		tracing::info!(
			ec_fallback = config.execution.fallback_url.is_some(),
			bn_fallback = config.beacon.fallback_url.is_some(),
			chain_id = config.execution.chain_id,
			"Services initialized"
		);

		Ok(Self {
			config,
			execution_client,
			beacon_client,
			transaction_manager,
			query_manager,
			cancel_token: CancellationToken::new(),
		})
	}

	/// Loads the configuration file at `path` and builds the services it describes
	pub async fn from_config_path(path: &Path) -> Result<Self> {
		let config = ClientManagerConfig::load_from_path(path)
			.await
			.with_context(|| format!("Failed to load client config from {}", path.display()))?;
		Self::new(config)
	}

	pub fn config(&self) -> &ClientManagerConfig {
		&self.config
	}

	pub fn execution_client(&self) -> Arc<ExecutionClientManager> {
		self.execution_client.clone()
	}

	pub fn beacon_client(&self) -> Arc<BeaconClientManager> {
		self.beacon_client.clone()
	}

	pub fn transaction_manager(&self) -> Arc<TransactionManager> {
		self.transaction_manager.clone()
	}

	pub fn query_manager(&self) -> Arc<QueryManager> {
		self.query_manager.clone()
	}

	/// A token cancelled by [`ServiceProvider::cancel_all`]
	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel_token.child_token()
	}

	/// Cancels every operation running with a token of this provider
	pub fn cancel_all(&self) {
		tracing::info!("Cancelling all pending operations");
		self.cancel_token.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel_token.is_cancelled()
	}

	/// Checks every endpoint and refreshes its readiness
	///
	/// Returns the execution client status followed by the Beacon node status.
	pub async fn check_status(&self) -> (ClientManagerStatus, ClientManagerStatus) {
		tokio::join!(
			self.execution_client.check_status(true),
			self.beacon_client.check_status()
		)
	}
}
