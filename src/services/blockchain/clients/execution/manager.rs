//! Execution client manager.
//!
//! Fronts a primary and an optional fallback [`ExecutionClient`], routing every call through the
//! failover runner. The manager is itself an [`ExecutionClient`], so the query and transaction
//! managers never see which endpoint served a call.

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::{
	future::Future,
	sync::Arc,
	time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::mpsc;
use tracing::instrument;

use crate::{
	models::{
		BlockHeader, BlockTag, CallRequest, ClientKind, ClientManagerStatus, ClientStatus, Log,
		LogFilter, SyncProgress, Transaction, TransactionReceipt,
	},
	services::blockchain::{
		clients::execution::{
			client::ExecutionClient,
			subscription::{spawn_log_subscription, LogSubscription},
		},
		run_function1, run_function2, BlockChainError, ClientManager, ClientPair,
	},
};

/// Maximum age of the latest block for a node that reports it is no longer syncing
pub const SYNC_THRESHOLD: Duration = Duration::from_secs(60);

/// Primary/fallback pair of execution clients
pub struct ExecutionClientManager {
	clients: ClientPair<dyn ExecutionClient>,
	expected_chain_id: u64,
}

impl ExecutionClientManager {
	/// Creates a manager over already constructed clients
	///
	/// # Arguments
	/// * `primary` - Preferred endpoint
	/// * `fallback` - Optional backup endpoint
	/// * `expected_chain_id` - Chain both endpoints must serve for a status check to pass
	pub fn new(
		primary: Arc<dyn ExecutionClient>,
		fallback: Option<Arc<dyn ExecutionClient>>,
		expected_chain_id: u64,
	) -> Self {
		Self {
			clients: ClientPair::new(ClientKind::Execution, primary, fallback),
			expected_chain_id,
		}
	}

	pub fn expected_chain_id(&self) -> u64 {
		self.expected_chain_id
	}

	/// Checks both endpoints and rewrites their readiness flags
	///
	/// This is the only place a client that was marked not ready can become ready again.
	/// When `check_chain_ids` is set, an endpoint serving another chain is marked not ready.
	#[instrument(skip(self))]
	pub async fn check_status(&self, check_chain_ids: bool) -> ClientManagerStatus {
		let mut status = ClientManagerStatus {
			fallback_enabled: self.clients.is_fallback_enabled(),
			..Default::default()
		};

		status.primary_client_status =
			check_ec_status(self.clients.primary_client().as_ref(), check_chain_ids).await;
		if check_chain_ids
			&& status.primary_client_status.error.is_empty()
			&& status.primary_client_status.chain_id != self.expected_chain_id
		{
			self.clients.set_primary_ready(false);
			status.primary_client_status.error = format!(
				"The primary client is using a different chain ({}) than what your node is configured for ({})",
				status.primary_client_status.chain_id, self.expected_chain_id
			);
		} else {
			self.clients
				.set_primary_ready(status.primary_client_status.is_ready());
		}

		if let Some(fallback) = self.clients.fallback_client() {
			status.fallback_client_status =
				check_ec_status(fallback.as_ref(), check_chain_ids).await;
			if check_chain_ids
				&& status.fallback_client_status.error.is_empty()
				&& status.fallback_client_status.chain_id != self.expected_chain_id
			{
				self.clients.set_fallback_ready(false);
				status.fallback_client_status.error = format!(
					"The fallback client is using a different chain ({}) than what your node is configured for ({})",
					status.fallback_client_status.chain_id, self.expected_chain_id
				);
				return status;
			}
		}

		self.clients.set_fallback_ready(
			status.fallback_enabled && status.fallback_client_status.is_ready(),
		);

		tracing::debug!(
			primary_ready = self.clients.is_primary_ready(),
			fallback_ready = self.clients.is_fallback_ready(),
			"Execution client status checked"
		);
		status
	}

	/// Runs `function` through the failover runner
	async fn run<R, F, Fut>(&self, function: F) -> Result<R, BlockChainError>
	where
		F: Fn(Arc<dyn ExecutionClient>) -> Fut,
		Fut: Future<Output = Result<R, BlockChainError>>,
	{
		run_function1::<dyn ExecutionClient, _, _, _, _>(self, function).await
	}

	/// Streams logs matching `filter` into `sender` by polling for new blocks
	///
	/// Polling starts at `filter.from_block`, or at the block after the current head when it is
	/// unset. Every poll goes through the failover runner.
	pub fn subscribe_filter_logs(
		self: &Arc<Self>,
		filter: LogFilter,
		sender: mpsc::Sender<Log>,
		poll_interval: Duration,
	) -> LogSubscription {
		spawn_log_subscription(self.clone(), filter, sender, poll_interval)
	}
}

/// Checks a single endpoint
async fn check_ec_status(client: &dyn ExecutionClient, check_chain_ids: bool) -> ClientStatus {
	let mut status = ClientStatus::default();

	if check_chain_ids {
		match client.chain_id().await {
			Ok(chain_id) => status.chain_id = chain_id,
			Err(e) => return ClientStatus::failed(format!("Chain ID check failed with [{}]", e)),
		}
	}

	let progress = match client.sync_progress().await {
		Ok(progress) => progress,
		Err(e) => {
			return ClientStatus {
				chain_id: status.chain_id,
				..ClientStatus::failed(format!("Sync progress check failed with [{}]", e))
			}
		}
	};

	status.is_working = true;
	match progress {
		// Still syncing
		Some(progress) => {
			status.is_synced = false;
			status.sync_progress = progress.progress();
			if status.sync_progress.is_nan() {
				status.sync_progress = 0.0;
			}
		}
		None => match is_sync_within_threshold(client).await {
			Ok((true, _)) => {
				status.is_synced = true;
				status.sync_progress = 1.0;
			}
			Ok((false, age)) => {
				status.is_synced = false;
				status.sync_progress = 0.0;
				status.error = format!(
					"Client claims to have finished syncing, but its last block was from {}s ago. It likely doesn't have enough peers",
					age.as_secs()
				);
			}
			Err(e) => {
				return ClientStatus {
					chain_id: status.chain_id,
					..ClientStatus::failed(format!(
						"Error checking if client's sync progress is up to date: [{}]",
						e
					))
				}
			}
		},
	}
	status
}

/// Whether the latest block is younger than [`SYNC_THRESHOLD`], together with its age
async fn is_sync_within_threshold(
	client: &dyn ExecutionClient,
) -> Result<(bool, Duration), BlockChainError> {
	let header = client.header_by_number(BlockTag::Latest).await?;
	let now = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs();
	let age = Duration::from_secs(now.saturating_sub(header.timestamp()));
	Ok((age < SYNC_THRESHOLD, age))
}

impl ClientManager<dyn ExecutionClient> for ExecutionClientManager {
	fn primary_client(&self) -> Arc<dyn ExecutionClient> {
		self.clients.primary_client()
	}

	fn fallback_client(&self) -> Option<Arc<dyn ExecutionClient>> {
		self.clients.fallback_client()
	}

	fn is_primary_ready(&self) -> bool {
		self.clients.is_primary_ready()
	}

	fn is_fallback_ready(&self) -> bool {
		self.clients.is_fallback_ready()
	}

	fn is_fallback_enabled(&self) -> bool {
		self.clients.is_fallback_enabled()
	}

	fn client_type_name(&self) -> &'static str {
		self.clients.client_type_name()
	}

	fn set_primary_ready(&self, ready: bool) {
		self.clients.set_primary_ready(ready)
	}

	fn set_fallback_ready(&self, ready: bool) {
		self.clients.set_fallback_ready(ready)
	}
}

#[async_trait]
impl ExecutionClient for ExecutionClientManager {
	async fn chain_id(&self) -> Result<u64, BlockChainError> {
		self.run(|client| async move { client.chain_id().await }).await
	}

	async fn block_number(&self) -> Result<u64, BlockChainError> {
		self.run(|client| async move { client.block_number().await }).await
	}

	async fn code_at(&self, address: Address, block: BlockTag) -> Result<Bytes, BlockChainError> {
		self.run(|client| async move { client.code_at(address, block).await }).await
	}

	async fn call_contract(
		&self,
		call: CallRequest,
		block: BlockTag,
	) -> Result<Bytes, BlockChainError> {
		self.run(|client| {
			let call = call.clone();
			async move { client.call_contract(call, block).await }
		})
		.await
	}

	async fn estimate_gas(&self, call: CallRequest) -> Result<u64, BlockChainError> {
		self.run(|client| {
			let call = call.clone();
			async move { client.estimate_gas(call).await }
		})
		.await
	}

	async fn pending_nonce_at(&self, address: Address) -> Result<u64, BlockChainError> {
		self.run(|client| async move {
			client.pending_nonce_at(address).await
		})
		.await
	}

	async fn nonce_at(&self, address: Address, block: BlockTag) -> Result<u64, BlockChainError> {
		self.run(|client| async move { client.nonce_at(address, block).await }).await
	}

	async fn balance_at(
		&self,
		address: Address,
		block: BlockTag,
	) -> Result<U256, BlockChainError> {
		self.run(|client| async move { client.balance_at(address, block).await })
			.await
	}

	async fn suggest_gas_price(&self) -> Result<U256, BlockChainError> {
		self.run(|client| async move { client.suggest_gas_price().await }).await
	}

	async fn suggest_gas_tip_cap(&self) -> Result<U256, BlockChainError> {
		self.run(|client| async move { client.suggest_gas_tip_cap().await }).await
	}

	async fn header_by_number(&self, block: BlockTag) -> Result<BlockHeader, BlockChainError> {
		self.run(|client| async move { client.header_by_number(block).await }).await
	}

	async fn header_by_hash(&self, hash: B256) -> Result<BlockHeader, BlockChainError> {
		self.run(|client| async move { client.header_by_hash(hash).await }).await
	}

	async fn transaction_by_hash(
		&self,
		hash: B256,
	) -> Result<(Transaction, bool), BlockChainError> {
		run_function2::<dyn ExecutionClient, _, _, _, _, _>(self, |client| async move {
			client.transaction_by_hash(hash).await
		})
		.await
	}

	async fn transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, BlockChainError> {
		self.run(|client| async move { client.transaction_receipt(hash).await }).await
	}

	async fn filter_logs(&self, filter: LogFilter) -> Result<Vec<Log>, BlockChainError> {
		self.run(|client| {
			let filter = filter.clone();
			async move { client.filter_logs(filter).await }
		})
		.await
	}

	async fn sync_progress(&self) -> Result<Option<SyncProgress>, BlockChainError> {
		self.run(|client| async move { client.sync_progress().await }).await
	}

	async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, BlockChainError> {
		self.run(|client| {
			let raw = raw.clone();
			async move { client.send_raw_transaction(raw).await }
		})
		.await
	}
}
