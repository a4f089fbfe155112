//! Beacon client manager.
//!
//! Fronts a primary and an optional fallback [`BeaconClient`] and routes every call through the
//! failover runner. Like the execution manager it is itself a [`BeaconClient`].

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use std::{collections::HashMap, future::Future, sync::Arc};
use tracing::instrument;

use crate::{
	models::{
		AttestationInfo, BeaconBlock, BeaconBlockHeader, BeaconHead, ClientKind,
		ClientManagerStatus, ClientStatus, Committees, Eth1Data, Eth2Config, Eth2DepositContract,
		SyncStatus, ValidatorPubkey, ValidatorSignature, ValidatorStatus, ValidatorStatusOptions,
	},
	services::blockchain::{
		clients::beacon::client::BeaconClient, run_function0, run_function1, run_function2,
		BlockChainError, ClientManager, ClientPair,
	},
};

/// Primary/fallback pair of beacon clients
pub struct BeaconClientManager {
	clients: ClientPair<dyn BeaconClient>,
	ignore_sync_check: bool,
}

impl BeaconClientManager {
	/// Creates a manager over already constructed clients
	///
	/// With `ignore_sync_check` set, [`BeaconClientManager::check_status`] never contacts the
	/// endpoints and only reports the current readiness flags.
	pub fn new(
		primary: Arc<dyn BeaconClient>,
		fallback: Option<Arc<dyn BeaconClient>>,
		ignore_sync_check: bool,
	) -> Self {
		Self {
			clients: ClientPair::new(ClientKind::Beacon, primary, fallback),
			ignore_sync_check,
		}
	}

	pub fn ignore_sync_check(&self) -> bool {
		self.ignore_sync_check
	}

	/// Checks both endpoints and rewrites their readiness flags
	#[instrument(skip(self))]
	pub async fn check_status(&self) -> ClientManagerStatus {
		let mut status = ClientManagerStatus {
			fallback_enabled: self.clients.is_fallback_enabled(),
			..Default::default()
		};

		if self.ignore_sync_check {
			let primary_ready = self.clients.is_primary_ready();
			status.primary_client_status.is_working = primary_ready;
			status.primary_client_status.is_synced = primary_ready;
			if status.fallback_enabled {
				let fallback_ready = self.clients.is_fallback_ready();
				status.fallback_client_status.is_working = fallback_ready;
				status.fallback_client_status.is_synced = fallback_ready;
			}
			return status;
		}

		status.primary_client_status = check_bc_status(self.clients.primary_client().as_ref()).await;
		if let Some(fallback) = self.clients.fallback_client() {
			status.fallback_client_status = check_bc_status(fallback.as_ref()).await;
		}

		self.clients
			.set_primary_ready(status.primary_client_status.is_ready());
		self.clients.set_fallback_ready(
			status.fallback_enabled && status.fallback_client_status.is_ready(),
		);

		tracing::debug!(
			primary_ready = self.clients.is_primary_ready(),
			fallback_ready = self.clients.is_fallback_ready(),
			"Beacon client status checked"
		);
		status
	}

	async fn run<R, F, Fut>(&self, function: F) -> Result<R, BlockChainError>
	where
		F: Fn(Arc<dyn BeaconClient>) -> Fut,
		Fut: Future<Output = Result<R, BlockChainError>>,
	{
		run_function1::<dyn BeaconClient, _, _, _, _>(self, function).await
	}

	async fn run_unit<F, Fut>(&self, function: F) -> Result<(), BlockChainError>
	where
		F: Fn(Arc<dyn BeaconClient>) -> Fut,
		Fut: Future<Output = Result<(), BlockChainError>>,
	{
		run_function0::<dyn BeaconClient, _, _, _>(self, function).await
	}

	async fn run_pair<R1, R2, F, Fut>(&self, function: F) -> Result<(R1, R2), BlockChainError>
	where
		F: Fn(Arc<dyn BeaconClient>) -> Fut,
		Fut: Future<Output = Result<(R1, R2), BlockChainError>>,
	{
		run_function2::<dyn BeaconClient, _, _, _, _, _>(self, function).await
	}
}

async fn check_bc_status(client: &dyn BeaconClient) -> ClientStatus {
	match client.get_sync_status().await {
		Err(e) => ClientStatus::failed(format!("Sync progress check failed with [{}]", e)),
		Ok(sync) if !sync.syncing => ClientStatus {
			is_working: true,
			is_synced: true,
			sync_progress: 1.0,
			..Default::default()
		},
		Ok(sync) => ClientStatus {
			is_working: true,
			is_synced: false,
			sync_progress: sync.progress,
			..Default::default()
		},
	}
}

impl ClientManager<dyn BeaconClient> for BeaconClientManager {
	fn primary_client(&self) -> Arc<dyn BeaconClient> {
		self.clients.primary_client()
	}

	fn fallback_client(&self) -> Option<Arc<dyn BeaconClient>> {
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
impl BeaconClient for BeaconClientManager {
	async fn get_sync_status(&self) -> Result<SyncStatus, BlockChainError> {
		self.run(|client| async move { client.get_sync_status().await })
			.await
	}

	async fn get_eth2_config(&self) -> Result<Eth2Config, BlockChainError> {
		self.run(|client| async move { client.get_eth2_config().await })
			.await
	}

	async fn get_eth2_deposit_contract(&self) -> Result<Eth2DepositContract, BlockChainError> {
		self.run(|client| async move { client.get_eth2_deposit_contract().await })
			.await
	}

	async fn get_attestations(
		&self,
		block_id: &str,
	) -> Result<(Vec<AttestationInfo>, bool), BlockChainError> {
		self.run_pair(|client| async move { client.get_attestations(block_id).await })
			.await
	}

	async fn get_beacon_block(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlock, bool), BlockChainError> {
		self.run_pair(|client| async move { client.get_beacon_block(block_id).await })
			.await
	}

	async fn get_beacon_block_header(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockHeader, bool), BlockChainError> {
		self.run_pair(|client| async move { client.get_beacon_block_header(block_id).await })
			.await
	}

	async fn get_beacon_head(&self) -> Result<BeaconHead, BlockChainError> {
		self.run(|client| async move { client.get_beacon_head().await })
			.await
	}

	async fn get_validator_status(
		&self,
		pubkey: &ValidatorPubkey,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError> {
		self.run(|client| async move { client.get_validator_status(pubkey, opts).await })
			.await
	}

	async fn get_validator_status_by_index(
		&self,
		index: &str,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError> {
		self.run(|client| async move { client.get_validator_status_by_index(index, opts).await })
			.await
	}

	async fn get_validator_statuses(
		&self,
		pubkeys: &[ValidatorPubkey],
		opts: Option<ValidatorStatusOptions>,
	) -> Result<HashMap<ValidatorPubkey, ValidatorStatus>, BlockChainError> {
		self.run(|client| async move { client.get_validator_statuses(pubkeys, opts).await })
			.await
	}

	async fn get_validator_index(
		&self,
		pubkey: &ValidatorPubkey,
	) -> Result<String, BlockChainError> {
		self.run(|client| async move { client.get_validator_index(pubkey).await })
			.await
	}

	async fn get_validator_sync_duties(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<HashMap<String, bool>, BlockChainError> {
		self.run(|client| async move { client.get_validator_sync_duties(indices, epoch).await })
			.await
	}

	async fn get_validator_proposer_duties(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<HashMap<String, u64>, BlockChainError> {
		self.run(|client| async move {
			client.get_validator_proposer_duties(indices, epoch).await
		})
		.await
	}

	async fn get_domain_data(
		&self,
		domain_type: &[u8],
		epoch: u64,
		use_genesis_fork: bool,
	) -> Result<B256, BlockChainError> {
		self.run(|client| async move {
			client
				.get_domain_data(domain_type, epoch, use_genesis_fork)
				.await
		})
		.await
	}

	async fn exit_validator(
		&self,
		validator_index: &str,
		epoch: u64,
		signature: &ValidatorSignature,
	) -> Result<(), BlockChainError> {
		self.run_unit(|client| async move {
			client.exit_validator(validator_index, epoch, signature).await
		})
		.await
	}

	async fn close(&self) -> Result<(), BlockChainError> {
		self.run_unit(|client| async move { client.close().await })
			.await
	}

	async fn get_eth1_data_for_eth2_block(
		&self,
		block_id: &str,
	) -> Result<(Eth1Data, bool), BlockChainError> {
		self.run_pair(|client| async move { client.get_eth1_data_for_eth2_block(block_id).await })
			.await
	}

	async fn get_committees_for_epoch(
		&self,
		epoch: Option<u64>,
	) -> Result<Committees, BlockChainError> {
		self.run(|client| async move { client.get_committees_for_epoch(epoch).await })
			.await
	}

	async fn change_withdrawal_credentials(
		&self,
		validator_index: &str,
		from_bls_pubkey: &ValidatorPubkey,
		to_execution_address: Address,
		signature: &ValidatorSignature,
	) -> Result<(), BlockChainError> {
		self.run_unit(|client| async move {
			client
				.change_withdrawal_credentials(
					validator_index,
					from_bls_pubkey,
					to_execution_address,
					signature,
				)
				.await
		})
		.await
	}
}
