//! Beacon node REST API provider.
//!
//! One method per route of the standard Beacon node API. The provider only moves bytes: it
//! builds the path, checks the status code and decodes the wire types in
//! [`crate::models::beacon::api`]. Routes that address a block report a 404 as "does not
//! exist" (`false`) rather than as an error.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::{collections::HashMap, time::Duration};

use crate::{
	models::beacon::api::{
		AttestationsResponse, BeaconBlockHeaderResponse, BeaconBlockResponse,
		BlsToExecutionChangeRequest, CommitteesResponse, Eth2ConfigResponse,
		Eth2DepositContractResponse, FinalityCheckpointsResponse, GenesisResponse,
		ProposerDutiesResponse, SyncDutiesResponse, SyncStatusResponse, ValidatorsResponse,
		VoluntaryExitRequest,
	},
	services::blockchain::{
		clients::beacon::decoder_pool::CommitteesDecoderPool,
		transports::{HttpTransportClient, RestResponse, RestTransport, TransportError},
		BlockChainError,
	},
	utils::RetryConfig,
};

pub const REQUEST_SYNC_STATUS_PATH: &str = "/eth/v1/node/syncing";
pub const REQUEST_ETH2_CONFIG_PATH: &str = "/eth/v1/config/spec";
pub const REQUEST_ETH2_DEPOSIT_CONTRACT_PATH: &str = "/eth/v1/config/deposit_contract";
pub const REQUEST_GENESIS_PATH: &str = "/eth/v1/beacon/genesis";
pub const REQUEST_VOLUNTARY_EXIT_PATH: &str = "/eth/v1/beacon/pool/voluntary_exits";
pub const REQUEST_WITHDRAWAL_CREDENTIALS_CHANGE_PATH: &str =
	"/eth/v1/beacon/pool/bls_to_execution_changes";

/// Maximum number of validator ids sent in a single validators request
pub const MAX_REQUEST_VALIDATORS_COUNT: usize = 600;

fn committees_path(state_id: &str) -> String {
	format!("/eth/v1/beacon/states/{}/committees", state_id)
}

fn finality_checkpoints_path(state_id: &str) -> String {
	format!("/eth/v1/beacon/states/{}/finality_checkpoints", state_id)
}

fn validators_path(state_id: &str) -> String {
	format!("/eth/v1/beacon/states/{}/validators", state_id)
}

fn attestations_path(block_id: &str) -> String {
	format!("/eth/v1/beacon/blocks/{}/attestations", block_id)
}

fn beacon_block_path(block_id: &str) -> String {
	format!("/eth/v2/beacon/blocks/{}", block_id)
}

fn beacon_block_header_path(block_id: &str) -> String {
	format!("/eth/v1/beacon/headers/{}", block_id)
}

fn sync_duties_path(epoch: u64) -> String {
	format!("/eth/v1/validator/duties/sync/{}", epoch)
}

fn proposer_duties_path(epoch: u64) -> String {
	format!("/eth/v1/validator/duties/proposer/{}", epoch)
}

/// Raw access to the Beacon node REST API
#[async_trait]
pub trait BeaconApiProvider: Send + Sync {
	async fn beacon_attestations(
		&self,
		block_id: &str,
	) -> Result<(AttestationsResponse, bool), BlockChainError>;

	async fn beacon_block(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockResponse, bool), BlockChainError>;

	async fn beacon_bls_to_execution_changes_post(
		&self,
		request: BlsToExecutionChangeRequest,
	) -> Result<(), BlockChainError>;

	/// Committees at `state_id`, for `epoch` or the state's own epoch
	async fn beacon_committees(
		&self,
		state_id: &str,
		epoch: Option<u64>,
	) -> Result<CommitteesResponse, BlockChainError>;

	async fn beacon_finality_checkpoints(
		&self,
		state_id: &str,
	) -> Result<FinalityCheckpointsResponse, BlockChainError>;

	async fn beacon_genesis(&self) -> Result<GenesisResponse, BlockChainError>;

	async fn beacon_header(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockHeaderResponse, bool), BlockChainError>;

	/// Validators at `state_id`, filtered by pubkey or index when `ids` is not empty
	async fn beacon_validators(
		&self,
		state_id: &str,
		ids: &[String],
	) -> Result<ValidatorsResponse, BlockChainError>;

	async fn beacon_voluntary_exits_post(
		&self,
		request: VoluntaryExitRequest,
	) -> Result<(), BlockChainError>;

	async fn config_deposit_contract(&self)
		-> Result<Eth2DepositContractResponse, BlockChainError>;

	async fn config_spec(&self) -> Result<Eth2ConfigResponse, BlockChainError>;

	async fn node_syncing(&self) -> Result<SyncStatusResponse, BlockChainError>;

	async fn validator_duties_proposer(
		&self,
		epoch: u64,
	) -> Result<ProposerDutiesResponse, BlockChainError>;

	async fn validator_duties_sync_post(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<SyncDutiesResponse, BlockChainError>;
}

/// [`BeaconApiProvider`] over a [`RestTransport`]
pub struct BeaconHttpProvider<T: RestTransport> {
	transport: T,
	committees_decoders: CommitteesDecoderPool,
}

impl<T: RestTransport> BeaconHttpProvider<T> {
	pub fn new_with_transport(transport: T) -> Self {
		Self {
			transport,
			committees_decoders: CommitteesDecoderPool::default(),
		}
	}

	/// The decoder pool used for committees responses
	pub fn committees_decoders(&self) -> &CommitteesDecoderPool {
		&self.committees_decoders
	}

	async fn get_json<R: DeserializeOwned>(
		&self,
		path: &str,
		action: &str,
	) -> Result<R, BlockChainError> {
		let response = self
			.transport
			.get(path)
			.await
			.map_err(|e| transport_error(action, e))?;
		check_status(&response, action)?;
		decode(&response.body, action)
	}

	/// GET for routes where a 404 means the object does not exist
	async fn get_json_optional<R: DeserializeOwned + Default>(
		&self,
		path: &str,
		action: &str,
	) -> Result<(R, bool), BlockChainError> {
		let response = self
			.transport
			.get(path)
			.await
			.map_err(|e| transport_error(action, e))?;
		if response.is_not_found() {
			return Ok((R::default(), false));
		}
		check_status(&response, action)?;
		Ok((decode(&response.body, action)?, true))
	}

	async fn post_json(
		&self,
		path: &str,
		body: serde_json::Value,
		action: &str,
	) -> Result<RestResponse, BlockChainError> {
		let response = self
			.transport
			.post(path, body)
			.await
			.map_err(|e| transport_error(action, e))?;
		check_status(&response, action)?;
		Ok(response)
	}
}

impl BeaconHttpProvider<HttpTransportClient> {
	/// Creates a provider talking to the Beacon node at `url`
	pub fn new(
		url: &str,
		timeout: Duration,
		retry_config: &RetryConfig,
	) -> Result<Self, anyhow::Error> {
		let transport = HttpTransportClient::new(url, timeout, retry_config)?;
		Ok(Self::new_with_transport(transport))
	}
}

/// Keeps the disconnection classification of a transport failure while prefixing its message
fn transport_error(action: &str, err: TransportError) -> BlockChainError {
	let message = format!("error {}: {}", action, err);
	if err.is_disconnection() {
		BlockChainError::connection_error(message, Some(Box::new(err)), None)
	} else {
		BlockChainError::request_error(message, Some(Box::new(err)), None)
	}
}

fn check_status(response: &RestResponse, action: &str) -> Result<(), BlockChainError> {
	if response.status == 200 {
		return Ok(());
	}
	Err(BlockChainError::request_error(
		format!(
			"error {}: HTTP status {}; response body: '{}'",
			action,
			response.status,
			String::from_utf8_lossy(&response.body)
		),
		None,
		Some(HashMap::from([(
			"status".to_string(),
			response.status.to_string(),
		)])),
	))
}

fn decode<R: DeserializeOwned>(body: &[u8], action: &str) -> Result<R, BlockChainError> {
	serde_json::from_slice(body).map_err(|e| {
		BlockChainError::request_error(
			format!("error decoding {}: {}", action.trim_start_matches("getting "), e),
			Some(Box::new(e)),
			None,
		)
	})
}

#[async_trait]
impl<T: RestTransport> BeaconApiProvider for BeaconHttpProvider<T> {
	async fn beacon_attestations(
		&self,
		block_id: &str,
	) -> Result<(AttestationsResponse, bool), BlockChainError> {
		self.get_json_optional(
			&attestations_path(block_id),
			&format!("getting attestations data for slot {}", block_id),
		)
		.await
	}

	async fn beacon_block(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockResponse, bool), BlockChainError> {
		self.get_json_optional(&beacon_block_path(block_id), "getting beacon block data")
			.await
	}

	async fn beacon_bls_to_execution_changes_post(
		&self,
		request: BlsToExecutionChangeRequest,
	) -> Result<(), BlockChainError> {
		let action = format!(
			"broadcasting withdrawal credentials change for validator {}",
			request.message.validator_index
		);
		// This route takes an array of changes
		self.post_json(
			REQUEST_WITHDRAWAL_CREDENTIALS_CHANGE_PATH,
			json!([request]),
			&action,
		)
		.await
		.map(|_| ())
	}

	async fn beacon_committees(
		&self,
		state_id: &str,
		epoch: Option<u64>,
	) -> Result<CommitteesResponse, BlockChainError> {
		let mut path = committees_path(state_id);
		if let Some(epoch) = epoch {
			path.push_str(&format!("?epoch={}", epoch));
		}

		let mut decoder = self.committees_decoders.checkout();
		let status = self
			.transport
			.get_into(&path, decoder.buffer_mut())
			.await
			.map_err(|e| transport_error("getting committees", e))?;
		if status != 200 {
			return Err(BlockChainError::request_error(
				format!(
					"error getting committees: HTTP status {}; response body: '{}'",
					status,
					String::from_utf8_lossy(decoder.buffer())
				),
				None,
				None,
			));
		}

		decoder.decode().map_err(|e| {
			BlockChainError::request_error(
				format!("error decoding committees: {}", e),
				Some(Box::new(e)),
				None,
			)
		})
	}

	async fn beacon_finality_checkpoints(
		&self,
		state_id: &str,
	) -> Result<FinalityCheckpointsResponse, BlockChainError> {
		self.get_json(
			&finality_checkpoints_path(state_id),
			"getting finality checkpoints",
		)
		.await
	}

	async fn beacon_genesis(&self) -> Result<GenesisResponse, BlockChainError> {
		self.get_json(REQUEST_GENESIS_PATH, "getting genesis").await
	}

	async fn beacon_header(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockHeaderResponse, bool), BlockChainError> {
		self.get_json_optional(
			&beacon_block_header_path(block_id),
			"getting beacon block header data",
		)
		.await
	}

	async fn beacon_validators(
		&self,
		state_id: &str,
		ids: &[String],
	) -> Result<ValidatorsResponse, BlockChainError> {
		let mut path = validators_path(state_id);
		if !ids.is_empty() {
			path.push_str(&format!("?id={}", ids.join(",")));
		}
		self.get_json(&path, "getting validators").await
	}

	async fn beacon_voluntary_exits_post(
		&self,
		request: VoluntaryExitRequest,
	) -> Result<(), BlockChainError> {
		let action = format!(
			"broadcasting exit for validator at index {}",
			request.message.validator_index
		);
		let body = serde_json::to_value(&request).map_err(|e| {
			BlockChainError::request_error(
				format!("error {}: {}", action, e),
				Some(Box::new(e)),
				None,
			)
		})?;
		self.post_json(REQUEST_VOLUNTARY_EXIT_PATH, body, &action)
			.await
			.map(|_| ())
	}

	async fn config_deposit_contract(
		&self,
	) -> Result<Eth2DepositContractResponse, BlockChainError> {
		self.get_json(
			REQUEST_ETH2_DEPOSIT_CONTRACT_PATH,
			"getting eth2 deposit contract",
		)
		.await
	}

	async fn config_spec(&self) -> Result<Eth2ConfigResponse, BlockChainError> {
		self.get_json(REQUEST_ETH2_CONFIG_PATH, "getting eth2 config")
			.await
	}

	async fn node_syncing(&self) -> Result<SyncStatusResponse, BlockChainError> {
		self.get_json(REQUEST_SYNC_STATUS_PATH, "getting node sync status")
			.await
	}

	async fn validator_duties_proposer(
		&self,
		epoch: u64,
	) -> Result<ProposerDutiesResponse, BlockChainError> {
		self.get_json(
			&proposer_duties_path(epoch),
			"getting validator proposer duties",
		)
		.await
	}

	async fn validator_duties_sync_post(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<SyncDutiesResponse, BlockChainError> {
		let response = self
			.post_json(
				&sync_duties_path(epoch),
				json!(indices),
				"getting validator sync duties",
			)
			.await?;
		decode(&response.body, "validator sync duties data")
	}
}
