//! Beacon (consensus layer) client.
//!
//! [`BeaconClient`] is the capability set the crate needs from a Beacon node.
//! [`StandardBeaconClient`] implements it on top of any [`BeaconApiProvider`], turning the REST
//! wire types into the domain types of [`crate::models::beacon`].
//!
//! Methods that address a block return `(value, exists)`. A block the node does not know is
//! `(Default::default(), false)` and not an error.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, time::Duration};

use crate::{
	models::{
		beacon::{
			api::{
				Attestation, BlsToExecutionChangeMessage, BlsToExecutionChangeRequest, Validator,
				ValidatorsResponse, VoluntaryExitMessage, VoluntaryExitRequest,
			},
			bytes_to_address, bytes_to_hash,
		},
		AttestationInfo, BeaconBlock, BeaconBlockHeader, BeaconHead, Committee, Committees,
		Eth1Data, Eth2Config, Eth2DepositContract, SyncStatus, ValidatorPubkey, ValidatorSignature,
		ValidatorState, ValidatorStatus, ValidatorStatusOptions,
	},
	services::blockchain::{
		clients::beacon::provider::{
			BeaconApiProvider, BeaconHttpProvider, MAX_REQUEST_VALIDATORS_COUNT,
		},
		transports::HttpTransportClient,
		BlockChainError,
	},
	utils::RetryConfig,
};

/// Length of a signing domain type
pub const DOMAIN_TYPE_LENGTH: usize = 4;

/// Standard Beacon node capability set
#[async_trait]
pub trait BeaconClient: Send + Sync {
	async fn get_sync_status(&self) -> Result<SyncStatus, BlockChainError>;

	/// Chain parameters, assembled from the config and genesis routes
	async fn get_eth2_config(&self) -> Result<Eth2Config, BlockChainError>;

	async fn get_eth2_deposit_contract(&self) -> Result<Eth2DepositContract, BlockChainError>;

	async fn get_attestations(
		&self,
		block_id: &str,
	) -> Result<(Vec<AttestationInfo>, bool), BlockChainError>;

	async fn get_beacon_block(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlock, bool), BlockChainError>;

	async fn get_beacon_block_header(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockHeader, bool), BlockChainError>;

	/// Current epoch (from the wall clock) and the finality checkpoints of the head state
	async fn get_beacon_head(&self) -> Result<BeaconHead, BlockChainError>;

	async fn get_validator_status(
		&self,
		pubkey: &ValidatorPubkey,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError>;

	async fn get_validator_status_by_index(
		&self,
		index: &str,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError>;

	/// Statuses of many validators at once
	///
	/// Null and duplicate pubkeys are not sent to the node. The returned map always holds a
	/// default status under the null pubkey.
	async fn get_validator_statuses(
		&self,
		pubkeys: &[ValidatorPubkey],
		opts: Option<ValidatorStatusOptions>,
	) -> Result<HashMap<ValidatorPubkey, ValidatorStatus>, BlockChainError>;

	async fn get_validator_index(&self, pubkey: &ValidatorPubkey)
		-> Result<String, BlockChainError>;

	/// Whether each of `indices` is in a sync committee at `epoch`
	async fn get_validator_sync_duties(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<HashMap<String, bool>, BlockChainError>;

	/// Number of block proposals assigned to each of `indices` at `epoch`
	async fn get_validator_proposer_duties(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<HashMap<String, u64>, BlockChainError>;

	/// Signing domain for `domain_type`
	///
	/// `use_genesis_fork` selects the genesis fork version (credential changes); otherwise the
	/// Capella fork version is used (voluntary exits, EIP-7044).
	async fn get_domain_data(
		&self,
		domain_type: &[u8],
		epoch: u64,
		use_genesis_fork: bool,
	) -> Result<B256, BlockChainError>;

	async fn exit_validator(
		&self,
		validator_index: &str,
		epoch: u64,
		signature: &ValidatorSignature,
	) -> Result<(), BlockChainError>;

	async fn close(&self) -> Result<(), BlockChainError>;

	async fn get_eth1_data_for_eth2_block(
		&self,
		block_id: &str,
	) -> Result<(Eth1Data, bool), BlockChainError>;

	/// Attestation committees of `epoch`, or of the current epoch when `None`
	async fn get_committees_for_epoch(
		&self,
		epoch: Option<u64>,
	) -> Result<Committees, BlockChainError>;

	async fn change_withdrawal_credentials(
		&self,
		validator_index: &str,
		from_bls_pubkey: &ValidatorPubkey,
		to_execution_address: Address,
		signature: &ValidatorSignature,
	) -> Result<(), BlockChainError>;
}

/// [`BeaconClient`] over a [`BeaconApiProvider`]
pub struct StandardBeaconClient<P: BeaconApiProvider> {
	provider: P,
}

impl<P: BeaconApiProvider> StandardBeaconClient<P> {
	pub fn new(provider: P) -> Self {
		Self { provider }
	}

	pub fn provider(&self) -> &P {
		&self.provider
	}

	async fn get_validator_status_by_id(
		&self,
		pubkey_or_index: &str,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError> {
		if pubkey_or_index.is_empty() {
			return Ok(ValidatorStatus::default());
		}

		let validators = self
			.get_validators_by_opts(&[pubkey_or_index.to_string()], opts)
			.await?;
		match validators.data.first() {
			Some(validator) => validator_status(validator),
			None => Ok(ValidatorStatus::default()),
		}
	}

	/// Fetches validators in chunks of [`MAX_REQUEST_VALIDATORS_COUNT`] ids
	async fn get_validators_by_opts(
		&self,
		ids: &[String],
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorsResponse, BlockChainError> {
		let state_id = match opts {
			None => "head".to_string(),
			Some(ValidatorStatusOptions {
				slot: Some(slot), ..
			}) => slot.to_string(),
			Some(ValidatorStatusOptions {
				epoch: Some(epoch),
				..
			}) => {
				let spec = self.provider.config_spec().await?;
				(epoch * spec.data.slots_per_epoch).to_string()
			}
			Some(_) => {
				return Err(BlockChainError::request_error(
					"must specify a slot or epoch when calling getValidatorsByOpts",
					None,
					None,
				))
			}
		};

		let state_id = state_id.as_str();
		let requests: Vec<_> = ids
			.chunks(MAX_REQUEST_VALIDATORS_COUNT)
			.map(move |chunk| async move {
				self.provider
					.beacon_validators(state_id, chunk)
					.await
					.map(|response| response.data)
			})
			.collect();
		let chunks: Vec<Vec<Validator>> = stream::iter(requests)
			.buffered(validator_request_concurrency())
			.try_collect()
			.await?;

		Ok(ValidatorsResponse {
			data: chunks.into_iter().flatten().collect(),
		})
	}
}

impl StandardBeaconClient<BeaconHttpProvider<HttpTransportClient>> {
	/// Creates a client for the Beacon node at `url`
	pub fn new_http(
		url: &str,
		timeout: Duration,
		retry_config: &RetryConfig,
	) -> Result<Self, anyhow::Error> {
		Ok(Self::new(BeaconHttpProvider::new(url, timeout, retry_config)?))
	}
}

/// Number of validator chunks requested at once
fn validator_request_concurrency() -> usize {
	std::thread::available_parallelism()
		.map(|n| n.get() / 2)
		.unwrap_or(1)
		.max(1)
}

fn validator_status(validator: &Validator) -> Result<ValidatorStatus, BlockChainError> {
	let pubkey = ValidatorPubkey::from_slice(&validator.validator.pubkey).map_err(|e| {
		BlockChainError::request_error(
			format!("invalid pubkey for validator {}: {}", validator.index, e),
			None,
			None,
		)
	})?;
	Ok(ValidatorStatus {
		pubkey,
		index: validator.index.clone(),
		withdrawal_credentials: bytes_to_hash(&validator.validator.withdrawal_credentials),
		balance: validator.balance,
		status: validator
			.status
			.parse()
			.unwrap_or(ValidatorState::Unknown),
		effective_balance: validator.validator.effective_balance,
		slashed: validator.validator.slashed,
		activation_eligibility_epoch: validator.validator.activation_eligibility_epoch,
		activation_epoch: validator.validator.activation_epoch,
		exit_epoch: validator.validator.exit_epoch,
		withdrawable_epoch: validator.validator.withdrawable_epoch,
		exists: true,
	})
}

fn attestation_info(
	attestations: &[Attestation],
	block_id: &str,
) -> Result<Vec<AttestationInfo>, BlockChainError> {
	attestations
		.iter()
		.enumerate()
		.map(|(i, attestation)| {
			let bits = attestation
				.aggregation_bits
				.strip_prefix("0x")
				.unwrap_or(&attestation.aggregation_bits);
			let aggregation_bits = hex::decode(bits).map_err(|e| {
				BlockChainError::request_error(
					format!(
						"error decoding aggregation bits for attestation {} of block {}: {}",
						i, block_id, e
					),
					Some(Box::new(e)),
					None,
				)
			})?;
			Ok(AttestationInfo {
				aggregation_bits,
				slot_index: attestation.data.slot,
				committee_index: attestation.data.index,
			})
		})
		.collect()
}

/// Computes a signing domain: the domain type followed by the first 28 bytes of the fork data
/// root
///
/// The fork data root is the SSZ hash tree root of `ForkData { current_version,
/// genesis_validators_root }`, i.e. `sha256(fork_version padded to 32 bytes ‖
/// genesis_validators_root)`.
pub fn compute_domain(
	domain_type: [u8; DOMAIN_TYPE_LENGTH],
	fork_version: &[u8],
	genesis_validators_root: &[u8],
) -> Result<B256, BlockChainError> {
	if fork_version.len() != 4 {
		return Err(BlockChainError::request_error(
			format!("fork version must be 4 bytes, got {}", fork_version.len()),
			None,
			None,
		));
	}
	if genesis_validators_root.len() != 32 {
		return Err(BlockChainError::request_error(
			format!(
				"genesis validators root must be 32 bytes, got {}",
				genesis_validators_root.len()
			),
			None,
			None,
		));
	}

	let mut version_chunk = [0u8; 32];
	version_chunk[..4].copy_from_slice(fork_version);
	let mut hasher = Sha256::new();
	hasher.update(version_chunk);
	hasher.update(genesis_validators_root);
	let fork_data_root = hasher.finalize();

	let mut domain = [0u8; 32];
	domain[..DOMAIN_TYPE_LENGTH].copy_from_slice(&domain_type);
	domain[DOMAIN_TYPE_LENGTH..].copy_from_slice(&fork_data_root[..32 - DOMAIN_TYPE_LENGTH]);
	Ok(B256::from(domain))
}

#[async_trait]
impl<P: BeaconApiProvider> BeaconClient for StandardBeaconClient<P> {
	async fn get_sync_status(&self) -> Result<SyncStatus, BlockChainError> {
		let response = self.provider.node_syncing().await?;
		let head = response.data.head_slot as f64;
		let total = head + response.data.sync_distance as f64;
		let progress = if total == 0.0 { 0.0 } else { head / total };
		Ok(SyncStatus {
			syncing: response.data.is_syncing,
			progress,
		})
	}

	async fn get_eth2_config(&self) -> Result<Eth2Config, BlockChainError> {
		let (spec, genesis) =
			tokio::try_join!(self.provider.config_spec(), self.provider.beacon_genesis())?;
		Ok(Eth2Config {
			genesis_fork_version: genesis.data.genesis_fork_version,
			genesis_validators_root: genesis.data.genesis_validators_root,
			genesis_epoch: 0,
			genesis_time: genesis.data.genesis_time,
			seconds_per_slot: spec.data.seconds_per_slot,
			slots_per_epoch: spec.data.slots_per_epoch,
			seconds_per_epoch: spec.data.seconds_per_slot * spec.data.slots_per_epoch,
			epochs_per_sync_committee_period: spec.data.epochs_per_sync_committee_period,
		})
	}

	async fn get_eth2_deposit_contract(&self) -> Result<Eth2DepositContract, BlockChainError> {
		let response = self.provider.config_deposit_contract().await?;
		Ok(Eth2DepositContract {
			chain_id: response.data.chain_id,
			address: response.data.address,
		})
	}

	async fn get_attestations(
		&self,
		block_id: &str,
	) -> Result<(Vec<AttestationInfo>, bool), BlockChainError> {
		let (response, exists) = self.provider.beacon_attestations(block_id).await?;
		if !exists {
			return Ok((Vec::new(), false));
		}
		Ok((attestation_info(&response.data, block_id)?, true))
	}

	async fn get_beacon_block(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlock, bool), BlockChainError> {
		let (response, exists) = self.provider.beacon_block(block_id).await?;
		if !exists {
			return Ok((BeaconBlock::default(), false));
		}

		let message = response.data.message;
		let mut block = BeaconBlock {
			header: BeaconBlockHeader {
				slot: message.slot,
				proposer_index: message.proposer_index,
			},
			attestations: attestation_info(&message.body.attestations, block_id)?,
			..Default::default()
		};
		// Pre-merge blocks have no execution payload
		if let Some(payload) = message.body.execution_payload {
			block.has_execution_payload = true;
			block.fee_recipient = bytes_to_address(&payload.fee_recipient);
			block.execution_block_number = payload.block_number;
		}
		Ok((block, true))
	}

	async fn get_beacon_block_header(
		&self,
		block_id: &str,
	) -> Result<(BeaconBlockHeader, bool), BlockChainError> {
		let (response, exists) = self.provider.beacon_header(block_id).await?;
		if !exists {
			return Ok((BeaconBlockHeader::default(), false));
		}
		let message = response.data.header.message;
		Ok((
			BeaconBlockHeader {
				slot: message.slot,
				proposer_index: message.proposer_index,
			},
			true,
		))
	}

	async fn get_beacon_head(&self) -> Result<BeaconHead, BlockChainError> {
		let (config, checkpoints) = tokio::try_join!(
			self.get_eth2_config(),
			self.provider.beacon_finality_checkpoints("head")
		)?;
		let now = chrono::Utc::now().timestamp().max(0) as u64;
		Ok(BeaconHead {
			epoch: config.epoch_at(now),
			finalized_epoch: checkpoints.data.finalized.epoch,
			justified_epoch: checkpoints.data.current_justified.epoch,
			previous_justified_epoch: checkpoints.data.previous_justified.epoch,
		})
	}

	async fn get_validator_status(
		&self,
		pubkey: &ValidatorPubkey,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError> {
		self.get_validator_status_by_id(&pubkey.hex_with_prefix(), opts)
			.await
	}

	async fn get_validator_status_by_index(
		&self,
		index: &str,
		opts: Option<ValidatorStatusOptions>,
	) -> Result<ValidatorStatus, BlockChainError> {
		self.get_validator_status_by_id(index, opts).await
	}

	async fn get_validator_statuses(
		&self,
		pubkeys: &[ValidatorPubkey],
		opts: Option<ValidatorStatusOptions>,
	) -> Result<HashMap<ValidatorPubkey, ValidatorStatus>, BlockChainError> {
		let mut unique: Vec<&ValidatorPubkey> = Vec::with_capacity(pubkeys.len());
		for pubkey in pubkeys {
			if pubkey.is_null() || unique.contains(&pubkey) {
				continue;
			}
			unique.push(pubkey);
		}
		let ids: Vec<String> = unique.iter().map(|p| p.hex_with_prefix()).collect();

		let validators = self.get_validators_by_opts(&ids, opts).await?;

		let mut statuses = HashMap::with_capacity(validators.data.len() + 1);
		for validator in &validators.data {
			let status = validator_status(validator)?;
			if status.pubkey.is_null() {
				continue;
			}
			statuses.insert(status.pubkey, status);
		}
		statuses.insert(ValidatorPubkey::default(), ValidatorStatus::default());
		Ok(statuses)
	}

	async fn get_validator_index(
		&self,
		pubkey: &ValidatorPubkey,
	) -> Result<String, BlockChainError> {
		let id = pubkey.hex_with_prefix();
		let validators = self.get_validators_by_opts(&[id.clone()], None).await?;
		validators
			.data
			.into_iter()
			.next()
			.map(|validator| validator.index)
			.ok_or_else(|| {
				BlockChainError::not_found(format!("validator {} index not found", id), None, None)
			})
	}

	async fn get_validator_sync_duties(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<HashMap<String, bool>, BlockChainError> {
		let response = self
			.provider
			.validator_duties_sync_post(indices, epoch)
			.await?;
		Ok(indices
			.iter()
			.map(|index| {
				let has_duty = response
					.data
					.iter()
					.any(|duty| &duty.validator_index == index);
				(index.clone(), has_duty)
			})
			.collect())
	}

	async fn get_validator_proposer_duties(
		&self,
		indices: &[String],
		epoch: u64,
	) -> Result<HashMap<String, u64>, BlockChainError> {
		let response = self.provider.validator_duties_proposer(epoch).await?;
		Ok(indices
			.iter()
			.map(|index| {
				let count = response
					.data
					.iter()
					.filter(|duty| &duty.validator_index == index)
					.count() as u64;
				(index.clone(), count)
			})
			.collect())
	}

	async fn get_domain_data(
		&self,
		domain_type: &[u8],
		_epoch: u64,
		use_genesis_fork: bool,
	) -> Result<B256, BlockChainError> {
		let (genesis, spec) =
			tokio::try_join!(self.provider.beacon_genesis(), self.provider.config_spec())?;

		let fork_version = if use_genesis_fork {
			genesis.data.genesis_fork_version
		} else {
			spec.data.capella_fork_version
		};

		let mut domain = [0u8; DOMAIN_TYPE_LENGTH];
		let len = domain_type.len().min(DOMAIN_TYPE_LENGTH);
		domain[..len].copy_from_slice(&domain_type[..len]);
		compute_domain(domain, &fork_version, &genesis.data.genesis_validators_root)
	}

	async fn exit_validator(
		&self,
		validator_index: &str,
		epoch: u64,
		signature: &ValidatorSignature,
	) -> Result<(), BlockChainError> {
		self.provider
			.beacon_voluntary_exits_post(VoluntaryExitRequest {
				message: VoluntaryExitMessage {
					epoch,
					validator_index: validator_index.to_string(),
				},
				signature: signature.as_bytes().to_vec(),
			})
			.await
	}

	async fn close(&self) -> Result<(), BlockChainError> {
		Ok(())
	}

	async fn get_eth1_data_for_eth2_block(
		&self,
		block_id: &str,
	) -> Result<(Eth1Data, bool), BlockChainError> {
		let (response, exists) = self.provider.beacon_block(block_id).await?;
		if !exists {
			return Ok((Eth1Data::default(), false));
		}
		let eth1_data = &response.data.message.body.eth1_data;
		Ok((
			Eth1Data {
				deposit_root: bytes_to_hash(&eth1_data.deposit_root),
				deposit_count: eth1_data.deposit_count,
				block_hash: bytes_to_hash(&eth1_data.block_hash),
			},
			true,
		))
	}

	async fn get_committees_for_epoch(
		&self,
		epoch: Option<u64>,
	) -> Result<Committees, BlockChainError> {
		let response = self.provider.beacon_committees("head", epoch).await?;
		Ok(Committees {
			committees: response
				.data
				.into_iter()
				.map(|committee| Committee {
					index: committee.index,
					slot: committee.slot,
					validators: committee.validators,
				})
				.collect(),
		})
	}

	async fn change_withdrawal_credentials(
		&self,
		validator_index: &str,
		from_bls_pubkey: &ValidatorPubkey,
		to_execution_address: Address,
		signature: &ValidatorSignature,
	) -> Result<(), BlockChainError> {
		self.provider
			.beacon_bls_to_execution_changes_post(BlsToExecutionChangeRequest {
				message: BlsToExecutionChangeMessage {
					validator_index: validator_index.to_string(),
					from_bls_pubkey: from_bls_pubkey.as_bytes().to_vec(),
					to_execution_address: to_execution_address.to_vec(),
				},
				signature: signature.as_bytes().to_vec(),
			})
			.await
	}
}
