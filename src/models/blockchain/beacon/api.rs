//! Wire format of the standard Beacon node REST API.
//!
//! Numeric fields are transferred as quoted decimal strings and byte fields as `0x`-prefixed
//! hex strings. Fields the client never reads are not modelled; unknown fields are ignored.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Serde helpers for quoted decimal integers (`"123"`)
pub mod quoted_u64 {
	use serde::{de, Deserialize, Deserializer, Serializer};

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Quoted {
		Text(String),
		Number(u64),
	}

	pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
		match Quoted::deserialize(deserializer)? {
			Quoted::Text(text) => text.parse::<u64>().map_err(de::Error::custom),
			Quoted::Number(n) => Ok(n),
		}
	}

	/// Same encoding for a list of integers
	pub mod vec {
		use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

		pub fn serialize<S: Serializer>(values: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
			let mut seq = serializer.serialize_seq(Some(values.len()))?;
			for value in values {
				seq.serialize_element(&value.to_string())?;
			}
			seq.end()
		}

		pub fn deserialize<'de, D: Deserializer<'de>>(
			deserializer: D,
		) -> Result<Vec<u64>, D::Error> {
			#[derive(Deserialize)]
			struct Wrapper(#[serde(with = "super")] u64);

			let values = Vec::<Wrapper>::deserialize(deserializer)?;
			Ok(values.into_iter().map(|w| w.0).collect())
		}
	}
}

/// Serde helpers for `0x`-prefixed hex byte strings
pub mod hex_bytes {
	use serde::{de, Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer, T: AsRef<[u8]>>(
		value: &T,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format!("0x{}", hex::encode(value.as_ref())))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let text = String::deserialize(deserializer)?;
		hex::decode(text.trim_start_matches("0x")).map_err(de::Error::custom)
	}
}

// Requests

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoluntaryExitMessage {
	#[serde(with = "quoted_u64")]
	pub epoch: u64,
	pub validator_index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoluntaryExitRequest {
	pub message: VoluntaryExitMessage,
	#[serde(with = "hex_bytes")]
	pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsToExecutionChangeMessage {
	pub validator_index: String,
	#[serde(with = "hex_bytes")]
	pub from_bls_pubkey: Vec<u8>,
	#[serde(with = "hex_bytes")]
	pub to_execution_address: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsToExecutionChangeRequest {
	pub message: BlsToExecutionChangeMessage,
	#[serde(with = "hex_bytes")]
	pub signature: Vec<u8>,
}

// Responses

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusData {
	pub is_syncing: bool,
	#[serde(with = "quoted_u64")]
	pub head_slot: u64,
	#[serde(with = "quoted_u64")]
	pub sync_distance: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusResponse {
	pub data: SyncStatusData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth2ConfigData {
	#[serde(rename = "SECONDS_PER_SLOT", with = "quoted_u64")]
	pub seconds_per_slot: u64,
	#[serde(rename = "SLOTS_PER_EPOCH", with = "quoted_u64")]
	pub slots_per_epoch: u64,
	#[serde(rename = "EPOCHS_PER_SYNC_COMMITTEE_PERIOD", with = "quoted_u64")]
	pub epochs_per_sync_committee_period: u64,
	#[serde(rename = "CAPELLA_FORK_VERSION", with = "hex_bytes")]
	pub capella_fork_version: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth2ConfigResponse {
	pub data: Eth2ConfigData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth2DepositContractData {
	#[serde(with = "quoted_u64")]
	pub chain_id: u64,
	pub address: Address,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth2DepositContractResponse {
	pub data: Eth2DepositContractData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisData {
	#[serde(with = "quoted_u64")]
	pub genesis_time: u64,
	#[serde(with = "hex_bytes")]
	pub genesis_fork_version: Vec<u8>,
	#[serde(with = "hex_bytes")]
	pub genesis_validators_root: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisResponse {
	pub data: GenesisData,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
	#[serde(with = "quoted_u64")]
	pub epoch: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityCheckpointsData {
	pub previous_justified: Checkpoint,
	pub current_justified: Checkpoint,
	pub finalized: Checkpoint,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityCheckpointsResponse {
	pub data: FinalityCheckpointsData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationData {
	#[serde(with = "quoted_u64")]
	pub slot: u64,
	#[serde(with = "quoted_u64")]
	pub index: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
	/// Hex bitlist, decoded by the client so a malformed entry can be reported by position
	pub aggregation_bits: String,
	pub data: AttestationData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationsResponse {
	pub data: Vec<Attestation>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth1DataResponse {
	#[serde(with = "hex_bytes")]
	pub deposit_root: Vec<u8>,
	#[serde(with = "quoted_u64")]
	pub deposit_count: u64,
	#[serde(with = "hex_bytes")]
	pub block_hash: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayloadSummary {
	#[serde(with = "hex_bytes")]
	pub fee_recipient: Vec<u8>,
	#[serde(with = "quoted_u64")]
	pub block_number: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockBody {
	pub eth1_data: Eth1DataResponse,
	#[serde(default)]
	pub attestations: Vec<Attestation>,
	#[serde(default)]
	pub execution_payload: Option<ExecutionPayloadSummary>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockMessage {
	#[serde(with = "quoted_u64")]
	pub slot: u64,
	pub proposer_index: String,
	pub body: BeaconBlockBody,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBeaconBlock {
	pub message: BeaconBlockMessage,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockResponse {
	pub data: SignedBeaconBlock,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeaderMessage {
	#[serde(with = "quoted_u64")]
	pub slot: u64,
	pub proposer_index: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBeaconBlockHeader {
	pub message: BeaconBlockHeaderMessage,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeaderData {
	#[serde(default)]
	pub root: String,
	#[serde(default)]
	pub canonical: bool,
	pub header: SignedBeaconBlockHeader,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeaderResponse {
	#[serde(default)]
	pub finalized: bool,
	pub data: BeaconBlockHeaderData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorData {
	#[serde(with = "hex_bytes")]
	pub pubkey: Vec<u8>,
	#[serde(with = "hex_bytes")]
	pub withdrawal_credentials: Vec<u8>,
	#[serde(with = "quoted_u64")]
	pub effective_balance: u64,
	pub slashed: bool,
	#[serde(with = "quoted_u64")]
	pub activation_eligibility_epoch: u64,
	#[serde(with = "quoted_u64")]
	pub activation_epoch: u64,
	#[serde(with = "quoted_u64")]
	pub exit_epoch: u64,
	#[serde(with = "quoted_u64")]
	pub withdrawable_epoch: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
	pub index: String,
	#[serde(with = "quoted_u64")]
	pub balance: u64,
	pub status: String,
	pub validator: ValidatorData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorsResponse {
	pub data: Vec<Validator>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDuty {
	#[serde(with = "hex_bytes")]
	pub pubkey: Vec<u8>,
	pub validator_index: String,
	#[serde(with = "quoted_u64::vec", default)]
	pub validator_sync_committee_indices: Vec<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDutiesResponse {
	pub data: Vec<SyncDuty>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerDuty {
	pub validator_index: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerDutiesResponse {
	pub data: Vec<ProposerDuty>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeData {
	#[serde(with = "quoted_u64")]
	pub index: u64,
	#[serde(with = "quoted_u64")]
	pub slot: u64,
	pub validators: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteesResponse {
	pub data: Vec<CommitteeData>,
}
