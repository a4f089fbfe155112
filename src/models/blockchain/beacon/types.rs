//! Beacon chain domain types.
//!
//! These are the values handed to callers of the beacon client. They are decoupled from the REST
//! wire format (see the `api` module) so that a different provider can produce them.

use alloy::primitives::{Address, B256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Length of a BLS12-381 public key
pub const VALIDATOR_PUBKEY_LENGTH: usize = 48;
/// Length of a BLS12-381 signature
pub const VALIDATOR_SIGNATURE_LENGTH: usize = 96;

/// Beacon node sync status
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SyncStatus {
	pub syncing: bool,
	/// Fraction of the chain the node has synced, in `[0, 1]`
	pub progress: f64,
}

/// Chain parameters needed to reason about slots and epochs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Eth2Config {
	pub genesis_fork_version: Vec<u8>,
	pub genesis_validators_root: Vec<u8>,
	pub genesis_epoch: u64,
	pub genesis_time: u64,
	pub seconds_per_slot: u64,
	pub slots_per_epoch: u64,
	pub seconds_per_epoch: u64,
	pub epochs_per_sync_committee_period: u64,
}

impl Eth2Config {
	/// Epoch that contains the given unix timestamp
	///
	/// Timestamps before genesis map to the genesis epoch.
	pub fn epoch_at(&self, time: u64) -> u64 {
		if self.seconds_per_epoch == 0 {
			return self.genesis_epoch;
		}
		self.genesis_epoch + time.saturating_sub(self.genesis_time) / self.seconds_per_epoch
	}

	/// First slot of the given epoch
	pub fn first_slot_of_epoch(&self, epoch: u64) -> u64 {
		epoch * self.slots_per_epoch
	}
}

/// Deposit contract the beacon chain follows
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Eth2DepositContract {
	pub chain_id: u64,
	pub address: Address,
}

/// Current epoch plus finality information
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BeaconHead {
	pub epoch: u64,
	pub finalized_epoch: u64,
	pub justified_epoch: u64,
	pub previous_justified_epoch: u64,
}

/// Validator lifecycle states as reported by the standard API
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorState {
	PendingInitialized,
	PendingQueued,
	ActiveOngoing,
	ActiveExiting,
	ActiveSlashed,
	ExitedUnslashed,
	ExitedSlashed,
	WithdrawalPossible,
	WithdrawalDone,
	#[default]
	#[serde(other)]
	Unknown,
}

impl FromStr for ValidatorState {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(serde_json::from_value(serde_json::Value::String(s.to_string()))
			.unwrap_or(ValidatorState::Unknown))
	}
}

/// A validator's BLS public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidatorPubkey(pub [u8; VALIDATOR_PUBKEY_LENGTH]);

impl Default for ValidatorPubkey {
	fn default() -> Self {
		Self([0u8; VALIDATOR_PUBKEY_LENGTH])
	}
}

impl ValidatorPubkey {
	/// Builds a pubkey from raw bytes, which must be exactly 48 bytes long
	pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
		let array: [u8; VALIDATOR_PUBKEY_LENGTH] = bytes.try_into().map_err(|_| {
			format!(
				"invalid validator pubkey length {}; expected {}",
				bytes.len(),
				VALIDATOR_PUBKEY_LENGTH
			)
		})?;
		Ok(Self(array))
	}

	/// Parses a hex string, with or without the `0x` prefix
	pub fn from_hex(value: &str) -> Result<Self, String> {
		let bytes = hex::decode(value.trim_start_matches("0x"))
			.map_err(|e| format!("invalid validator pubkey hex: {}", e))?;
		Self::from_slice(&bytes)
	}

	/// The all-zero key, used as a placeholder for "no validator"
	pub fn is_null(&self) -> bool {
		self.0.iter().all(|b| *b == 0)
	}

	pub fn hex(&self) -> String {
		hex::encode(self.0)
	}

	pub fn hex_with_prefix(&self) -> String {
		format!("0x{}", self.hex())
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for ValidatorPubkey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.hex_with_prefix())
	}
}

impl fmt::Debug for ValidatorPubkey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ValidatorPubkey({})", self.hex_with_prefix())
	}
}

impl Serialize for ValidatorPubkey {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.hex_with_prefix())
	}
}

impl<'de> Deserialize<'de> for ValidatorPubkey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = String::deserialize(deserializer)?;
		Self::from_hex(&value).map_err(de::Error::custom)
	}
}

/// A BLS signature over a validator message
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ValidatorSignature(pub [u8; VALIDATOR_SIGNATURE_LENGTH]);

impl Default for ValidatorSignature {
	fn default() -> Self {
		Self([0u8; VALIDATOR_SIGNATURE_LENGTH])
	}
}

impl ValidatorSignature {
	pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
		let array: [u8; VALIDATOR_SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
			format!(
				"invalid validator signature length {}; expected {}",
				bytes.len(),
				VALIDATOR_SIGNATURE_LENGTH
			)
		})?;
		Ok(Self(array))
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Debug for ValidatorSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ValidatorSignature(0x{})", hex::encode(self.0))
	}
}

/// Selects the beacon state a validator lookup is made against
///
/// When passed to a lookup, `slot` takes precedence over `epoch`; at least one must be set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorStatusOptions {
	pub epoch: Option<u64>,
	pub slot: Option<u64>,
}

/// A validator's state at a given point of the beacon chain
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidatorStatus {
	pub pubkey: ValidatorPubkey,
	pub index: String,
	pub withdrawal_credentials: B256,
	pub balance: u64,
	pub status: ValidatorState,
	pub effective_balance: u64,
	pub slashed: bool,
	pub activation_eligibility_epoch: u64,
	pub activation_epoch: u64,
	pub exit_epoch: u64,
	pub withdrawable_epoch: u64,
	/// False when the beacon node does not know this validator
	pub exists: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttestationInfo {
	pub aggregation_bits: Vec<u8>,
	pub slot_index: u64,
	pub committee_index: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BeaconBlockHeader {
	pub slot: u64,
	pub proposer_index: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BeaconBlock {
	pub header: BeaconBlockHeader,
	pub attestations: Vec<AttestationInfo>,
	pub fee_recipient: Address,
	pub execution_block_number: u64,
	/// Pre-merge blocks carry no execution payload
	pub has_execution_payload: bool,
}

/// Execution chain snapshot voted into a beacon block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Eth1Data {
	pub deposit_root: B256,
	pub deposit_count: u64,
	pub block_hash: B256,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Committee {
	pub index: u64,
	pub slot: u64,
	pub validators: Vec<String>,
}

/// Attestation committees of an epoch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Committees {
	pub committees: Vec<Committee>,
}

impl Committees {
	pub fn count(&self) -> usize {
		self.committees.len()
	}

	pub fn index(&self, position: usize) -> Option<u64> {
		self.committees.get(position).map(|c| c.index)
	}

	pub fn slot(&self, position: usize) -> Option<u64> {
		self.committees.get(position).map(|c| c.slot)
	}

	pub fn validators(&self, position: usize) -> Option<&[String]> {
		self.committees.get(position).map(|c| c.validators.as_slice())
	}
}

/// Converts a byte slice into a 32 byte hash, keeping the trailing bytes when it is too long and
/// left-padding with zeroes when it is too short.
pub fn bytes_to_hash(bytes: &[u8]) -> B256 {
	let start = bytes.len().saturating_sub(32);
	B256::left_padding_from(&bytes[start..])
}

/// Same as [`bytes_to_hash`] for 20 byte addresses
pub fn bytes_to_address(bytes: &[u8]) -> Address {
	let start = bytes.len().saturating_sub(20);
	Address::left_padding_from(&bytes[start..])
}
