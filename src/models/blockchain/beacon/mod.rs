//! Beacon (consensus layer) data structures.
//!
//! - `types`: domain values returned by the beacon client
//! - `api`: request/response bodies of the standard Beacon node REST API

pub mod api;
mod types;

pub use types::{
	bytes_to_address, bytes_to_hash, AttestationInfo, BeaconBlock, BeaconBlockHeader, BeaconHead,
	Committee, Committees, Eth1Data, Eth2Config, Eth2DepositContract, SyncStatus,
	ValidatorPubkey, ValidatorSignature, ValidatorState, ValidatorStatus, ValidatorStatusOptions,
	VALIDATOR_PUBKEY_LENGTH, VALIDATOR_SIGNATURE_LENGTH,
};
