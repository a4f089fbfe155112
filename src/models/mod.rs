//! Domain models and data structures.
//!
//! This module contains the data structures used throughout the crate:
//!
//! - `blockchain`: Execution layer and Beacon chain types
//! - `config`: Configuration loading and validation
//! - `core`: Client health reports
//! - `transaction`: Simulated candidate transactions

mod blockchain;
mod config;
mod core;
mod transaction;

// Re-export blockchain types
pub use blockchain::{beacon, ClientKind};

pub use blockchain::execution::{
	BlockHeader, BlockTag, CallRequest, Log, LogFilter, SyncProgress, Transaction,
	TransactionReceipt, RECEIPT_STATUS_FAILED, RECEIPT_STATUS_SUCCESSFUL,
};

pub use blockchain::beacon::{
	AttestationInfo, BeaconBlock, BeaconBlockHeader, BeaconHead, Committee, Committees, Eth1Data,
	Eth2Config, Eth2DepositContract, SyncStatus, ValidatorPubkey, ValidatorSignature,
	ValidatorState, ValidatorStatus, ValidatorStatusOptions,
};

// Re-export core types
pub use core::{ClientManagerStatus, ClientStatus};

// Re-export transaction types
pub use transaction::{SimulationResult, TransactionInfo, TransactionSubmission};

// Re-export config types
pub use config::{
	BeaconClientConfig, ClientManagerConfig, ConfigError, ConfigLoader, ExecutionClientConfig,
	DEFAULT_BLOCK_GAS_LIMIT, DEFAULT_CLIENT_TIMEOUT_MS, DEFAULT_SAFE_GAS_MULTIPLIER,
};
