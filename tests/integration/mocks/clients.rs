//! Mock implementations of the client and signer traits.
//!
//! - [`MockExecutionClient`] - Mock implementation of the execution client
//! - [`MockBeaconClient`] - Mock implementation of the Beacon client
//! - [`MockTransactionSigner`] - Mock implementation of a transaction signer
//!
//! These mocks allow testing the managers without network connections.

use std::collections::HashMap;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use mockall::mock;

use chain_client_manager::{
	models::{
		AttestationInfo, BeaconBlock, BeaconBlockHeader, BeaconHead, BlockHeader, BlockTag,
		CallRequest, Committees, Eth1Data, Eth2Config, Eth2DepositContract, Log, LogFilter,
		SyncProgress, SyncStatus, Transaction, TransactionReceipt, ValidatorPubkey,
		ValidatorSignature, ValidatorStatus, ValidatorStatusOptions,
	},
	services::{
		blockchain::{BeaconClient, BlockChainError, ExecutionClient},
		transaction::{SignedTransaction, TransactionError, TransactionSigner},
	},
};

mock! {
	/// Mock implementation of the execution client.
	pub ExecutionClient {}

	#[async_trait]
	impl ExecutionClient for ExecutionClient {
		async fn chain_id(&self) -> Result<u64, BlockChainError>;
		async fn block_number(&self) -> Result<u64, BlockChainError>;
		async fn code_at(&self, address: Address, block: BlockTag) -> Result<Bytes, BlockChainError>;
		async fn call_contract(&self, call: CallRequest, block: BlockTag) -> Result<Bytes, BlockChainError>;
		async fn estimate_gas(&self, call: CallRequest) -> Result<u64, BlockChainError>;
		async fn pending_nonce_at(&self, address: Address) -> Result<u64, BlockChainError>;
		async fn nonce_at(&self, address: Address, block: BlockTag) -> Result<u64, BlockChainError>;
		async fn balance_at(&self, address: Address, block: BlockTag) -> Result<U256, BlockChainError>;
		async fn suggest_gas_price(&self) -> Result<U256, BlockChainError>;
		async fn suggest_gas_tip_cap(&self) -> Result<U256, BlockChainError>;
		async fn header_by_number(&self, block: BlockTag) -> Result<BlockHeader, BlockChainError>;
		async fn header_by_hash(&self, hash: B256) -> Result<BlockHeader, BlockChainError>;
		async fn transaction_by_hash(&self, hash: B256) -> Result<(Transaction, bool), BlockChainError>;
		async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, BlockChainError>;
		async fn filter_logs(&self, filter: LogFilter) -> Result<Vec<Log>, BlockChainError>;
		async fn sync_progress(&self) -> Result<Option<SyncProgress>, BlockChainError>;
		async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, BlockChainError>;
	}
}

mock! {
	/// Mock implementation of the Beacon client.
	pub BeaconClient {}

	#[async_trait]
	impl BeaconClient for BeaconClient {
		async fn get_sync_status(&self) -> Result<SyncStatus, BlockChainError>;
		async fn get_eth2_config(&self) -> Result<Eth2Config, BlockChainError>;
		async fn get_eth2_deposit_contract(&self) -> Result<Eth2DepositContract, BlockChainError>;
		async fn get_attestations(&self, block_id: &str) -> Result<(Vec<AttestationInfo>, bool), BlockChainError>;
		async fn get_beacon_block(&self, block_id: &str) -> Result<(BeaconBlock, bool), BlockChainError>;
		async fn get_beacon_block_header(&self, block_id: &str) -> Result<(BeaconBlockHeader, bool), BlockChainError>;
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
		async fn get_validator_statuses(
			&self,
			pubkeys: &[ValidatorPubkey],
			opts: Option<ValidatorStatusOptions>,
		) -> Result<HashMap<ValidatorPubkey, ValidatorStatus>, BlockChainError>;
		async fn get_validator_index(&self, pubkey: &ValidatorPubkey) -> Result<String, BlockChainError>;
		async fn get_validator_sync_duties(
			&self,
			indices: &[String],
			epoch: u64,
		) -> Result<HashMap<String, bool>, BlockChainError>;
		async fn get_validator_proposer_duties(
			&self,
			indices: &[String],
			epoch: u64,
		) -> Result<HashMap<String, u64>, BlockChainError>;
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
		async fn get_eth1_data_for_eth2_block(&self, block_id: &str) -> Result<(Eth1Data, bool), BlockChainError>;
		async fn get_committees_for_epoch(&self, epoch: Option<u64>) -> Result<Committees, BlockChainError>;
		async fn change_withdrawal_credentials(
			&self,
			validator_index: &str,
			from_bls_pubkey: &ValidatorPubkey,
			to_execution_address: Address,
			signature: &ValidatorSignature,
		) -> Result<(), BlockChainError>;
	}
}

mock! {
	/// Mock implementation of a transaction signer.
	pub TransactionSigner {}

	#[async_trait]
	impl TransactionSigner for TransactionSigner {
		fn address(&self) -> Address;
		async fn sign(&self, request: CallRequest) -> Result<SignedTransaction, TransactionError>;
	}
}

/// A disconnection as the transports report it
pub fn disconnected() -> BlockChainError {
	BlockChainError::connection_error("connection refused", None, None)
}

/// A signer for `address` that derives the hash of each transaction from its nonce
pub fn nonce_hashing_signer(address: Address) -> MockTransactionSigner {
	let mut signer = MockTransactionSigner::new();
	signer.expect_address().return_const(address);
	signer.expect_sign().returning(|request| {
		let nonce = request.nonce().unwrap_or_default();
		Ok(SignedTransaction {
			hash: B256::with_last_byte(nonce as u8),
			raw: Bytes::from(nonce.to_be_bytes().to_vec()),
			nonce,
		})
	});
	signer
}
