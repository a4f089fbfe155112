//! Execution layer transaction and receipt data structures.

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

use super::Log;

/// Transaction object as returned by `eth_getTransactionByHash`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	/// Transaction hash
	pub hash: B256,
	/// Sender nonce
	pub nonce: U64,
	/// Hash of the including block. None when pending.
	#[serde(default)]
	pub block_hash: Option<B256>,
	/// Number of the including block. None when pending.
	#[serde(default)]
	pub block_number: Option<U64>,
	/// Sender
	pub from: Address,
	/// Recipient (None when contract creation)
	#[serde(default)]
	pub to: Option<Address>,
	/// Transferred value, in wei
	#[serde(default)]
	pub value: U256,
	/// Gas limit
	pub gas: U64,
	/// Gas price (legacy) or effective gas price once mined
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<U256>,
	/// EIP-1559 fee cap
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_fee_per_gas: Option<U256>,
	/// EIP-1559 tip cap
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<U256>,
	/// Call data
	#[serde(default)]
	pub input: Bytes,
}

impl Transaction {
	/// A transaction without an including block is still in the mempool
	pub fn is_pending(&self) -> bool {
		self.block_number.is_none()
	}

	pub fn nonce(&self) -> u64 {
		self.nonce.to::<u64>()
	}
}

/// Receipt status of a transaction that was executed successfully
pub const RECEIPT_STATUS_SUCCESSFUL: u64 = 1;
/// Receipt status of a transaction whose execution failed (it was still included)
pub const RECEIPT_STATUS_FAILED: u64 = 0;

/// Transaction receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
	/// Transaction hash
	pub transaction_hash: B256,
	/// Index within the block
	#[serde(default)]
	pub transaction_index: Option<U64>,
	/// Hash of the block this transaction was included within
	pub block_hash: Option<B256>,
	/// Number of the block this transaction was included within
	pub block_number: Option<U64>,
	/// Sender
	#[serde(default)]
	pub from: Address,
	/// Recipient (None when contract creation)
	#[serde(default)]
	pub to: Option<Address>,
	/// Cumulative gas used within the block after this was executed
	#[serde(default)]
	pub cumulative_gas_used: U256,
	/// Gas used by this transaction alone
	#[serde(default)]
	pub gas_used: Option<U256>,
	/// Contract address created, or `None` if not a deployment
	#[serde(default)]
	pub contract_address: Option<Address>,
	/// Logs generated within this transaction
	#[serde(default)]
	pub logs: Vec<Log>,
	/// Status: either 1 (success) or 0 (failure)
	pub status: Option<U64>,
	/// Effective gas price
	#[serde(default)]
	pub effective_gas_price: Option<U256>,
}

impl TransactionReceipt {
	/// Receipt status; pre-byzantium receipts without a status are reported as successful
	pub fn status(&self) -> u64 {
		self.status
			.map(|s| s.to::<u64>())
			.unwrap_or(RECEIPT_STATUS_SUCCESSFUL)
	}

	pub fn is_success(&self) -> bool {
		self.status() == RECEIPT_STATUS_SUCCESSFUL
	}
}
