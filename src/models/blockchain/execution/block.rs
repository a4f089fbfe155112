//! Execution layer block header and block selector types.

use alloy::primitives::{Address, B256, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Block header as returned by `eth_getBlockByNumber` / `eth_getBlockByHash` (without bodies)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
	/// Hash of the block. None if pending.
	pub hash: Option<B256>,
	/// Hash of the parent
	pub parent_hash: B256,
	/// Block number. None if pending.
	pub number: Option<U64>,
	/// Unix timestamp, in seconds
	pub timestamp: U64,
	/// Gas limit of the block
	#[serde(default)]
	pub gas_limit: U64,
	/// Gas used by all transactions in the block
	#[serde(default)]
	pub gas_used: U64,
	/// Base fee per unit of gas (if past London)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_fee_per_gas: Option<U256>,
	/// Fee recipient
	#[serde(rename = "miner", default)]
	pub miner: Address,
	/// State root hash
	#[serde(default)]
	pub state_root: B256,
}

impl BlockHeader {
	pub fn number(&self) -> u64 {
		self.number.map(|n| n.to::<u64>()).unwrap_or_default()
	}

	pub fn timestamp(&self) -> u64 {
		self.timestamp.to::<u64>()
	}
}

/// Selects the block a read is executed against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockTag {
	/// The most recent block in the canonical chain
	#[default]
	Latest,
	/// The pending state
	Pending,
	/// A specific block number
	Number(u64),
}

impl BlockTag {
	/// Converts the tag to its JSON-RPC representation
	pub fn to_rpc_param(&self) -> Value {
		match self {
			Self::Latest => Value::String("latest".to_string()),
			Self::Pending => Value::String("pending".to_string()),
			Self::Number(n) => Value::String(format!("0x{:x}", n)),
		}
	}
}

impl From<Option<u64>> for BlockTag {
	fn from(number: Option<u64>) -> Self {
		number.map(Self::Number).unwrap_or(Self::Latest)
	}
}
