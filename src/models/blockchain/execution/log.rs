//! Event log and log filter types.

use alloy::primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Log emitted by a contract
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
	/// Emitting contract
	pub address: Address,
	/// Indexed topics
	pub topics: Vec<B256>,
	/// Non-indexed data
	pub data: Bytes,
	#[serde(default)]
	pub block_hash: Option<B256>,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub transaction_hash: Option<B256>,
	#[serde(default)]
	pub transaction_index: Option<U64>,
	#[serde(default)]
	pub log_index: Option<U64>,
	/// True when the log was removed by a chain reorganisation
	#[serde(default)]
	pub removed: bool,
}

/// Log filter query (`eth_getLogs`)
///
/// `topics` follows the JSON-RPC positional semantics: `None` matches anything at that position,
/// `Some(list)` matches any of the listed topics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogFilter {
	pub block_hash: Option<B256>,
	pub from_block: Option<u64>,
	pub to_block: Option<u64>,
	pub addresses: Vec<Address>,
	pub topics: Vec<Option<Vec<B256>>>,
}

impl LogFilter {
	/// Converts the filter into the single object parameter of `eth_getLogs`
	pub fn to_rpc_param(&self) -> Value {
		let mut params = Map::new();
		if let Some(hash) = self.block_hash {
			params.insert("blockHash".to_string(), json!(hash));
		} else {
			if let Some(from) = self.from_block {
				params.insert("fromBlock".to_string(), json!(format!("0x{:x}", from)));
			}
			if let Some(to) = self.to_block {
				params.insert("toBlock".to_string(), json!(format!("0x{:x}", to)));
			}
		}
		if !self.addresses.is_empty() {
			params.insert("address".to_string(), json!(self.addresses));
		}
		if !self.topics.is_empty() {
			let topics: Vec<Value> = self
				.topics
				.iter()
				.map(|position| match position {
					None => Value::Null,
					Some(options) => json!(options),
				})
				.collect();
			params.insert("topics".to_string(), Value::Array(topics));
		}
		Value::Object(params)
	}
}
