//! Call / transaction request parameters.

use alloy::primitives::{Address, Bytes, U256, U64};
use serde::{Deserialize, Serialize};

/// Parameters of `eth_call`, `eth_estimateGas`, and of an unsigned transaction handed to a signer
///
/// Unset fields are omitted from the JSON-RPC parameter so the node fills in its own defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub to: Option<Address>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gas: Option<U64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<U256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_fee_per_gas: Option<U256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<U256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<U256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Bytes>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<U64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<U64>,
}

impl CallRequest {
	/// A plain read call against `to`
	pub fn new(to: Address, data: Bytes) -> Self {
		Self {
			to: Some(to),
			data: Some(data),
			..Default::default()
		}
	}

	pub fn with_from(mut self, from: Address) -> Self {
		self.from = Some(from);
		self
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = Some(value);
		self
	}

	pub fn gas_limit(&self) -> Option<u64> {
		self.gas.map(|g| g.to::<u64>())
	}

	pub fn nonce(&self) -> Option<u64> {
		self.nonce.map(|n| n.to::<u64>())
	}
}
