//! Candidate transaction data structures.
//!
//! A [`TransactionInfo`] is a fully simulated, not yet signed transaction. A
//! [`TransactionSubmission`] pairs it with the gas limit that will be used when it is sent.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Outcome of simulating a transaction against the execution client
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
	/// False when the transaction was built without a sender, so no simulation was run
	pub is_simulated: bool,
	/// Raw gas estimate returned by the node
	pub estimated_gas_limit: u64,
	/// Gas limit with the configured safety margin applied
	pub safe_gas_limit: u64,
	/// Revert reason or estimation failure; empty on success
	pub simulation_error: String,
}

impl SimulationResult {
	/// A result for a transaction that was not simulated
	pub fn not_simulated() -> Self {
		Self::default()
	}

	/// A simulated transaction that would fail
	pub fn failed(error: impl Into<String>) -> Self {
		Self {
			is_simulated: true,
			simulation_error: error.into(),
			..Default::default()
		}
	}

	/// A simulated transaction that would succeed
	pub fn succeeded(estimated_gas_limit: u64, safe_gas_limit: u64) -> Self {
		Self {
			is_simulated: true,
			estimated_gas_limit,
			safe_gas_limit,
			simulation_error: String::new(),
		}
	}

	pub fn is_success(&self) -> bool {
		self.is_simulated && self.simulation_error.is_empty()
	}
}

/// A candidate transaction
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
	/// Call data
	pub data: Bytes,
	/// Target contract or account
	pub to: Address,
	/// Value to send along, in wei
	pub value: U256,
	#[serde(rename = "simulationResult")]
	pub simulation: SimulationResult,
}

/// A candidate transaction together with the gas limit to submit it with
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSubmission {
	pub tx_info: TransactionInfo,
	pub gas_limit: u64,
}

impl TransactionSubmission {
	/// Creates a submission that uses the simulated safe gas limit
	pub fn from_info(tx_info: TransactionInfo) -> Self {
		let gas_limit = tx_info.simulation.safe_gas_limit;
		Self { tx_info, gas_limit }
	}
}
