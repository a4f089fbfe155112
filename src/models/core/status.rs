//! Health reports produced by the client managers' status checks.

use serde::{Deserialize, Serialize};

/// Status of a single Execution or Beacon endpoint
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatus {
	/// The endpoint answered every status check
	pub is_working: bool,
	/// The endpoint is fully synced and can serve requests
	pub is_synced: bool,
	/// Sync progress in `[0, 1]`
	pub sync_progress: f64,
	/// Chain the endpoint is on (execution endpoints only)
	#[serde(rename = "networkId")]
	pub chain_id: u64,
	/// Reason the endpoint is not usable, empty when healthy
	pub error: String,
}

impl ClientStatus {
	/// A status describing a failed check
	pub fn failed(error: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			..Default::default()
		}
	}

	/// Whether the endpoint should receive requests
	pub fn is_ready(&self) -> bool {
		self.is_working && self.is_synced
	}
}

/// Status of a primary/fallback pair
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientManagerStatus {
	#[serde(rename = "primaryEcStatus")]
	pub primary_client_status: ClientStatus,
	#[serde(rename = "fallbackEnabled")]
	pub fallback_enabled: bool,
	#[serde(rename = "fallbackEcStatus")]
	pub fallback_client_status: ClientStatus,
}
