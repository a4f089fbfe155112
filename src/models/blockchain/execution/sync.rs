//! Execution client sync progress.

use alloy::primitives::U64;
use serde::{Deserialize, Serialize};

/// Sync progress reported by `eth_syncing` while the node is still syncing
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
	pub starting_block: U64,
	pub current_block: U64,
	pub highest_block: U64,
}

impl SyncProgress {
	/// Fraction of blocks synced, clamped to `[0, 1]`
	pub fn progress(&self) -> f64 {
		let highest = self.highest_block.to::<u64>();
		if highest == 0 {
			return 0.0;
		}
		let ratio = self.current_block.to::<u64>() as f64 / highest as f64;
		ratio.min(1.0)
	}
}
