//! Blockchain data structures.
//!
//! - `execution`: JSON-RPC objects of the execution layer
//! - `beacon`: domain and REST wire types of the consensus layer

pub mod beacon;
pub mod execution;

/// The two kinds of endpoint a client manager can front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
	/// Execution layer JSON-RPC client
	Execution,
	/// Consensus layer Beacon REST client
	Beacon,
}

impl ClientKind {
	/// Human readable name, used in failover logs and errors
	pub fn name(&self) -> &'static str {
		match self {
			ClientKind::Execution => "Execution Client",
			ClientKind::Beacon => "Beacon Client",
		}
	}
}

impl std::fmt::Display for ClientKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}
