//! Client implementations for the two layers of the chain:
//!
//! - `execution`: JSON-RPC client of an execution node
//! - `beacon`: REST client of a consensus (Beacon) node
//!
//! Each layer has a client trait, a concrete implementation and a manager that fronts a
//! primary/fallback pair of clients.

pub mod beacon;
pub mod execution;

pub use beacon::{
	BeaconApiProvider, BeaconClient, BeaconClientManager, BeaconHttpProvider,
	StandardBeaconClient,
};
pub use execution::{EvmClient, ExecutionClient, ExecutionClientManager, LogSubscription};
