//! Blockchain client interfaces and implementations.
//!
//! Provides the primary/fallback failover core shared by both layers of the chain:
//!
//! - `ClientManager` capability trait and the `ClientPair` that implements it
//! - Generic failover runner (`run_function0/1/2`)
//! - Execution (JSON-RPC) and Beacon (REST) clients and their managers
//! - Network transport implementations
//! - Error handling for blockchain operations

mod error;
mod manager;
mod runner;

pub mod clients;
pub mod transports;

pub use clients::{
	BeaconApiProvider, BeaconClient, BeaconClientManager, BeaconHttpProvider, EvmClient,
	ExecutionClient, ExecutionClientManager, LogSubscription, StandardBeaconClient,
};
pub use error::BlockChainError;
pub use manager::{ClientManager, ClientPair};
pub use runner::{run_function0, run_function1, run_function2};
pub use transports::{
	is_disconnection_error, is_middleware_disconnection, BlockchainTransport,
	HttpTransportClient, RestResponse, RestTransport, TransientErrorRetryStrategy, TransportError,
};
