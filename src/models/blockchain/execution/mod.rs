//! Execution layer (JSON-RPC) data structures.
//!
//! These types mirror the objects returned by a standard Ethereum JSON-RPC endpoint. Quantities
//! are kept in their hex-encoded alloy primitive form and exposed as native integers through
//! accessor methods.

mod block;
mod call;
mod log;
mod sync;
mod transaction;

pub use block::{BlockHeader, BlockTag};
pub use call::CallRequest;
pub use log::{Log, LogFilter};
pub use sync::SyncProgress;
pub use transaction::{
	Transaction, TransactionReceipt, RECEIPT_STATUS_FAILED, RECEIPT_STATUS_SUCCESSFUL,
};
