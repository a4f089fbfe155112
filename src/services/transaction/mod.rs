//! Transaction service.
//!
//! - `manager`: [`TransactionManager`], gas sizing, execution and inclusion waits
//! - `signer`: [`TransactOpts`] and the [`TransactionSigner`] wallet boundary
//! - `revert`: readable revert messages

mod error;
mod manager;
mod revert;
mod signer;

pub use error::TransactionError;
pub use manager::{
	create_tx_submission_from_info, TransactionManager, RECEIPT_POLL_INTERVAL,
	TRANSACTION_LOOKUP_ATTEMPTS, TRANSACTION_LOOKUP_INTERVAL,
};
pub use revert::normalize_revert_message;
pub use signer::{SignedTransaction, TransactOpts, TransactionSigner};
