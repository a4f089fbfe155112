//! Transaction signing boundary.
//!
//! The transaction manager never holds keys. It fills in a [`CallRequest`] and hands it to the
//! [`TransactionSigner`] carried by the caller's [`TransactOpts`].

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::{fmt, sync::Arc};

use crate::{models::CallRequest, services::transaction::error::TransactionError};

/// A signed, serialized transaction
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub hash: B256,
	/// EIP-2718 encoded transaction, ready for `eth_sendRawTransaction`
	pub raw: Bytes,
	pub nonce: u64,
}

/// Signs fully populated transaction requests on behalf of one account
#[async_trait]
pub trait TransactionSigner: Send + Sync {
	/// The account whose key signs
	fn address(&self) -> Address;

	/// Signs `request`; nonce, gas limit, fee fields and chain id are always set
	async fn sign(&self, request: CallRequest) -> Result<SignedTransaction, TransactionError>;
}

/// Sender context of a transaction
///
/// Unset nonce, fee and gas fields are filled from the chain when the transaction is built.
/// `value` is only used for simulation; execution takes the value of the transaction info.
#[derive(Clone, Default)]
pub struct TransactOpts {
	pub from: Address,
	pub nonce: Option<u64>,
	pub signer: Option<Arc<dyn TransactionSigner>>,
	/// Legacy gas price; when set, no EIP-1559 fee fields are used
	pub gas_price: Option<U256>,
	pub gas_fee_cap: Option<U256>,
	pub gas_tip_cap: Option<U256>,
	pub gas_limit: Option<u64>,
	pub value: Option<U256>,
	/// Sign only, do not broadcast
	pub no_send: bool,
}

impl TransactOpts {
	/// Options for the signer's own account
	pub fn new(signer: Arc<dyn TransactionSigner>) -> Self {
		Self {
			from: signer.address(),
			signer: Some(signer),
			..Default::default()
		}
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = Some(value);
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = Some(nonce);
		self
	}
}

impl fmt::Debug for TransactOpts {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TransactOpts")
			.field("from", &self.from)
			.field("nonce", &self.nonce)
			.field("signer", &self.signer.as_ref().map(|s| s.address()))
			.field("gas_price", &self.gas_price)
			.field("gas_fee_cap", &self.gas_fee_cap)
			.field("gas_tip_cap", &self.gas_tip_cap)
			.field("gas_limit", &self.gas_limit)
			.field("value", &self.value)
			.field("no_send", &self.no_send)
			.finish()
	}
}
