//! Transaction service error types.

use alloy::primitives::B256;
use std::collections::HashMap;
use thiserror::Error as ThisError;

use crate::{
	services::blockchain::BlockChainError,
	utils::logging::error::{ErrorContext, TraceableError},
};

/// Represents possible errors raised while sizing, signing, submitting or waiting for transactions
#[derive(ThisError, Debug)]
pub enum TransactionError {
	/// The safe gas multiplier is neither 0 nor at least 1
	#[error("Invalid gas multiplier: {0}")]
	InvalidMultiplier(ErrorContext),

	/// An estimate or a computed safe limit is above the block gas limit
	#[error("Gas limit exceeded: {0}")]
	GasLimitExceeded(ErrorContext),

	/// Call data could not be ABI-encoded
	#[error("Encoding error: {0}")]
	Encoding(ErrorContext),

	/// The transaction could not be built or signed
	#[error("Signing error: {0}")]
	Signing(ErrorContext),

	/// The node refused the signed transaction
	#[error("Submission error: {0}")]
	Submission(ErrorContext),

	/// The transaction was included but its execution failed
	#[error("Transaction {hash} reverted: {context}")]
	Reverted { hash: B256, context: ErrorContext },

	/// The transaction could not be found on the node
	#[error("Transaction {hash} not found: {context}")]
	NotFound { hash: B256, context: ErrorContext },

	/// The caller cancelled the operation
	#[error("Transaction operation cancelled: {0}")]
	Cancelled(ErrorContext),

	/// An execution client call failed
	#[error(transparent)]
	Client(#[from] BlockChainError),
}

impl TransactionError {
	pub fn invalid_multiplier(multiplier: f64) -> Self {
		Self::InvalidMultiplier(ErrorContext::new_with_log(
			"multiplier cannot be less than 1",
			None,
			Some(HashMap::from([(
				"multiplier".to_string(),
				multiplier.to_string(),
			)])),
		))
	}

	pub fn gas_limit_exceeded(msg: impl Into<String>) -> Self {
		Self::GasLimitExceeded(ErrorContext::new_with_log(msg, None, None))
	}

	pub fn encoding(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Encoding(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn signing(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Signing(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn submission(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Submission(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn reverted(hash: B256, msg: impl Into<String>) -> Self {
		Self::Reverted {
			hash,
			context: ErrorContext::new_with_log(msg, None, None),
		}
	}

	pub fn not_found(hash: B256, msg: impl Into<String>) -> Self {
		Self::NotFound {
			hash,
			context: ErrorContext::new_with_log(msg, None, None),
		}
	}

	pub fn cancelled(msg: impl Into<String>) -> Self {
		Self::Cancelled(ErrorContext::new(msg, None, None))
	}
}

impl TraceableError for TransactionError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidMultiplier(ctx) => ctx.trace_id.clone(),
			Self::GasLimitExceeded(ctx) => ctx.trace_id.clone(),
			Self::Encoding(ctx) => ctx.trace_id.clone(),
			Self::Signing(ctx) => ctx.trace_id.clone(),
			Self::Submission(ctx) => ctx.trace_id.clone(),
			Self::Reverted { context, .. } => context.trace_id.clone(),
			Self::NotFound { context, .. } => context.trace_id.clone(),
			Self::Cancelled(ctx) => ctx.trace_id.clone(),
			Self::Client(err) => err.trace_id(),
		}
	}
}
