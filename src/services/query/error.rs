//! Query service error types.

use crate::{
	services::blockchain::BlockChainError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Represents possible errors raised while building or running a multicall query
#[derive(ThisError, Debug)]
pub enum QueryError {
	/// A call could not be added to the multicall (unknown method, bad arguments, ...)
	#[error("Query build error: {0}")]
	Build(ErrorContext),

	/// The multicall itself failed
	#[error("Multicall execution error: {0}")]
	Execution(ErrorContext),

	/// A single call failed in strict mode
	#[error("Call {index} failed: {context}")]
	CallFailed { index: usize, context: ErrorContext },

	/// Return data of a call could not be decoded into its output
	#[error("Decode error: {0}")]
	Decode(ErrorContext),

	/// The caller cancelled the query
	#[error("Query cancelled: {0}")]
	Cancelled(ErrorContext),

	/// The execution client rejected the multicall or every endpoint was down
	#[error(transparent)]
	Client(#[from] BlockChainError),
}

impl QueryError {
	pub fn build(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Build(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn execution(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Execution(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn call_failed(index: usize, msg: impl Into<String>) -> Self {
		Self::CallFailed {
			index,
			context: ErrorContext::new_with_log(msg, None, None),
		}
	}

	pub fn decode(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Decode(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn cancelled(msg: impl Into<String>) -> Self {
		Self::Cancelled(ErrorContext::new(msg, None, None))
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled(_))
	}
}

impl TraceableError for QueryError {
	fn trace_id(&self) -> String {
		match self {
			Self::Build(ctx) => ctx.trace_id.clone(),
			Self::Execution(ctx) => ctx.trace_id.clone(),
			Self::CallFailed { context, .. } => context.trace_id.clone(),
			Self::Decode(ctx) => ctx.trace_id.clone(),
			Self::Cancelled(ctx) => ctx.trace_id.clone(),
			Self::Client(err) => err.trace_id(),
		}
	}
}
