//! Blockchain service error types and handling.
//!
//! Provides the error type returned by every Execution and Beacon client call, including the
//! two terminal failover outcomes: every endpoint failed, or no endpoint was ready.

use crate::{
	services::blockchain::transports::TransportError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors that can occur during blockchain operations
#[derive(ThisError, Debug)]
pub enum BlockChainError {
	/// The endpoint could not be reached; this is the only class that triggers failover
	#[error("Connection error: {0}")]
	ConnectionError(ErrorContext),

	/// Errors related to malformed requests or invalid responses
	#[error("Request error: {0}")]
	RequestError(ErrorContext),

	/// A requested object (block, transaction, validator, ...) does not exist
	#[error("Not found: {0}")]
	NotFound(ErrorContext),

	/// Errors related to transaction processing
	#[error("Transaction error: {0}")]
	TransactionError(ErrorContext),

	/// Internal errors within the blockchain client
	#[error("Internal error: {0}")]
	InternalError(ErrorContext),

	/// Both the primary and (if configured) the fallback endpoint were disconnected
	#[error("all {client_type}s failed")]
	AllEndpointsFailed {
		client_type: String,
		context: ErrorContext,
	},

	/// Neither endpoint is currently marked ready
	#[error("no {client_type}s were ready")]
	NoEndpointsReady {
		client_type: String,
		context: ErrorContext,
	},

	/// The caller cancelled the operation
	#[error("Operation cancelled: {0}")]
	Cancelled(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BlockChainError {
	// Connection error
	pub fn connection_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConnectionError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Request error
	pub fn request_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Not found is an expected outcome, so it is not logged
	pub fn not_found(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NotFound(ErrorContext::new(msg, source, metadata))
	}

	// Transaction error
	pub fn transaction_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::TransactionError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Internal error
	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn all_endpoints_failed(
		client_type: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	) -> Self {
		let client_type = client_type.into();
		Self::AllEndpointsFailed {
			context: ErrorContext::new_with_log(
				format!("all {}s failed", client_type),
				source,
				None,
			),
			client_type,
		}
	}

	pub fn no_endpoints_ready(client_type: impl Into<String>) -> Self {
		let client_type = client_type.into();
		Self::NoEndpointsReady {
			context: ErrorContext::new_with_log(
				format!("no {}s were ready", client_type),
				None,
				None,
			),
			client_type,
		}
	}

	pub fn cancelled(msg: impl Into<String>) -> Self {
		Self::Cancelled(ErrorContext::new(msg, None, None))
	}

	/// Whether this error means the endpoint is unreachable
	pub fn is_disconnection(&self) -> bool {
		matches!(self, Self::ConnectionError(_))
	}

	/// Whether this error reports a missing object
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}

	/// The JSON-RPC error data attached by the node, if any
	pub fn rpc_data(&self) -> Option<&serde_json::Value> {
		let source = match self {
			Self::RequestError(ctx) | Self::TransactionError(ctx) => ctx.source.as_ref()?,
			_ => return None,
		};
		match source.downcast_ref::<TransportError>() {
			Some(TransportError::Rpc { data, .. }) => data.as_ref(),
			_ => None,
		}
	}
}

impl From<TransportError> for BlockChainError {
	fn from(err: TransportError) -> Self {
		let (disconnected, message) = match &err {
			TransportError::Connection(ctx) => (true, ctx.message.clone()),
			TransportError::Rpc { message, .. } => (false, message.clone()),
			other => (false, other.to_string()),
		};
		let context = ErrorContext::new(message, Some(Box::new(err)), None);
		if disconnected {
			Self::ConnectionError(context)
		} else {
			Self::RequestError(context)
		}
	}
}

impl TraceableError for BlockChainError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConnectionError(ctx) => ctx.trace_id.clone(),
			Self::RequestError(ctx) => ctx.trace_id.clone(),
			Self::NotFound(ctx) => ctx.trace_id.clone(),
			Self::TransactionError(ctx) => ctx.trace_id.clone(),
			Self::InternalError(ctx) => ctx.trace_id.clone(),
			Self::AllEndpointsFailed { context, .. } => context.trace_id.clone(),
			Self::NoEndpointsReady { context, .. } => context.trace_id.clone(),
			Self::Cancelled(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
