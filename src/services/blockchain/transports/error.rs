//! Error types for blockchain transport services
//!
//! Separates connection-level failures (the only class that triggers failover between a primary
//! and a fallback endpoint) from HTTP, JSON-RPC and (de)serialization failures.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
	/// HTTP error
	#[error("HTTP error: status {status_code} for URL {url}")]
	Http {
		status_code: reqwest::StatusCode,
		url: String,
		body: String,
		context: ErrorContext,
	},

	/// The endpoint could not be reached (refused, reset, timed out, socket error)
	#[error("Connection error: {0}")]
	Connection(ErrorContext),

	/// Request failure that is not a connection failure (redirect loop, body error, ...)
	#[error("Network error: {0}")]
	Network(ErrorContext),

	/// JSON-RPC error object returned by the node
	#[error("RPC error {code}: {message}")]
	Rpc {
		code: i64,
		message: String,
		data: Option<serde_json::Value>,
		context: ErrorContext,
	},

	/// JSON parsing error
	#[error("Failed to parse JSON response: {0}")]
	ResponseParse(ErrorContext),

	/// Request body serialization error
	#[error("Failed to serialize request JSON: {0}")]
	RequestSerialization(ErrorContext),
}

impl TransportError {
	pub fn http(
		status_code: reqwest::StatusCode,
		url: String,
		body: String,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let msg = format!("HTTP error: status {} for URL {}", status_code, url);

		Self::Http {
			status_code,
			url,
			body,
			context: ErrorContext::new_with_log(msg, source, metadata),
		}
	}

	pub fn connection(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Connection(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn network(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Network(ErrorContext::new_with_log(msg, source, metadata))
	}

	// RPC errors are application-level (reverts, unknown blocks); they are not logged here
	// because callers routinely expect them.
	pub fn rpc(
		code: i64,
		message: impl Into<String>,
		data: Option<serde_json::Value>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let message = message.into();
		Self::Rpc {
			code,
			context: ErrorContext::new(message.clone(), None, metadata),
			message,
			data,
		}
	}

	pub fn response_parse(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn request_serialization(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestSerialization(ErrorContext::new_with_log(msg, source, metadata))
	}

	/// Whether this error means the endpoint itself is unreachable
	pub fn is_disconnection(&self) -> bool {
		matches!(self, Self::Connection(_))
	}
}

impl TraceableError for TransportError {
	fn trace_id(&self) -> String {
		match self {
			Self::Http { context, .. } => context.trace_id.clone(),
			Self::Connection(ctx) => ctx.trace_id.clone(),
			Self::Network(ctx) => ctx.trace_id.clone(),
			Self::Rpc { context, .. } => context.trace_id.clone(),
			Self::ResponseParse(ctx) => ctx.trace_id.clone(),
			Self::RequestSerialization(ctx) => ctx.trace_id.clone(),
		}
	}
}
