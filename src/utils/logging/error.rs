//! Error context shared by every error type in the crate.
//!
//! A failed node call is usually wrapped several times on its way up: a [`TransportError`]
//! becomes a [`BlockChainError`], which may in turn become a [`QueryError`] or a
//! [`TransactionError`]. Each layer holds an [`ErrorContext`]. A context built over a source
//! that already carries a trace id reuses that id, so every log line emitted for one failed
//! call shares a single trace id.
//!
//! Metadata is free-form, but the keys in [`keys`] are lifted into structured tracing fields
//! when a context is logged, so log queries can filter by endpoint, method or contract.
//!
//! [`TransportError`]: crate::services::blockchain::TransportError
//! [`BlockChainError`]: crate::services::blockchain::BlockChainError
//! [`QueryError`]: crate::services::query::QueryError
//! [`TransactionError`]: crate::services::transaction::TransactionError

use chrono::Utc;
use std::{collections::HashMap, error::Error as StdError, fmt};
use uuid::Uuid;

/// Boxed error accepted as the source of a context
pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Metadata keys with a dedicated field in the error log
pub mod keys {
	/// Endpoint URL of the node that failed
	pub const URL: &str = "url";
	/// JSON-RPC method or REST action
	pub const METHOD: &str = "method";
	/// "Execution Client" or "Beacon Client"
	pub const CLIENT_TYPE: &str = "client_type";
	/// Contract name used by a query or a transaction
	pub const CONTRACT: &str = "contract";
	/// Transaction hash
	pub const HASH: &str = "hash";
	/// Configuration field that failed validation
	pub const FIELD: &str = "field";
	/// Environment variable that supplied a configuration value
	pub const ENV: &str = "env";
}

// Upper bound on source-chain traversal when looking for an inherited trace id
const MAX_TRACE_DEPTH: usize = 4;

/// Message, source, metadata, timestamp and trace id of a single error
#[derive(Debug)]
pub struct ErrorContext {
	pub message: String,
	pub source: Option<BoxedSource>,
	pub metadata: Option<HashMap<String, String>>,
	/// RFC 3339 creation time
	pub timestamp: String,
	/// Inherited from the source chain when any link has one, otherwise a fresh UUID v4
	pub trace_id: String,
}

impl ErrorContext {
	pub fn new(
		message: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let trace_id = source
			.as_deref()
			.and_then(inherited_trace_id)
			.unwrap_or_else(|| Uuid::new_v4().to_string());

		Self {
			message: message.into(),
			source,
			metadata,
			timestamp: Utc::now().to_rfc3339(),
			trace_id,
		}
	}

	/// Same as [`ErrorContext::new`], and emits the context at `error` level.
	pub fn new_with_log(
		message: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let context = Self::new(message, source, metadata);
		log_error(&context);
		context
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata
			.get_or_insert_with(HashMap::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn metadata_value(&self, key: &str) -> Option<&str> {
		self.metadata.as_ref()?.get(key).map(String::as_str)
	}
}

impl fmt::Display for ErrorContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)?;
		let Some(metadata) = self.metadata.as_ref().filter(|m| !m.is_empty()) else {
			return Ok(());
		};
		let mut pairs: Vec<_> = metadata.iter().collect();
		pairs.sort();
		let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
		write!(f, " [{}]", rendered.join(", "))
	}
}

impl StdError for ErrorContext {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
	}
}

/// Implemented by every error enum of the crate
pub trait TraceableError: StdError + Send + Sync {
	fn trace_id(&self) -> String;
}

/// Looks for a trace id on `err` or on its first few sources.
fn inherited_trace_id(err: &(dyn StdError + Send + Sync + 'static)) -> Option<String> {
	std::iter::successors(Some(err as &(dyn StdError + 'static)), |&e| e.source())
		.take(MAX_TRACE_DEPTH)
		.find_map(own_trace_id)
}

fn own_trace_id(err: &(dyn StdError + 'static)) -> Option<String> {
	use crate::{
		models::ConfigError,
		services::{
			blockchain::{BlockChainError, TransportError},
			query::QueryError,
			transaction::TransactionError,
		},
	};

	if let Some(ctx) = err.downcast_ref::<ErrorContext>() {
		return Some(ctx.trace_id.clone());
	}
	err.downcast_ref::<TransportError>()
		.map(TraceableError::trace_id)
		.or_else(|| err.downcast_ref::<BlockChainError>().map(TraceableError::trace_id))
		.or_else(|| err.downcast_ref::<QueryError>().map(TraceableError::trace_id))
		.or_else(|| err.downcast_ref::<TransactionError>().map(TraceableError::trace_id))
		.or_else(|| err.downcast_ref::<ConfigError>().map(TraceableError::trace_id))
}

/// Strips an HTML error page (proxies in front of nodes often send one) down to the text before
/// its first tag.
fn strip_html(message: &str) -> &str {
	let lower = message.to_ascii_lowercase();
	if !(lower.contains("<html") || lower.contains("<body") || lower.contains("<!doctype")) {
		return message;
	}
	message.find('<').map_or(message, |pos| message[..pos].trim_end())
}

fn source_chain(err: &(dyn StdError + 'static)) -> String {
	std::iter::successors(Some(err), |&e| e.source())
		.map(|e| strip_html(&e.to_string()).to_string())
		.collect::<Vec<_>>()
		.join("\n\tCaused by: ")
}

fn log_error(ctx: &ErrorContext) {
	let chain = ctx.source.as_deref().map(|src| source_chain(src));
	tracing::error!(
		message = %ctx,
		trace_id = %ctx.trace_id,
		timestamp = %ctx.timestamp,
		url = ctx.metadata_value(keys::URL),
		method = ctx.metadata_value(keys::METHOD),
		client_type = ctx.metadata_value(keys::CLIENT_TYPE),
		contract = ctx.metadata_value(keys::CONTRACT),
		hash = ctx.metadata_value(keys::HASH),
		error.chain = chain.as_deref(),
		"Error occurred"
	);
}
