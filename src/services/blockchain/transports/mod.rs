//! Network transport implementations for blockchain clients.
//!
//! Provides the HTTP transport shared by the Execution (JSON-RPC) and Beacon (REST) clients,
//! together with the predicate that decides whether a request failure is a disconnection.
//!
//! Endpoint failover is not handled here: a transport talks to exactly one URL and the
//! client manager decides which transport to use.

mod error;
mod http;

pub use error::TransportError;
pub use http::{HttpTransportClient, RestResponse};

use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::ErrorKind;

/// Base trait for JSON-RPC transport clients
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// Get the URL this transport sends requests to
	async fn get_current_url(&self) -> String;

	/// Send a raw request to the blockchain
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Customizes the request for specific blockchain requirements
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		// Default implementation for JSON-RPC
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into())
		})
	}
}

/// Transport for REST style APIs (Beacon node HTTP API)
#[async_trait::async_trait]
pub trait RestTransport: Send + Sync {
	/// Issue a GET request against `path`, relative to the transport base URL
	async fn get(&self, path: &str) -> Result<RestResponse, TransportError>;

	/// Issue a POST request with a JSON body against `path`
	async fn post(&self, path: &str, body: Value) -> Result<RestResponse, TransportError>;

	/// Issue a GET request and append the response body to `buffer`, returning the status code
	///
	/// The buffer is never cleared here so callers can keep reusing its allocation.
	async fn get_into(&self, path: &str, buffer: &mut Vec<u8>) -> Result<u16, TransportError> {
		let response = self.get(path).await?;
		buffer.extend_from_slice(&response.body);
		Ok(response.status)
	}
}

/// Retries 5xx and 429 responses and request failures that leave the endpoint reachable.
///
/// A disconnection is never retried on the same endpoint: it is returned at once so the client
/// manager can mark the endpoint not ready and move to the fallback.
pub struct TransientErrorRetryStrategy;
impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) if is_middleware_disconnection(error) => Some(Retryable::Fatal),
			Err(error) => default_on_request_failure(error),
		}
	}
}

/// Socket level error kinds that mean the remote endpoint is gone.
const DISCONNECTION_KINDS: [ErrorKind; 8] = [
	ErrorKind::ConnectionRefused,
	ErrorKind::ConnectionReset,
	ErrorKind::ConnectionAborted,
	ErrorKind::NotConnected,
	ErrorKind::BrokenPipe,
	ErrorKind::TimedOut,
	ErrorKind::UnexpectedEof,
	ErrorKind::AddrNotAvailable,
];

/// Decides whether a request failure is a disconnection.
///
/// A failure is a disconnection when anything in its source chain is
/// - a `reqwest::Error` raised while connecting or one that timed out (connect or read timeout), or
/// - a `std::io::Error` whose kind is one of [`DISCONNECTION_KINDS`].
///
/// HTTP status codes (including 5xx), JSON-RPC error objects and decoding failures never count.
pub fn is_disconnection_error(err: &(dyn std::error::Error + 'static)) -> bool {
	let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
	while let Some(e) = current {
		if let Some(reqwest_err) = e.downcast_ref::<reqwest::Error>() {
			if reqwest_err.is_connect() || reqwest_err.is_timeout() {
				return true;
			}
		}
		if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
			if DISCONNECTION_KINDS.contains(&io_err.kind()) {
				return true;
			}
		}
		if let Some(mw_err) = e.downcast_ref::<reqwest_middleware::Error>() {
			if is_middleware_disconnection(mw_err) {
				return true;
			}
		}
		current = e.source();
	}
	false
}

/// Same as [`is_disconnection_error`] for the error type returned by the middleware client.
pub fn is_middleware_disconnection(err: &reqwest_middleware::Error) -> bool {
	match err {
		reqwest_middleware::Error::Reqwest(e) => is_disconnection_error(e),
		reqwest_middleware::Error::Middleware(e) => e.chain().any(|cause| {
			// `chain` already walks the sources, so only inspect each link itself
			cause
				.downcast_ref::<reqwest::Error>()
				.map(|r| r.is_connect() || r.is_timeout())
				.unwrap_or(false)
				|| cause
					.downcast_ref::<std::io::Error>()
					.map(|io| DISCONNECTION_KINDS.contains(&io.kind()))
					.unwrap_or(false)
		}),
	}
}

/// Maps a failed request into a [`TransportError`], using the disconnection predicate to pick
/// between [`TransportError::Connection`] and [`TransportError::Network`].
pub(crate) fn map_request_error(err: reqwest_middleware::Error, url: &str) -> TransportError {
	let metadata = Some(std::collections::HashMap::from([(
		"url".to_string(),
		url.to_string(),
	)]));
	if is_middleware_disconnection(&err) {
		TransportError::connection(
			format!("Failed to reach {}", url),
			Some(Box::new(err)),
			metadata,
		)
	} else {
		TransportError::network(err.to_string(), Some(Box::new(err)), metadata)
	}
}
