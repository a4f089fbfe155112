//! HTTP transport implementation for blockchain interactions.
//!
//! This module provides a single-endpoint HTTP client used for:
//! - JSON-RPC requests against an Execution client
//! - REST requests against a Beacon node
//!
//! Transient failures are retried by the middleware stack; whatever still fails afterwards is
//! classified as either a disconnection or an ordinary request failure.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};
use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	time::Duration,
};
use url::Url;

use crate::{
	services::blockchain::transports::{
		is_disconnection_error, map_request_error, BlockchainTransport, RestTransport,
		TransientErrorRetryStrategy, TransportError,
	},
	utils::http::{create_base_http_client, create_retryable_http_client, RetryConfig},
};

/// Most a response's advertised length may pre-allocate; longer bodies grow the buffer as
/// chunks arrive
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

fn preallocation(content_length: Option<u64>) -> usize {
	content_length
		.map(|length| usize::try_from(length).unwrap_or(usize::MAX).min(MAX_PREALLOCATION))
		.unwrap_or(0)
}

/// Raw REST response: status code plus undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
	pub status: u16,
	pub body: Vec<u8>,
}

impl RestResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub fn is_not_found(&self) -> bool {
		self.status == 404
	}
}

/// Basic HTTP transport client for blockchain interactions
///
/// The client is thread-safe and can be shared across multiple tasks; connection pooling is
/// handled by the underlying `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	/// Normalized endpoint URL (no trailing slash)
	url: String,
	/// Monotonic JSON-RPC request id
	request_id: Arc<AtomicU64>,
}

impl HttpTransportClient {
	/// Creates a new HTTP transport client for a single endpoint
	///
	/// # Arguments
	/// * `url` - Endpoint URL
	/// * `timeout` - Total request timeout; the connect timeout is capped at the same value
	/// * `retry_config` - Retry policy for transient failures
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or construction error
	pub fn new(
		url: &str,
		timeout: Duration,
		retry_config: &RetryConfig,
	) -> Result<Self, anyhow::Error> {
		let base_http_client =
			create_base_http_client(timeout).context("Failed to create base HTTP client")?;

		let retryable_client = create_retryable_http_client(
			retry_config,
			base_http_client,
			Some(TransientErrorRetryStrategy),
		);

		Self::new_with_client(retryable_client, url)
	}

	/// Creates a transport around an already configured client
	pub fn new_with_client(client: ClientWithMiddleware, url: &str) -> Result<Self, anyhow::Error> {
		let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;
		Ok(Self {
			client,
			url: parsed.as_str().trim_end_matches('/').to_string(),
			request_id: Arc::new(AtomicU64::new(1)),
		})
	}

	/// The endpoint this transport talks to
	pub fn url(&self) -> &str {
		&self.url
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.url, path.trim_start_matches('/'))
	}

	async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
		response
			.bytes()
			.await
			.map(|b| b.to_vec())
			.map_err(|e| self.body_error(e))
	}

	fn body_error(&self, e: reqwest::Error) -> TransportError {
		let metadata = Some(HashMap::from([("url".to_string(), self.url.clone())]));
		if is_disconnection_error(&e) {
			TransportError::connection(
				"Connection lost while reading response body",
				Some(Box::new(e)),
				metadata,
			)
		} else {
			TransportError::network("Failed to read response body", Some(Box::new(e)), metadata)
		}
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.url.clone()
	}

	/// Sends a JSON-RPC request to the node
	///
	/// A response carrying an `error` object is turned into [`TransportError::Rpc`]; the full
	/// response (including `result`) is returned otherwise.
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let mut request_body = self.customize_request(method, params).await;
		request_body["id"] = json!(self.request_id.fetch_add(1, Ordering::Relaxed));

		let request_body_str = serde_json::to_string(&request_body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;

		tracing::trace!(url = %self.url, method, "sending JSON-RPC request");

		let response = self
			.client
			.post(&self.url)
			.header("Content-Type", "application/json")
			.body(request_body_str)
			.send()
			.await
			.map_err(|e| map_request_error(e, &self.url))?;

		let status = response.status();
		let body = self.read_body(response).await?;
		if !status.is_success() {
			let error_body = String::from_utf8_lossy(&body).to_string();
			tracing::warn!(
				"Request to {} failed with status {}: {}",
				self.url,
				status,
				error_body
			);
			return Err(TransportError::http(
				status,
				self.url.clone(),
				error_body,
				None,
				None,
			));
		}

		let value: Value = serde_json::from_slice(&body).map_err(|e| {
			TransportError::response_parse(
				"Failed to parse JSON response".to_string(),
				Some(Box::new(e)),
				None,
			)
		})?;

		if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
			let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
			let message = error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("unknown error")
				.to_string();
			return Err(TransportError::rpc(
				code,
				message,
				error.get("data").cloned(),
				Some(HashMap::from([("method".to_string(), method.to_string())])),
			));
		}

		Ok(value)
	}
}

#[async_trait]
impl RestTransport for HttpTransportClient {
	async fn get(&self, path: &str) -> Result<RestResponse, TransportError> {
		let url = self.endpoint(path);
		let response = self
			.client
			.get(&url)
			.header("Accept", "application/json")
			.send()
			.await
			.map_err(|e| map_request_error(e, &url))?;
		let status = response.status().as_u16();
		let body = self.read_body(response).await?;
		Ok(RestResponse { status, body })
	}

	async fn post(&self, path: &str, body: Value) -> Result<RestResponse, TransportError> {
		let url = self.endpoint(path);
		let request_body = serde_json::to_string(&body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;
		let response = self
			.client
			.post(&url)
			.header("Content-Type", "application/json")
			.body(request_body)
			.send()
			.await
			.map_err(|e| map_request_error(e, &url))?;
		let status = response.status().as_u16();
		let body = self.read_body(response).await?;
		Ok(RestResponse { status, body })
	}

	async fn get_into(&self, path: &str, buffer: &mut Vec<u8>) -> Result<u16, TransportError> {
		let url = self.endpoint(path);
		let mut response = self
			.client
			.get(&url)
			.header("Accept", "application/json")
			.send()
			.await
			.map_err(|e| map_request_error(e, &url))?;
		let status = response.status().as_u16();
		buffer.reserve(preallocation(response.content_length()));
		while let Some(chunk) = response.chunk().await.map_err(|e| self.body_error(e))? {
			buffer.extend_from_slice(&chunk);
		}
		Ok(status)
	}
}
