//! Execution layer client.
//!
//! [`ExecutionClient`] is the capability set the rest of the crate needs from an Ethereum
//! JSON-RPC endpoint. [`EvmClient`] implements it over any [`BlockchainTransport`].

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::{collections::HashMap, time::Duration};
use tracing::instrument;

use crate::{
	models::{
		BlockHeader, BlockTag, CallRequest, Log, LogFilter, SyncProgress, Transaction,
		TransactionReceipt,
	},
	services::blockchain::{
		transports::{BlockchainTransport, HttpTransportClient},
		BlockChainError,
	},
	utils::RetryConfig,
};

/// Standard Ethereum JSON-RPC capability set
#[async_trait]
pub trait ExecutionClient: Send + Sync {
	/// Chain id reported by `eth_chainId`
	async fn chain_id(&self) -> Result<u64, BlockChainError>;

	/// Number of the most recent block
	async fn block_number(&self) -> Result<u64, BlockChainError>;

	/// Contract code deployed at `address`
	async fn code_at(&self, address: Address, block: BlockTag) -> Result<Bytes, BlockChainError>;

	/// Executes a read-only call and returns its output
	async fn call_contract(
		&self,
		call: CallRequest,
		block: BlockTag,
	) -> Result<Bytes, BlockChainError>;

	/// Estimates the gas `call` would use if it were sent as a transaction
	async fn estimate_gas(&self, call: CallRequest) -> Result<u64, BlockChainError>;

	/// Next nonce of `address`, including pending transactions
	async fn pending_nonce_at(&self, address: Address) -> Result<u64, BlockChainError>;

	/// Nonce of `address` at `block`
	async fn nonce_at(&self, address: Address, block: BlockTag) -> Result<u64, BlockChainError>;

	/// Balance of `address` at `block`, in wei
	async fn balance_at(&self, address: Address, block: BlockTag)
		-> Result<U256, BlockChainError>;

	/// Legacy gas price suggestion
	async fn suggest_gas_price(&self) -> Result<U256, BlockChainError>;

	/// Priority fee suggestion for EIP-1559 transactions
	async fn suggest_gas_tip_cap(&self) -> Result<U256, BlockChainError>;

	/// Header of the selected block; a missing block is [`BlockChainError::NotFound`]
	async fn header_by_number(&self, block: BlockTag) -> Result<BlockHeader, BlockChainError>;

	async fn header_by_hash(&self, hash: B256) -> Result<BlockHeader, BlockChainError>;

	/// Looks up a transaction, returning it together with its pending flag
	///
	/// An unknown hash is reported as [`BlockChainError::NotFound`].
	async fn transaction_by_hash(
		&self,
		hash: B256,
	) -> Result<(Transaction, bool), BlockChainError>;

	/// Receipt of a mined transaction, `None` while it is not mined
	async fn transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, BlockChainError>;

	async fn filter_logs(&self, filter: LogFilter) -> Result<Vec<Log>, BlockChainError>;

	/// Sync progress, or `None` once the node is no longer syncing
	async fn sync_progress(&self) -> Result<Option<SyncProgress>, BlockChainError>;

	/// Broadcasts a signed, RLP encoded transaction and returns its hash
	async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, BlockChainError>;
}

/// JSON-RPC implementation of [`ExecutionClient`]
#[derive(Clone)]
pub struct EvmClient<T: Send + Sync + Clone> {
	/// The underlying transport for RPC communication
	transport: T,
}

impl<T: Send + Sync + Clone> EvmClient<T> {
	/// Creates a new client with a specific transport
	pub fn new_with_transport(transport: T) -> Self {
		Self { transport }
	}
}

impl EvmClient<HttpTransportClient> {
	/// Creates a client talking to `url` over HTTP
	///
	/// # Arguments
	/// * `url` - JSON-RPC endpoint
	/// * `timeout` - Per-request timeout
	/// * `retry_config` - Retry policy for transient failures
	pub fn new(
		url: &str,
		timeout: Duration,
		retry_config: &RetryConfig,
	) -> Result<Self, anyhow::Error> {
		let transport = HttpTransportClient::new(url, timeout, retry_config)?;
		Ok(Self::new_with_transport(transport))
	}
}

impl<T: Send + Sync + Clone + BlockchainTransport> EvmClient<T> {
	/// Sends a request and returns the raw `result` field, which may be `null`
	async fn request_value(&self, method: &str, params: Vec<Value>) -> Result<Value, BlockChainError> {
		let mut response = self
			.transport
			.send_raw_request(method, Some(Value::Array(params)))
			.await?;

		match response.get_mut("result") {
			Some(result) => Ok(result.take()),
			None => Err(BlockChainError::request_error(
				"Missing 'result' field",
				None,
				Some(HashMap::from([("method".to_string(), method.to_string())])),
			)),
		}
	}

	/// Sends a request and decodes a `result` that may be `null`
	async fn request_optional<R: DeserializeOwned>(
		&self,
		method: &str,
		params: Vec<Value>,
	) -> Result<Option<R>, BlockChainError> {
		let result = self.request_value(method, params).await?;
		if result.is_null() {
			return Ok(None);
		}
		serde_json::from_value(result).map(Some).map_err(|e| {
			BlockChainError::request_error(
				format!("Failed to parse {} response", method),
				Some(Box::new(e)),
				None,
			)
		})
	}

	/// Sends a request whose `result` must be present
	async fn request<R: DeserializeOwned>(
		&self,
		method: &str,
		params: Vec<Value>,
	) -> Result<R, BlockChainError> {
		self.request_optional(method, params).await?.ok_or_else(|| {
			BlockChainError::not_found(
				format!("{} returned no result", method),
				None,
				Some(HashMap::from([("method".to_string(), method.to_string())])),
			)
		})
	}

	async fn request_u64(&self, method: &str, params: Vec<Value>) -> Result<u64, BlockChainError> {
		let value: U64 = self.request(method, params).await?;
		Ok(value.to::<u64>())
	}
}

#[async_trait]
impl<T: Send + Sync + Clone + BlockchainTransport> ExecutionClient for EvmClient<T> {
	#[instrument(skip(self))]
	async fn chain_id(&self) -> Result<u64, BlockChainError> {
		self.request_u64("eth_chainId", vec![]).await
	}

	#[instrument(skip(self))]
	async fn block_number(&self) -> Result<u64, BlockChainError> {
		self.request_u64("eth_blockNumber", vec![]).await
	}

	async fn code_at(&self, address: Address, block: BlockTag) -> Result<Bytes, BlockChainError> {
		self.request("eth_getCode", vec![json!(address), block.to_rpc_param()])
			.await
	}

	async fn call_contract(
		&self,
		call: CallRequest,
		block: BlockTag,
	) -> Result<Bytes, BlockChainError> {
		self.request("eth_call", vec![json!(call), block.to_rpc_param()])
			.await
	}

	#[instrument(skip(self, call), fields(to = ?call.to))]
	async fn estimate_gas(&self, call: CallRequest) -> Result<u64, BlockChainError> {
		self.request_u64("eth_estimateGas", vec![json!(call)]).await
	}

	async fn pending_nonce_at(&self, address: Address) -> Result<u64, BlockChainError> {
		self.request_u64(
			"eth_getTransactionCount",
			vec![json!(address), BlockTag::Pending.to_rpc_param()],
		)
		.await
	}

	async fn nonce_at(&self, address: Address, block: BlockTag) -> Result<u64, BlockChainError> {
		self.request_u64(
			"eth_getTransactionCount",
			vec![json!(address), block.to_rpc_param()],
		)
		.await
	}

	async fn balance_at(
		&self,
		address: Address,
		block: BlockTag,
	) -> Result<U256, BlockChainError> {
		self.request("eth_getBalance", vec![json!(address), block.to_rpc_param()])
			.await
	}

	async fn suggest_gas_price(&self) -> Result<U256, BlockChainError> {
		self.request("eth_gasPrice", vec![]).await
	}

	async fn suggest_gas_tip_cap(&self) -> Result<U256, BlockChainError> {
		self.request("eth_maxPriorityFeePerGas", vec![]).await
	}

	#[instrument(skip(self))]
	async fn header_by_number(&self, block: BlockTag) -> Result<BlockHeader, BlockChainError> {
		self.request_optional(
			"eth_getBlockByNumber",
			vec![block.to_rpc_param(), json!(false)],
		)
		.await?
		.ok_or_else(|| {
			BlockChainError::not_found(
				"block not found",
				None,
				Some(HashMap::from([(
					"block".to_string(),
					block.to_rpc_param().to_string(),
				)])),
			)
		})
	}

	async fn header_by_hash(&self, hash: B256) -> Result<BlockHeader, BlockChainError> {
		self.request_optional("eth_getBlockByHash", vec![json!(hash), json!(false)])
			.await?
			.ok_or_else(|| {
				BlockChainError::not_found(
					"block not found",
					None,
					Some(HashMap::from([("hash".to_string(), hash.to_string())])),
				)
			})
	}

	#[instrument(skip(self))]
	async fn transaction_by_hash(
		&self,
		hash: B256,
	) -> Result<(Transaction, bool), BlockChainError> {
		let transaction: Transaction = self
			.request_optional("eth_getTransactionByHash", vec![json!(hash)])
			.await?
			.ok_or_else(|| {
				BlockChainError::not_found(
					"transaction not found",
					None,
					Some(HashMap::from([("hash".to_string(), hash.to_string())])),
				)
			})?;
		let pending = transaction.is_pending();
		Ok((transaction, pending))
	}

	async fn transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, BlockChainError> {
		self.request_optional("eth_getTransactionReceipt", vec![json!(hash)])
			.await
	}

	#[instrument(skip(self, filter), fields(from_block = ?filter.from_block, to_block = ?filter.to_block))]
	async fn filter_logs(&self, filter: LogFilter) -> Result<Vec<Log>, BlockChainError> {
		self.request("eth_getLogs", vec![filter.to_rpc_param()])
			.await
	}

	async fn sync_progress(&self) -> Result<Option<SyncProgress>, BlockChainError> {
		let result = self.request_value("eth_syncing", vec![]).await?;
		match result {
			Value::Bool(false) | Value::Null => Ok(None),
			other => serde_json::from_value(other).map(Some).map_err(|e| {
				BlockChainError::request_error(
					"Failed to parse eth_syncing response",
					Some(Box::new(e)),
					None,
				)
			}),
		}
	}

	#[instrument(skip(self, raw))]
	async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, BlockChainError> {
		self.request("eth_sendRawTransaction", vec![json!(raw)])
			.await
	}
}
