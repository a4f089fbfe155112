//! Transaction manager.
//!
//! Simulates transactions to size their gas limit, builds and signs them through the caller's
//! [`TransactionSigner`], submits them and waits for their inclusion. Every chain access goes
//! through the execution client, which is normally an [`ExecutionClientManager`] and therefore
//! fails over between endpoints.
//!
//! [`ExecutionClientManager`]: crate::services::blockchain::ExecutionClientManager

use alloy::{
	dyn_abi::DynSolValue,
	primitives::{Address, Bytes, B256, U256, U64},
};
use futures::future::try_join_all;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
	models::{
		BlockTag, CallRequest, SimulationResult, Transaction, TransactionInfo, TransactionReceipt,
		TransactionSubmission,
	},
	services::{
		blockchain::ExecutionClient,
		query::Contract,
		transaction::{
			error::TransactionError,
			revert::normalize_revert_message,
			signer::{SignedTransaction, TransactOpts},
		},
	},
	utils::time::sleep_with_cancel,
};

/// Interval between two receipt lookups while waiting for a transaction to be mined
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Number of lookups of a freshly broadcast transaction before it is reported missing
pub const TRANSACTION_LOOKUP_ATTEMPTS: u32 = 30;

/// Interval between two lookups of a freshly broadcast transaction
pub const TRANSACTION_LOOKUP_INTERVAL: Duration = Duration::from_secs(1);

const GAS_SIM_ERROR_PREFIX: &str = "error estimating gas needed";

/// Wraps a simulation-or-construction result into a submission that uses the safe gas limit
pub fn create_tx_submission_from_info(
	tx_info: Result<TransactionInfo, TransactionError>,
) -> Result<TransactionSubmission, TransactionError> {
	tx_info.map(TransactionSubmission::from_info)
}

/// Sizes, signs, submits and waits for transactions
pub struct TransactionManager {
	client: Arc<dyn ExecutionClient>,
	buffer: u64,
	multiplier: f64,
	block_gas_limit: u64,
	receipt_poll_interval: Duration,
	lookup_interval: Duration,
}

impl TransactionManager {
	/// Creates a transaction manager
	///
	/// Safe gas limits are `ceil(estimate * multiplier) + buffer`. A multiplier of 0 disables
	/// the inflation (`estimate + buffer`); any other multiplier below 1 is rejected.
	pub fn new(
		client: Arc<dyn ExecutionClient>,
		buffer: u64,
		multiplier: f64,
		block_gas_limit: u64,
	) -> Result<Self, TransactionError> {
		if multiplier.is_nan() || (multiplier != 0.0 && multiplier < 1.0) {
			return Err(TransactionError::invalid_multiplier(multiplier));
		}
		Ok(Self {
			client,
			buffer,
			multiplier,
			block_gas_limit,
			receipt_poll_interval: RECEIPT_POLL_INTERVAL,
			lookup_interval: TRANSACTION_LOOKUP_INTERVAL,
		})
	}

	/// Overrides the receipt and transaction lookup polling intervals
	pub fn with_poll_intervals(mut self, receipt: Duration, lookup: Duration) -> Self {
		self.receipt_poll_interval = receipt;
		self.lookup_interval = lookup;
		self
	}

	pub fn block_gas_limit(&self) -> u64 {
		self.block_gas_limit
	}

	/// Inflates a gas estimate into a safe gas limit
	///
	/// Fails rather than clamping when the estimate or the safe limit is above the block gas
	/// limit.
	pub fn get_safe_gas_limit(&self, estimate: u64) -> Result<u64, TransactionError> {
		if estimate > self.block_gas_limit {
			return Err(TransactionError::gas_limit_exceeded(format!(
				"estimated gas usage of {} is greater than the block gas limit of {}",
				estimate, self.block_gas_limit
			)));
		}

		// A zero multiplier keeps the raw estimate instead of applying the formula literally,
		// which would size every transaction at the buffer alone
		let inflated = if self.multiplier == 0.0 {
			estimate
		} else {
			(estimate as f64 * self.multiplier).ceil() as u64
		};
		let safe_limit = inflated.saturating_add(self.buffer);
		if safe_limit > self.block_gas_limit {
			return Err(TransactionError::gas_limit_exceeded(format!(
				"safe gas limit of {} is greater than the block gas limit of {}",
				safe_limit, self.block_gas_limit
			)));
		}
		Ok(safe_limit)
	}

	/// Estimates the gas of a transaction
	///
	/// Without `opts` there is no sender to simulate for and a non-simulated result is
	/// returned. Estimation failures are reported in the result, never as an error.
	#[instrument(skip(self, opts, data))]
	pub async fn simulate_transaction(
		&self,
		to: Address,
		opts: Option<&TransactOpts>,
		data: &Bytes,
	) -> SimulationResult {
		let Some(opts) = opts else {
			return SimulationResult::not_simulated();
		};

		let call = CallRequest {
			from: Some(opts.from),
			to: Some(to),
			max_fee_per_gas: Some(U256::ZERO),
			max_priority_fee_per_gas: Some(U256::ZERO),
			value: opts.value,
			data: Some(data.clone()),
			..Default::default()
		};
		let estimate = match self.client.estimate_gas(call).await {
			Ok(estimate) => estimate,
			Err(e) => {
				tracing::debug!(error = %e, "Transaction simulation failed");
				return SimulationResult::failed(format!(
					"{}: {}",
					GAS_SIM_ERROR_PREFIX,
					normalize_revert_message(&e.to_string())
				));
			}
		};

		match self.get_safe_gas_limit(estimate) {
			Ok(safe_limit) => SimulationResult::succeeded(estimate, safe_limit),
			Err(e) => SimulationResult::failed(format!("error estimating gas limit: {}", e)),
		}
	}

	/// Encodes a contract call and simulates it
	pub async fn create_transaction_info(
		&self,
		contract: &Contract,
		method: &str,
		opts: Option<&TransactOpts>,
		args: &[DynSolValue],
	) -> Result<TransactionInfo, TransactionError> {
		let data = contract.encode_call(method, args).map_err(|e| {
			TransactionError::encoding(
				"error packing input data",
				Some(Box::new(e)),
				Some(HashMap::from([
					("contract".to_string(), contract.name.clone()),
					("method".to_string(), method.to_string()),
				])),
			)
		})?;
		Ok(self
			.create_transaction_info_raw(contract.address, data, opts)
			.await)
	}

	/// Simulates a transaction with already encoded call data
	pub async fn create_transaction_info_raw(
		&self,
		to: Address,
		data: Bytes,
		opts: Option<&TransactOpts>,
	) -> TransactionInfo {
		let simulation = self.simulate_transaction(to, opts, &data).await;
		TransactionInfo {
			data,
			to,
			value: opts.and_then(|o| o.value).unwrap_or_default(),
			simulation,
		}
	}

	/// Signs a transaction without broadcasting it
	pub async fn sign_transaction(
		&self,
		tx_info: &TransactionInfo,
		opts: &TransactOpts,
	) -> Result<SignedTransaction, TransactionError> {
		let opts = TransactOpts {
			no_send: true,
			..opts.clone()
		};
		self.execute_transaction_raw(tx_info.to, tx_info.data.clone(), tx_info.value, &opts)
			.await
	}

	/// Signs and broadcasts a transaction
	///
	/// Nonce, fees and signer come from `opts`; the value comes from `tx_info`.
	pub async fn execute_transaction(
		&self,
		tx_info: &TransactionInfo,
		opts: &TransactOpts,
	) -> Result<SignedTransaction, TransactionError> {
		self.execute_transaction_raw(tx_info.to, tx_info.data.clone(), tx_info.value, opts)
			.await
	}

	/// Builds, signs and (unless `opts.no_send`) broadcasts a transaction
	///
	/// `value` is always used instead of `opts.value`.
	#[instrument(skip(self, data, opts), fields(from = %opts.from))]
	pub async fn execute_transaction_raw(
		&self,
		to: Address,
		data: Bytes,
		value: U256,
		opts: &TransactOpts,
	) -> Result<SignedTransaction, TransactionError> {
		let signer = opts
			.signer
			.clone()
			.ok_or_else(|| TransactionError::signing("no signer in transaction options", None, None))?;

		let nonce = match opts.nonce {
			Some(nonce) => nonce,
			None => self.client.pending_nonce_at(opts.from).await?,
		};

		let mut request = CallRequest {
			from: Some(opts.from),
			to: Some(to),
			value: Some(value),
			data: Some(data),
			nonce: Some(U64::from(nonce)),
			..Default::default()
		};
		self.fill_fees(&mut request, opts).await?;

		let gas_limit = match opts.gas_limit {
			Some(limit) if limit > 0 => limit,
			_ => {
				let estimate = self.client.estimate_gas(request.clone()).await?;
				self.get_safe_gas_limit(estimate)?
			}
		};
		request.gas = Some(U64::from(gas_limit));
		request.chain_id = Some(U64::from(self.client.chain_id().await?));

		let signed = signer.sign(request).await?;
		if opts.no_send {
			return Ok(signed);
		}

		let hash = self
			.client
			.send_raw_transaction(signed.raw.clone())
			.await
			.map_err(|e| {
				TransactionError::submission(
					"error submitting transaction",
					Some(Box::new(e)),
					Some(HashMap::from([(
						"hash".to_string(),
						signed.hash.to_string(),
					)])),
				)
			})?;
		if hash != signed.hash {
			tracing::warn!(
				expected = %signed.hash,
				reported = %hash,
				"Node reported a different transaction hash"
			);
		}
		tracing::info!(hash = %signed.hash, nonce, gas_limit, "Transaction submitted");
		Ok(signed)
	}

	/// Signs and broadcasts a bundle of transactions from one sender
	///
	/// Nonces are assigned sequentially in input order starting at `opts.nonce`, or at the
	/// sender's latest nonce when unset. Each transaction uses its submission's gas limit and
	/// value; fee fields are shared.
	#[instrument(skip(self, submissions, opts), fields(count = submissions.len()))]
	pub async fn batch_execute_transactions(
		&self,
		submissions: &[TransactionSubmission],
		opts: &TransactOpts,
	) -> Result<Vec<SignedTransaction>, TransactionError> {
		let mut nonce = match opts.nonce {
			Some(nonce) => nonce,
			None => self
				.client
				.nonce_at(opts.from, BlockTag::Latest)
				.await
				.map_err(|e| {
					TransactionError::signing(
						"error getting latest nonce for node",
						Some(Box::new(e)),
						None,
					)
				})?,
		};

		let mut transactions = Vec::with_capacity(submissions.len());
		for (i, submission) in submissions.iter().enumerate() {
			let tx_opts = TransactOpts {
				nonce: Some(nonce),
				gas_limit: Some(submission.gas_limit),
				..opts.clone()
			};
			let tx_info = &submission.tx_info;
			let tx = self
				.execute_transaction_raw(tx_info.to, tx_info.data.clone(), tx_info.value, &tx_opts)
				.await
				.map_err(|e| {
					TransactionError::submission(
						format!("error creating transaction {} in bundle", i),
						Some(Box::new(e)),
						None,
					)
				})?;
			transactions.push(tx);
			nonce += 1;
		}
		Ok(transactions)
	}

	/// Waits until a transaction is mined; a failed execution (status 0) is an error
	#[instrument(skip(self, tx, token), fields(hash = %tx.hash))]
	pub async fn wait_for_transaction(
		&self,
		tx: &SignedTransaction,
		token: &CancellationToken,
	) -> Result<TransactionReceipt, TransactionError> {
		self.wait_mined(tx.hash, token).await
	}

	/// Waits for every transaction; fails as soon as one of them fails
	pub async fn wait_for_transactions(
		&self,
		txs: &[SignedTransaction],
		token: &CancellationToken,
	) -> Result<Vec<TransactionReceipt>, TransactionError> {
		try_join_all(txs.iter().map(|tx| self.wait_for_transaction(tx, token))).await
	}

	/// Resolves a transaction by hash, retrying while the node does not know it yet, then
	/// waits until it is mined
	#[instrument(skip(self, token))]
	pub async fn wait_for_transaction_by_hash(
		&self,
		hash: B256,
		token: &CancellationToken,
	) -> Result<TransactionReceipt, TransactionError> {
		let tx = self.get_transaction_from_hash(hash, token).await?;
		self.wait_mined(tx.hash, token).await
	}

	/// Waits for every transaction hash; fails as soon as one of them fails
	pub async fn wait_for_transactions_by_hash(
		&self,
		hashes: &[B256],
		token: &CancellationToken,
	) -> Result<Vec<TransactionReceipt>, TransactionError> {
		try_join_all(
			hashes
				.iter()
				.map(|hash| self.wait_for_transaction_by_hash(*hash, token)),
		)
		.await
	}

	async fn get_transaction_from_hash(
		&self,
		hash: B256,
		token: &CancellationToken,
	) -> Result<Transaction, TransactionError> {
		for attempt in 1..=TRANSACTION_LOOKUP_ATTEMPTS {
			match self.client.transaction_by_hash(hash).await {
				Ok((tx, _pending)) => return Ok(tx),
				Err(e) if e.is_not_found() => {
					tracing::debug!(attempt, "Transaction not found yet");
					if sleep_with_cancel(token, self.lookup_interval).await {
						return Err(TransactionError::cancelled(format!(
							"lookup of transaction {} cancelled",
							hash
						)));
					}
				}
				Err(e) => return Err(e.into()),
			}
		}
		Err(TransactionError::not_found(
			hash,
			format!(
				"transaction not found after {} attempts",
				TRANSACTION_LOOKUP_ATTEMPTS
			),
		))
	}

	async fn wait_mined(
		&self,
		hash: B256,
		token: &CancellationToken,
	) -> Result<TransactionReceipt, TransactionError> {
		loop {
			let receipt = tokio::select! {
				biased;
				_ = token.cancelled() => None,
				receipt = self.client.transaction_receipt(hash) => Some(receipt?),
			};
			match receipt {
				None => {
					return Err(TransactionError::cancelled(format!(
						"wait for transaction {} cancelled",
						hash
					)))
				}
				Some(Some(receipt)) if receipt.is_success() => return Ok(receipt),
				Some(Some(_)) => {
					return Err(TransactionError::reverted(
						hash,
						format!("transaction {} failed with status 0", hash),
					))
				}
				Some(None) => {
					if sleep_with_cancel(token, self.receipt_poll_interval).await {
						return Err(TransactionError::cancelled(format!(
							"wait for transaction {} cancelled",
							hash
						)));
					}
				}
			}
		}
	}

	/// Fills the fee fields of `request` that `opts` leaves unset
	///
	/// A legacy gas price wins over EIP-1559 fields. Otherwise a missing tip cap comes from the
	/// node and a missing fee cap is `tip + 2 * base fee` of the latest block. Pre-London
	/// chains without a base fee fall back to a legacy gas price.
	async fn fill_fees(
		&self,
		request: &mut CallRequest,
		opts: &TransactOpts,
	) -> Result<(), TransactionError> {
		if let Some(gas_price) = opts.gas_price {
			request.gas_price = Some(gas_price);
			return Ok(());
		}

		let header = self.client.header_by_number(BlockTag::Latest).await?;
		let Some(base_fee) = header.base_fee_per_gas else {
			request.gas_price = Some(self.client.suggest_gas_price().await?);
			return Ok(());
		};

		let tip_cap = match opts.gas_tip_cap {
			Some(tip) => tip,
			None => self.client.suggest_gas_tip_cap().await?,
		};
		let fee_cap = opts
			.gas_fee_cap
			.unwrap_or_else(|| tip_cap.saturating_add(base_fee.saturating_mul(U256::from(2))));
		if fee_cap < tip_cap {
			return Err(TransactionError::signing(
				format!(
					"maxFeePerGas ({}) < maxPriorityFeePerGas ({})",
					fee_cap, tip_cap
				),
				None,
				None,
			));
		}
		request.max_fee_per_gas = Some(fee_cap);
		request.max_priority_fee_per_gas = Some(tip_cap);
		Ok(())
	}
}
