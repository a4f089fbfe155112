//! Polling log subscription.
//!
//! Plain HTTP endpoints cannot push logs, so a subscription is a background task that polls the
//! head of the chain and fetches the logs of every new block range with `eth_getLogs`.

use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
	models::{Log, LogFilter},
	services::blockchain::{clients::execution::client::ExecutionClient, BlockChainError},
	utils::time::sleep_with_cancel,
};

/// Handle to a running log subscription
///
/// Dropping the handle stops the subscription.
pub struct LogSubscription {
	token: CancellationToken,
	handle: Option<JoinHandle<Result<(), BlockChainError>>>,
}

impl LogSubscription {
	/// Stops the subscription; no log is sent after this returns
	pub fn unsubscribe(&self) {
		self.token.cancel();
	}

	pub fn is_active(&self) -> bool {
		self.handle.as_ref().is_some_and(|h| !h.is_finished())
	}

	/// Waits for the subscription task to end and returns the error that ended it, if any
	///
	/// A subscription ends on its own when the receiving side of the channel is dropped or a
	/// request fails.
	pub async fn finished(mut self) -> Result<(), BlockChainError> {
		match self.handle.take() {
			Some(handle) => handle.await.map_err(|e| {
				BlockChainError::internal_error(
					"Log subscription task failed",
					Some(Box::new(e)),
					None,
				)
			})?,
			None => Ok(()),
		}
	}
}

impl Drop for LogSubscription {
	fn drop(&mut self) {
		self.token.cancel();
	}
}

/// Spawns the polling task behind [`LogSubscription`]
pub(crate) fn spawn_log_subscription(
	client: Arc<dyn ExecutionClient>,
	filter: LogFilter,
	sender: mpsc::Sender<Log>,
	poll_interval: Duration,
) -> LogSubscription {
	let token = CancellationToken::new();
	let task_token = token.clone();
	let handle = tokio::spawn(async move {
		poll_logs(client, filter, sender, poll_interval, task_token).await
	});
	LogSubscription {
		token,
		handle: Some(handle),
	}
}

async fn poll_logs(
	client: Arc<dyn ExecutionClient>,
	filter: LogFilter,
	sender: mpsc::Sender<Log>,
	poll_interval: Duration,
	token: CancellationToken,
) -> Result<(), BlockChainError> {
	let mut next_block = match filter.from_block {
		Some(block) => block,
		None => client.block_number().await? + 1,
	};

	loop {
		if token.is_cancelled() {
			return Ok(());
		}

		let head = client.block_number().await?;
		let last_block = filter.to_block.map_or(head, |to| to.min(head));
		if last_block >= next_block {
			let range = LogFilter {
				block_hash: None,
				from_block: Some(next_block),
				to_block: Some(last_block),
				..filter.clone()
			};
			let logs = client.filter_logs(range).await?;
			tracing::debug!(
				from_block = next_block,
				to_block = last_block,
				count = logs.len(),
				"Polled logs"
			);
			for log in logs {
				tokio::select! {
					_ = token.cancelled() => return Ok(()),
					sent = sender.send(log) => {
						if sent.is_err() {
							// Receiver dropped
							return Ok(());
						}
					}
				}
			}
			next_block = last_block + 1;
		}

		if filter.to_block.is_some_and(|to| next_block > to) {
			return Ok(());
		}
		if sleep_with_cancel(&token, poll_interval).await {
			return Ok(());
		}
	}
}
