//! Query manager.
//!
//! Runs multicall queries against the execution client. Single queries make one `aggregate3`
//! round trip. Batch queries split `[0, count)` into windows of `batch_size` indices, build an
//! independent [`MultiCaller`] per window and run the windows concurrently, at most
//! `concurrent_call_limit` at a time. The first failing window cancels the others.
//!
//! Strict batches keep every window's decoded values staged until all windows have succeeded,
//! so a failed batch writes nothing. Tolerant batches write each window as it completes.

use alloy::primitives::Address;
use futures::{stream, StreamExt, TryStreamExt};
use std::{ops::Range, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
	models::BlockTag,
	services::{
		blockchain::ExecutionClient,
		query::{
			error::QueryError,
			multicall::{add_queryables, MultiCaller, Queryable},
		},
	},
};

/// Splits `[0, count)` into consecutive windows of at most `batch_size` indices
///
/// Returns no window when `count` or `batch_size` is zero.
pub fn batch_windows(count: usize, batch_size: usize) -> Vec<Range<usize>> {
	if batch_size == 0 {
		return Vec::new();
	}
	(0..count)
		.step_by(batch_size)
		.map(|start| start..(start + batch_size).min(count))
		.collect()
}

/// Runs multicall queries against an execution client
pub struct QueryManager {
	client: Arc<dyn ExecutionClient>,
	multicall_address: Address,
	concurrent_call_limit: i64,
}

impl QueryManager {
	/// Creates a query manager
	///
	/// `concurrent_call_limit` is the maximum number of batch windows in flight; zero or a
	/// negative value means no limit.
	pub fn new(
		client: Arc<dyn ExecutionClient>,
		multicall_address: Address,
		concurrent_call_limit: i64,
	) -> Self {
		Self {
			client,
			multicall_address,
			concurrent_call_limit,
		}
	}

	pub fn multicall_address(&self) -> Address {
		self.multicall_address
	}

	pub fn concurrent_call_limit(&self) -> i64 {
		self.concurrent_call_limit
	}

	/// A fresh, empty multicall builder
	pub fn multicaller<'a>(&self) -> MultiCaller<'a> {
		MultiCaller::new(self.client.clone(), self.multicall_address)
	}

	/// Runs one strict multicall
	///
	/// `build` adds arbitrary calls first (pass `|_| Ok(())` when there are none), then each of
	/// `queryables` adds its own. If any call fails the query fails and no output is written.
	#[instrument(skip_all)]
	pub async fn query<'a, F>(
		&self,
		build: F,
		queryables: Vec<&'a mut dyn Queryable>,
		block: BlockTag,
		token: &CancellationToken,
	) -> Result<(), QueryError>
	where
		F: FnOnce(&mut MultiCaller<'a>) -> Result<(), QueryError> + Send,
	{
		let mc = self.build(build, queryables)?;
		with_cancel(token, mc.execute(true, block)).await?;
		Ok(())
	}

	/// Runs one tolerant multicall
	///
	/// Failing calls leave their output untouched and are reported as `false` in the returned
	/// vector, which has one entry per call in the order the calls were added.
	#[instrument(skip_all)]
	pub async fn flex_query<'a, F>(
		&self,
		build: F,
		queryables: Vec<&'a mut dyn Queryable>,
		block: BlockTag,
		token: &CancellationToken,
	) -> Result<Vec<bool>, QueryError>
	where
		F: FnOnce(&mut MultiCaller<'a>) -> Result<(), QueryError> + Send,
	{
		let mc = self.build(build, queryables)?;
		with_cancel(token, mc.execute(false, block)).await
	}

	/// Runs a query too large for one multicall as concurrent strict windows
	///
	/// `query` is called once per index in `[0, count)` with the builder of the index's window.
	/// Outputs are written only after every window has succeeded.
	#[instrument(skip(self, query, token))]
	pub async fn batch_query<'a, F>(
		&self,
		count: usize,
		batch_size: usize,
		query: F,
		block: BlockTag,
		token: &CancellationToken,
	) -> Result<(), QueryError>
	where
		F: Fn(&mut MultiCaller<'a>, usize) -> Result<(), QueryError> + Send + Sync,
	{
		let staged = self
			.run_windows(count, batch_size, token, |window| {
				let query = &query;
				async move {
					let mc = self.build_window(window, query)?;
					mc.execute_staged(true, block).await
				}
			})
			.await?;
		for window in staged {
			window.commit();
		}
		Ok(())
	}

	/// Runs a query too large for one multicall as concurrent tolerant windows
	///
	/// `handle_result(success, index)` is called once per index after its window completes.
	/// Calls are ordered within a window but not across windows, so `handle_result` may run
	/// for different windows in any order.
	#[instrument(skip(self, query, handle_result, token))]
	pub async fn flex_batch_query<'a, F, H>(
		&self,
		count: usize,
		batch_size: usize,
		query: F,
		handle_result: H,
		block: BlockTag,
		token: &CancellationToken,
	) -> Result<(), QueryError>
	where
		F: Fn(&mut MultiCaller<'a>, usize) -> Result<(), QueryError> + Send + Sync,
		H: Fn(bool, usize) -> Result<(), QueryError> + Send + Sync,
	{
		self.run_windows(count, batch_size, token, |window| {
			let query = &query;
			let handle_result = &handle_result;
			async move {
				let start = window.start;
				let mc = self.build_window(window, query)?;
				let results = mc.execute(false, block).await?;
				for (offset, success) in results.into_iter().enumerate() {
					handle_result(success, start + offset)?;
				}
				Ok(())
			}
		})
		.await?;
		Ok(())
	}

	fn build<'a, F>(
		&self,
		build: F,
		queryables: Vec<&'a mut dyn Queryable>,
	) -> Result<MultiCaller<'a>, QueryError>
	where
		F: FnOnce(&mut MultiCaller<'a>) -> Result<(), QueryError>,
	{
		let mut mc = self.multicaller();
		build(&mut mc)?;
		add_queryables(&mut mc, queryables)?;
		tracing::debug!(calls = mc.len(), "Built multicall query");
		Ok(mc)
	}

	fn build_window<'a, F>(&self, window: Range<usize>, query: &F) -> Result<MultiCaller<'a>, QueryError>
	where
		F: Fn(&mut MultiCaller<'a>, usize) -> Result<(), QueryError>,
	{
		let mut mc = self.multicaller();
		for index in window {
			query(&mut mc, index)?;
		}
		Ok(mc)
	}

	/// Number of windows allowed in flight for a batch of `windows` windows
	fn window_limit(&self, windows: usize) -> usize {
		if self.concurrent_call_limit <= 0 {
			windows.max(1)
		} else {
			self.concurrent_call_limit as usize
		}
	}

	/// Runs every window of the batch, returning the window outputs in completion order
	async fn run_windows<W, Fut, T>(
		&self,
		count: usize,
		batch_size: usize,
		token: &CancellationToken,
		run_window: W,
	) -> Result<Vec<T>, QueryError>
	where
		W: FnMut(Range<usize>) -> Fut,
		Fut: std::future::Future<Output = Result<T, QueryError>>,
	{
		if batch_size == 0 && count > 0 {
			return Err(QueryError::build(
				"batch size must be greater than zero",
				None,
				None,
			));
		}
		let windows = batch_windows(count, batch_size);
		let limit = self.window_limit(windows.len());
		tracing::debug!(
			count,
			batch_size,
			windows = windows.len(),
			limit,
			"Running batched multicall query"
		);

		// Dropping the stream on the first error cancels the windows still in flight
		let batch = stream::iter(windows)
			.map(run_window)
			.buffer_unordered(limit)
			.try_collect::<Vec<_>>();
		with_cancel(token, batch).await
	}
}

async fn with_cancel<T, Fut>(token: &CancellationToken, fut: Fut) -> Result<T, QueryError>
where
	Fut: std::future::Future<Output = Result<T, QueryError>>,
{
	tokio::select! {
		biased;
		_ = token.cancelled() => Err(QueryError::cancelled("query cancelled by caller")),
		result = fut => result,
	}
}
