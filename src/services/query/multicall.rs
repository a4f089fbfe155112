//! Multicall builder.
//!
//! A [`MultiCaller`] collects read calls and runs them in a single `aggregate3` call against a
//! deployed Multicall3 contract. Each call carries a decoder for its return data and the
//! decoded value ends up in storage owned by the caller, so the builder itself never allocates
//! result types.
//!
//! Writing happens in two phases. Every decoder first decodes into a staged value and returns
//! a [`Commit`]; the commits run only once every decoder of the multicall has succeeded. A
//! failed call or a single undecodable result therefore leaves all outputs untouched.

use alloy::{
	primitives::{Address, Bytes},
	sol,
	sol_types::{SolCall, SolValue},
};
use std::{collections::HashMap, sync::Arc};

use crate::{
	models::{BlockTag, CallRequest},
	services::{blockchain::ExecutionClient, query::error::QueryError},
};

sol! {
	interface IMulticall3 {
		struct Call3 {
			address target;
			bool allowFailure;
			bytes callData;
		}

		struct Result {
			bool success;
			bytes returnData;
		}

		function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
	}
}

/// Stores a staged value into the caller's output
pub type Commit<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Decodes the return data of one call without touching the caller's output
pub type Decoder<'a> = Box<dyn FnOnce(&[u8]) -> Result<Commit<'a>, QueryError> + Send + 'a>;

/// A commit that moves `value` into `output`
pub fn stage<'a, T: Send + 'a>(output: &'a mut T, value: T) -> Commit<'a> {
	Box::new(move || *output = value)
}

/// A decoder for calls whose return data is not needed, only their success
pub fn discard_output<'a>() -> Decoder<'a> {
	Box::new(|_: &[u8]| -> Result<Commit<'a>, QueryError> { Ok(Box::new(|| {})) })
}

/// Decoded results of one multicall, not yet written to the outputs
pub struct StagedResults<'a> {
	successes: Vec<bool>,
	commits: Vec<Commit<'a>>,
}

impl StagedResults<'_> {
	/// Per-call success flags, in insertion order
	pub fn successes(&self) -> &[bool] {
		&self.successes
	}

	/// Writes every staged value to its output
	pub fn commit(self) -> Vec<bool> {
		for commit in self.commits {
			commit();
		}
		self.successes
	}
}

/// Anything that can add its own reads to a multicall
///
/// Aggregates implement this by forwarding to each of their queryable fields.
pub trait Queryable: Send {
	fn add_to_query<'a>(&'a mut self, mc: &mut MultiCaller<'a>) -> Result<(), QueryError>;
}

/// Adds every queryable's calls to `mc`, in order
pub fn add_queryables<'a>(
	mc: &mut MultiCaller<'a>,
	queryables: Vec<&'a mut dyn Queryable>,
) -> Result<(), QueryError> {
	for queryable in queryables {
		queryable.add_to_query(mc)?;
	}
	Ok(())
}

/// Builder for one `aggregate3` round trip
pub struct MultiCaller<'a> {
	client: Arc<dyn ExecutionClient>,
	multicall_address: Address,
	calls: Vec<IMulticall3::Call3>,
	decoders: Vec<Decoder<'a>>,
}

impl<'a> MultiCaller<'a> {
	pub fn new(client: Arc<dyn ExecutionClient>, multicall_address: Address) -> Self {
		Self {
			client,
			multicall_address,
			calls: Vec::new(),
			decoders: Vec::new(),
		}
	}

	pub fn multicall_address(&self) -> Address {
		self.multicall_address
	}

	/// Number of calls added so far
	pub fn len(&self) -> usize {
		self.calls.len()
	}

	pub fn is_empty(&self) -> bool {
		self.calls.is_empty()
	}

	/// Adds a call with already encoded call data
	pub fn add_raw_call(&mut self, target: Address, call_data: Bytes, decoder: Decoder<'a>) {
		self.calls.push(IMulticall3::Call3 {
			target,
			allowFailure: false,
			callData: call_data,
		});
		self.decoders.push(decoder);
	}

	/// Adds a typed call whose single return value is decoded into `output`
	pub fn add_call<C>(&mut self, target: Address, call: C, output: &'a mut C::Return)
	where
		C: SolCall + 'a,
		C::Return: Send + 'a,
	{
		let decoder: Decoder<'a> = Box::new(move |data: &[u8]| -> Result<Commit<'a>, QueryError> {
			let value = C::abi_decode_returns(data).map_err(|e| {
				QueryError::decode(
					format!("failed to decode return data of {}", C::SIGNATURE),
					Some(Box::new(e)),
					Some(HashMap::from([("target".to_string(), target.to_string())])),
				)
			})?;
			Ok(stage(output, value))
		});
		self.add_raw_call(target, call.abi_encode().into(), decoder);
	}

	/// Adds a call whose return data is a single ABI value, decoded into `output`
	pub fn add_value_call<T>(&mut self, target: Address, call_data: Bytes, output: &'a mut T)
	where
		T: SolValue + From<<T::SolType as alloy::sol_types::SolType>::RustType> + Send + 'a,
	{
		let decoder: Decoder<'a> = Box::new(move |data: &[u8]| -> Result<Commit<'a>, QueryError> {
			let value = T::abi_decode(data).map_err(|e| {
				QueryError::decode(
					"failed to decode return value",
					Some(Box::new(e)),
					Some(HashMap::from([("target".to_string(), target.to_string())])),
				)
			})?;
			Ok(stage(output, value))
		});
		self.add_raw_call(target, call_data, decoder);
	}

	/// Runs every added call in one `aggregate3` call at `block` and writes the outputs
	///
	/// With `require_success`, a single failing call fails the whole multicall and no decoder
	/// runs. Otherwise failing calls are skipped and reported as `false` in the returned
	/// vector, which has one entry per added call in insertion order. In both modes an
	/// undecodable result fails the multicall before any output is written.
	pub async fn execute(
		self,
		require_success: bool,
		block: BlockTag,
	) -> Result<Vec<bool>, QueryError> {
		Ok(self.execute_staged(require_success, block).await?.commit())
	}

	/// Same as [`MultiCaller::execute`], but leaves the decoded values staged so that several
	/// multicalls can be committed together
	pub async fn execute_staged(
		self,
		require_success: bool,
		block: BlockTag,
	) -> Result<StagedResults<'a>, QueryError> {
		if self.calls.is_empty() {
			return Ok(StagedResults {
				successes: Vec::new(),
				commits: Vec::new(),
			});
		}

		let call_count = self.calls.len();
		let calls = self
			.calls
			.into_iter()
			.map(|mut call| {
				call.allowFailure = !require_success;
				call
			})
			.collect();
		let data = IMulticall3::aggregate3Call { calls }.abi_encode();
		let request = CallRequest::new(self.multicall_address, data.into());

		let response = self.client.call_contract(request, block).await?;
		let results = Vec::<IMulticall3::Result>::abi_decode(&response).map_err(|e| {
			QueryError::execution(
				"failed to decode aggregate3 results",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"multicall".to_string(),
					self.multicall_address.to_string(),
				)])),
			)
		})?;
		if results.len() != call_count {
			return Err(QueryError::execution(
				format!(
					"aggregate3 returned {} results for {} calls",
					results.len(),
					call_count
				),
				None,
				None,
			));
		}

		if require_success {
			if let Some(index) = results.iter().position(|r| !r.success) {
				return Err(QueryError::call_failed(index, "call reverted"));
			}
		}

		let mut successes = Vec::with_capacity(call_count);
		let mut commits = Vec::with_capacity(call_count);
		for (index, (result, decoder)) in results.into_iter().zip(self.decoders).enumerate() {
			if result.success {
				let commit = decoder(&result.returnData[..]).inspect_err(|_| {
					tracing::debug!(index, "multicall result could not be decoded");
				})?;
				commits.push(commit);
			}
			successes.push(result.success);
		}
		Ok(StagedResults { successes, commits })
	}
}

/// Encodes the `aggregate3` return data for `results`
///
/// Useful to fake a multicall contract behind a mocked execution client.
pub fn encode_aggregate3_results(results: Vec<(bool, Bytes)>) -> Bytes {
	results
		.into_iter()
		.map(|(success, return_data)| IMulticall3::Result {
			success,
			returnData: return_data,
		})
		.collect::<Vec<_>>()
		.abi_encode()
		.into()
}

/// Decodes the calls out of `aggregate3` call data; the counterpart of
/// [`encode_aggregate3_results`]
pub fn decode_aggregate3_calls(call_data: &[u8]) -> Result<Vec<(Address, bool, Bytes)>, QueryError> {
	let call = IMulticall3::aggregate3Call::abi_decode(call_data).map_err(|e| {
		QueryError::decode("failed to decode aggregate3 call data", Some(Box::new(e)), None)
	})?;
	Ok(call
		.calls
		.into_iter()
		.map(|c| (c.target, c.allowFailure, c.callData))
		.collect())
}
