//! Named contract with a dynamic ABI.

use alloy::{
	dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
	json_abi::{Function, JsonAbi},
	primitives::{Address, Bytes},
};
use std::collections::HashMap;

use crate::{
	services::query::{
		error::QueryError,
		multicall::{stage, Commit, Decoder, MultiCaller},
	},
	utils::logging::error::keys,
};

/// A deployed contract and the ABI used to talk to it
#[derive(Debug, Clone)]
pub struct Contract {
	/// Human readable name, used in errors and logs
	pub name: String,
	pub address: Address,
	pub abi: JsonAbi,
}

impl Contract {
	pub fn new(name: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
		Self {
			name: name.into(),
			address,
			abi,
		}
	}

	/// Creates a contract from its JSON ABI
	pub fn from_json(
		name: impl Into<String>,
		address: Address,
		abi_json: &str,
	) -> Result<Self, QueryError> {
		let name = name.into();
		let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| {
			QueryError::build(
				format!("invalid ABI for contract {}", name),
				Some(Box::new(e)),
				None,
			)
		})?;
		Ok(Self::new(name, address, abi))
	}

	/// Looks up a method by name; overloaded methods resolve to the first declaration
	pub fn function(&self, method: &str) -> Result<&Function, QueryError> {
		self.abi
			.function(method)
			.and_then(|overloads| overloads.first())
			.ok_or_else(|| {
				QueryError::build(
					format!("contract {} has no method named {}", self.name, method),
					None,
					Some(self.metadata()),
				)
			})
	}

	/// ABI-encodes a call to `method`
	pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes, QueryError> {
		let function = self.function(method)?;
		let data = function.abi_encode_input(args).map_err(|e| {
			QueryError::build(
				format!("error encoding call to {}.{}", self.name, method),
				Some(Box::new(e)),
				Some(self.metadata()),
			)
		})?;
		Ok(data.into())
	}

	/// Decodes the return data of `method`
	pub fn decode_output(&self, method: &str, data: &[u8]) -> Result<Vec<DynSolValue>, QueryError> {
		let function = self.function(method)?;
		decode_function_output(&self.name, function, data)
	}

	/// Adds a call to `method` to the multicall, storing the decoded return values in `output`
	pub fn add_call<'a>(
		&self,
		mc: &mut MultiCaller<'a>,
		method: &str,
		args: &[DynSolValue],
		output: &'a mut Vec<DynSolValue>,
	) -> Result<(), QueryError> {
		self.add_call_with(mc, method, args, output, Ok)
	}

	/// Adds a call to `method` to the multicall, converting the decoded return values with
	/// `convert` before they are stored in `output`
	///
	/// A conversion error fails the multicall like a decoding error does.
	pub fn add_call_with<'a, T, F>(
		&self,
		mc: &mut MultiCaller<'a>,
		method: &str,
		args: &[DynSolValue],
		output: &'a mut T,
		convert: F,
	) -> Result<(), QueryError>
	where
		T: Send + 'a,
		F: FnOnce(Vec<DynSolValue>) -> Result<T, QueryError> + Send + 'a,
	{
		let call_data = self.encode_call(method, args)?;
		let function = self.function(method)?.clone();
		let name = self.name.clone();
		let decoder: Decoder<'a> = Box::new(move |data: &[u8]| -> Result<Commit<'a>, QueryError> {
			let value = convert(decode_function_output(&name, &function, data)?)?;
			Ok(stage(output, value))
		});
		mc.add_raw_call(self.address, call_data, decoder);
		Ok(())
	}

	fn metadata(&self) -> HashMap<String, String> {
		HashMap::from([
			(keys::CONTRACT.to_string(), self.name.clone()),
			("address".to_string(), self.address.to_string()),
		])
	}
}

fn decode_function_output(
	contract: &str,
	function: &Function,
	data: &[u8],
) -> Result<Vec<DynSolValue>, QueryError> {
	function.abi_decode_output(data).map_err(|e| {
		QueryError::decode(
			format!("error decoding output of {}.{}", contract, function.name),
			Some(Box::new(e)),
			None,
		)
	})
}
