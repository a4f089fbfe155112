//! ERC-20 token binding.
//!
//! Name, symbol and decimals never change for a deployed token, so they are read once with a
//! single multicall when the binding is created. Balances are added to the caller's own
//! multicall so that they can be batched with other reads.

use alloy::{
	dyn_abi::DynSolValue,
	primitives::{Address, U256},
};
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
	models::{BlockTag, TransactionInfo},
	services::{
		query::{Contract, MultiCaller, QueryError, QueryManager},
		transaction::{TransactOpts, TransactionError, TransactionManager},
	},
	utils::logging::error::keys,
};

/// ABI of the ERC-20 methods used by [`Erc20Contract`]
pub const ERC20_ABI: &str = r#"[
	{"type":"function","name":"name","stateMutability":"view","inputs":[],
	 "outputs":[{"name":"","type":"string"}]},
	{"type":"function","name":"symbol","stateMutability":"view","inputs":[],
	 "outputs":[{"name":"","type":"string"}]},
	{"type":"function","name":"decimals","stateMutability":"view","inputs":[],
	 "outputs":[{"name":"","type":"uint8"}]},
	{"type":"function","name":"balanceOf","stateMutability":"view",
	 "inputs":[{"name":"_owner","type":"address"}],
	 "outputs":[{"name":"balance","type":"uint256"}]},
	{"type":"function","name":"transfer","stateMutability":"nonpayable",
	 "inputs":[{"name":"_to","type":"address"},{"name":"_value","type":"uint256"}],
	 "outputs":[{"name":"success","type":"bool"}]}
]"#;

/// A deployed ERC-20 token
pub struct Erc20Contract {
	contract: Contract,
	tx_manager: Arc<TransactionManager>,
	name: String,
	symbol: String,
	decimals: u8,
}

impl Erc20Contract {
	/// Binds the token at `address` and reads its name, symbol and decimals at `block`
	#[instrument(skip(query_manager, tx_manager, token))]
	pub async fn new(
		address: Address,
		query_manager: &QueryManager,
		tx_manager: Arc<TransactionManager>,
		block: BlockTag,
		token: &CancellationToken,
	) -> Result<Self, QueryError> {
		let contract = Contract::from_json("ERC20", address, ERC20_ABI)?;

		let mut name = String::new();
		let mut symbol = String::new();
		let mut decimals = 0u8;
		let details = {
			let contract = &contract;
			let (name, symbol, decimals) = (&mut name, &mut symbol, &mut decimals);
			query_manager
				.query(
					move |mc| {
						contract.add_call_with(mc, "name", &[], name, |v| expect_string("name", v))?;
						contract.add_call_with(mc, "symbol", &[], symbol, |v| {
							expect_string("symbol", v)
						})?;
						contract.add_call_with(mc, "decimals", &[], decimals, expect_decimals)
					},
					vec![],
					block,
					token,
				)
				.await
		};
		match details {
			Ok(()) => {}
			Err(e) if e.is_cancelled() => return Err(e),
			Err(e) => {
				return Err(QueryError::execution(
					format!("error getting ERC-20 details of token {}", address),
					Some(Box::new(e)),
					Some(HashMap::from([(keys::CONTRACT.to_string(), address.to_string())])),
				))
			}
		}
		tracing::debug!(%address, %name, %symbol, decimals, "Bound ERC-20 token");

		Ok(Self {
			contract,
			tx_manager,
			name,
			symbol,
			decimals,
		})
	}

	pub fn address(&self) -> Address {
		self.contract.address
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn decimals(&self) -> u8 {
		self.decimals
	}

	/// Adds a `balanceOf(owner)` call to `mc`, storing the balance in `balance`
	pub fn add_balance_of<'a>(
		&self,
		mc: &mut MultiCaller<'a>,
		owner: Address,
		balance: &'a mut U256,
	) -> Result<(), QueryError> {
		self.contract.add_call_with(
			mc,
			"balanceOf",
			&[DynSolValue::Address(owner)],
			balance,
			|values| match single("balanceOf", values)? {
				DynSolValue::Uint(value, _) => Ok(value),
				other => Err(unexpected("balanceOf", &other)),
			},
		)
	}

	/// Builds and simulates a transfer of `amount` base units to `to`
	pub async fn transfer(
		&self,
		to: Address,
		amount: U256,
		opts: Option<&TransactOpts>,
	) -> Result<TransactionInfo, TransactionError> {
		self.tx_manager
			.create_transaction_info(
				&self.contract,
				"transfer",
				opts,
				&[DynSolValue::Address(to), DynSolValue::Uint(amount, 256)],
			)
			.await
	}
}

fn single(method: &str, values: Vec<DynSolValue>) -> Result<DynSolValue, QueryError> {
	let count = values.len();
	let mut values = values.into_iter();
	match (values.next(), count) {
		(Some(value), 1) => Ok(value),
		_ => Err(QueryError::decode(
			format!("{} returned {} values, expected 1", method, count),
			None,
			None,
		)),
	}
}

fn unexpected(method: &str, value: &DynSolValue) -> QueryError {
	QueryError::decode(
		format!("{} returned an unexpected value: {:?}", method, value),
		None,
		None,
	)
}

fn expect_string(method: &str, values: Vec<DynSolValue>) -> Result<String, QueryError> {
	match single(method, values)? {
		DynSolValue::String(value) => Ok(value),
		other => Err(unexpected(method, &other)),
	}
}

fn expect_decimals(values: Vec<DynSolValue>) -> Result<u8, QueryError> {
	match single("decimals", values)? {
		DynSolValue::Uint(value, _) => u8::try_from(value).map_err(|_| {
			QueryError::decode(format!("decimals out of range: {}", value), None, None)
		}),
		other => Err(unexpected("decimals", &other)),
	}
}
