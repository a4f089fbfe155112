use alloy::{
	primitives::{address, Address, Bytes, U256},
	sol,
	sol_types::{SolCall, SolValue},
};
use chain_client_manager::{
	models::BlockTag,
	services::{
		blockchain::ExecutionClient,
		contracts::Erc20Contract,
		query::{decode_aggregate3_calls, encode_aggregate3_results, QueryError, QueryManager},
		transaction::{TransactOpts, TransactionManager},
	},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::integration::mocks::{nonce_hashing_signer, MockExecutionClient};

const MULTICALL: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");
const TOKEN: Address = address!("0xD33526068D116cE69F19A9ee46F0bd304F21A51f");
const SENDER: Address = address!("0x5555555555555555555555555555555555555555");

sol! {
	interface IErc20 {
		function name() external view returns (string);
		function symbol() external view returns (string);
		function decimals() external view returns (uint8);
		function balanceOf(address owner) external view returns (uint256);
		function transfer(address to, uint256 value) external returns (bool);
	}
}

/// Return data of a token with 18 decimals whose balances are `1000 * last byte of the owner`
fn token_answer(data: &[u8], decimals: u64) -> Bytes {
	let selector = &data[..4];
	let encoded = if selector == IErc20::nameCall::SELECTOR {
		(String::from("Rocket Pool Protocol"),).abi_encode_params()
	} else if selector == IErc20::symbolCall::SELECTOR {
		(String::from("RPL"),).abi_encode_params()
	} else if selector == IErc20::decimalsCall::SELECTOR {
		U256::from(decimals).abi_encode()
	} else if selector == IErc20::balanceOfCall::SELECTOR {
		let owner = Address::from_slice(&data[16..36]);
		U256::from(1000 * owner.0[19] as u64).abi_encode()
	} else {
		panic!("unexpected call {:?}", Bytes::copy_from_slice(data));
	};
	encoded.into()
}

fn token_client(client: &mut MockExecutionClient, decimals: u64) {
	client.expect_call_contract().returning(move |request, _| {
		assert_eq!(request.to, Some(MULTICALL));
		let calls = decode_aggregate3_calls(request.data.as_deref().map(|d| &d[..]).unwrap_or_default()).unwrap();
		Ok(encode_aggregate3_results(
			calls
				.into_iter()
				.map(|(target, _, data)| {
					assert_eq!(target, TOKEN);
					(true, token_answer(&data, decimals))
				})
				.collect(),
		))
	});
}

fn managers(client: MockExecutionClient) -> (QueryManager, Arc<TransactionManager>) {
	let client: Arc<dyn ExecutionClient> = Arc::new(client);
	let tx_manager = TransactionManager::new(client.clone(), 10_000, 1.5, 30_000_000).unwrap();
	(QueryManager::new(client, MULTICALL, 0), Arc::new(tx_manager))
}

async fn bind(query_manager: &QueryManager, tx_manager: Arc<TransactionManager>) -> Erc20Contract {
	Erc20Contract::new(
		TOKEN,
		query_manager,
		tx_manager,
		BlockTag::Latest,
		&CancellationToken::new(),
	)
	.await
	.unwrap()
}

#[tokio::test]
async fn test_binding_reads_token_details_once() {
	let mut client = MockExecutionClient::new();
	token_client(&mut client, 18);
	let (query_manager, tx_manager) = managers(client);

	let token = bind(&query_manager, tx_manager).await;

	assert_eq!(token.address(), TOKEN);
	assert_eq!(token.name(), "Rocket Pool Protocol");
	assert_eq!(token.symbol(), "RPL");
	assert_eq!(token.decimals(), 18);
}

#[tokio::test]
async fn test_balances_join_the_callers_multicall() {
	let mut client = MockExecutionClient::new();
	token_client(&mut client, 18);
	let (query_manager, tx_manager) = managers(client);
	let token = bind(&query_manager, tx_manager).await;

	let mut first = U256::ZERO;
	let mut second = U256::ZERO;
	query_manager
		.query(
			|mc| {
				token.add_balance_of(mc, Address::repeat_byte(0x01), &mut first)?;
				token.add_balance_of(mc, Address::repeat_byte(0x02), &mut second)
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap();

	assert_eq!(first, U256::from(1000));
	assert_eq!(second, U256::from(2000));
}

#[tokio::test]
async fn test_out_of_range_decimals_fail_binding() {
	let mut client = MockExecutionClient::new();
	token_client(&mut client, 300);
	let (query_manager, tx_manager) = managers(client);

	let err = Erc20Contract::new(
		TOKEN,
		&query_manager,
		tx_manager,
		BlockTag::Latest,
		&CancellationToken::new(),
	)
	.await
	.err()
	.unwrap();

	assert!(matches!(err, QueryError::Execution(_)));
	assert!(err.to_string().contains("error getting ERC-20 details of token"));
}

#[tokio::test]
async fn test_transfer_is_simulated_for_the_sender() {
	let mut client = MockExecutionClient::new();
	token_client(&mut client, 18);
	client
		.expect_estimate_gas()
		.withf(|call| {
			let data = call.data.as_deref().map(|d| &d[..]).unwrap_or_default();
			call.from == Some(SENDER)
				&& call.to == Some(TOKEN)
				&& data[..4] == IErc20::transferCall::SELECTOR
		})
		.times(1)
		.returning(|_| Ok(50_000));
	let (query_manager, tx_manager) = managers(client);
	let token = bind(&query_manager, tx_manager).await;

	let opts = TransactOpts::new(Arc::new(nonce_hashing_signer(SENDER)));
	let info = token
		.transfer(Address::repeat_byte(0x07), U256::from(25), Some(&opts))
		.await
		.unwrap();

	assert_eq!(info.to, TOKEN);
	assert_eq!(info.value, U256::ZERO);
	assert_eq!(
		info.data,
		Bytes::from(
			IErc20::transferCall {
				to: Address::repeat_byte(0x07),
				value: U256::from(25),
			}
			.abi_encode()
		)
	);
	assert!(info.simulation.is_simulated);
	assert_eq!(info.simulation.estimated_gas_limit, 50_000);
	// ceil(50_000 * 1.5) + 10_000
	assert_eq!(info.simulation.safe_gas_limit, 85_000);
}
