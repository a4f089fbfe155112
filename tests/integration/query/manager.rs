use alloy::{
	dyn_abi::DynSolValue,
	primitives::{address, Address, Bytes, U256},
	sol,
	sol_types::SolValue,
};
use chain_client_manager::{
	models::BlockTag,
	services::{
		blockchain::BlockChainError,
		query::{
			decode_aggregate3_calls, discard_output, encode_aggregate3_results, Commit, Contract,
			Decoder, MultiCaller, QueryError, QueryManager, Queryable,
		},
	},
};
use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc, Mutex,
};
use tokio_util::sync::CancellationToken;

use crate::integration::mocks::{disconnected, MockExecutionClient};

const MULTICALL: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");
const TOKEN: Address = address!("0x4444444444444444444444444444444444444444");

sol! {
	function balanceOf(address owner) external view returns (uint256);
}

/// A Multicall3 that answers every call with its own call data, failing the calls `fails`
/// selects
fn echo_multicall(fails: impl Fn(&Bytes) -> bool + Send + Sync + 'static) -> MockExecutionClient {
	let mut client = MockExecutionClient::new();
	client.expect_call_contract().returning(move |request, _| {
		assert_eq!(request.to, Some(MULTICALL));
		let calls = decode_aggregate3_calls(request.data.as_deref().map(|d| &d[..]).unwrap_or_default()).unwrap();
		Ok(encode_aggregate3_results(
			calls
				.into_iter()
				.map(|(_, _, data)| (!fails(&data), data))
				.collect(),
		))
	});
	client
}

fn manager(client: MockExecutionClient, limit: i64) -> QueryManager {
	QueryManager::new(Arc::new(client), MULTICALL, limit)
}

fn value_call(value: u64) -> Bytes {
	U256::from(value).abi_encode().into()
}

fn is_value(data: &Bytes, value: u64) -> bool {
	U256::abi_decode(data).map(|v| v == U256::from(value)).unwrap_or(false)
}

/// Decodes a value and stores it at `index` once the query commits
fn store_at<'a>(results: &'a Mutex<Vec<U256>>, index: usize) -> Decoder<'a> {
	Box::new(move |data: &[u8]| -> Result<Commit<'a>, QueryError> {
		let value = U256::abi_decode(data)
			.map_err(|e| QueryError::decode("bad value", Some(Box::new(e)), None))?;
		Ok(Box::new(move || results.lock().unwrap()[index] = value))
	})
}

struct Balances {
	owner: Address,
	balance: U256,
	other: U256,
}

impl Queryable for Balances {
	fn add_to_query<'a>(&'a mut self, mc: &mut MultiCaller<'a>) -> Result<(), QueryError> {
		mc.add_value_call(TOKEN, value_call(11), &mut self.balance);
		mc.add_value_call(TOKEN, value_call(self.owner.0[19] as u64), &mut self.other);
		Ok(())
	}
}

#[tokio::test]
async fn test_query_decodes_into_outputs() {
	let mut client = MockExecutionClient::new();
	client
		.expect_call_contract()
		.withf(|_, block| *block == BlockTag::Number(77))
		.times(1)
		.returning(|request, _| {
			let calls = decode_aggregate3_calls(request.data.as_deref().map(|d| &d[..]).unwrap_or_default()).unwrap();
			assert_eq!(calls.len(), 3);
			// Strict queries never allow a call to fail
			assert!(calls.iter().all(|(_, allow_failure, _)| !allow_failure));
			assert_eq!(calls[0].0, TOKEN);
			Ok(encode_aggregate3_results(vec![
				(true, U256::from(500).abi_encode().into()),
				(true, value_call(11)),
				(true, value_call(0x22)),
			]))
		});

	let mut typed = U256::ZERO;
	let mut balances = Balances {
		owner: Address::repeat_byte(0x22),
		balance: U256::ZERO,
		other: U256::ZERO,
	};

	manager(client, 0)
		.query(
			|mc| {
				mc.add_call(
					TOKEN,
					balanceOfCall {
						owner: Address::repeat_byte(0x01),
					},
					&mut typed,
				);
				Ok(())
			},
			vec![&mut balances as &mut dyn Queryable],
			BlockTag::Number(77),
			&CancellationToken::new(),
		)
		.await
		.unwrap();

	assert_eq!(typed, U256::from(500));
	assert_eq!(balances.balance, U256::from(11));
	assert_eq!(balances.other, U256::from(0x22));
}

#[tokio::test]
async fn test_strict_query_fails_without_decoding() {
	let client = echo_multicall(|data| is_value(data, 2));

	let mut outputs = [U256::ZERO; 3];
	let [first, second, third] = &mut outputs;
	let err = manager(client, 0)
		.query(
			|mc| {
				mc.add_value_call(TOKEN, value_call(1), first);
				mc.add_value_call(TOKEN, value_call(2), second);
				mc.add_value_call(TOKEN, value_call(3), third);
				Ok(())
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, QueryError::CallFailed { index: 1, .. }));
	assert_eq!(outputs, [U256::ZERO; 3]);
}

#[tokio::test]
async fn test_undecodable_result_writes_no_output() {
	let client = echo_multicall(|_| false);

	let mut outputs = [U256::ZERO; 2];
	let [first, second] = &mut outputs;
	let err = manager(client, 0)
		.query(
			|mc| {
				mc.add_value_call(TOKEN, value_call(7), first);
				// Echoed back as a single byte, too short for a uint256
				mc.add_value_call(TOKEN, Bytes::from(vec![0x01]), second);
				Ok(())
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, QueryError::Decode(_)));
	assert_eq!(outputs, [U256::ZERO; 2]);
}

#[tokio::test]
async fn test_flex_query_undecodable_result_writes_no_output() {
	let client = echo_multicall(|data| is_value(data, 2));

	let mut outputs = [U256::from(99); 3];
	let [first, second, third] = &mut outputs;
	let err = manager(client, 0)
		.flex_query(
			|mc| {
				mc.add_value_call(TOKEN, value_call(1), first);
				mc.add_value_call(TOKEN, value_call(2), second);
				mc.add_value_call(TOKEN, Bytes::from(vec![0x01]), third);
				Ok(())
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, QueryError::Decode(_)));
	assert_eq!(outputs, [U256::from(99); 3]);
}

#[tokio::test]
async fn test_flex_query_reports_failures() {
	let mut client = MockExecutionClient::new();
	client.expect_call_contract().times(1).returning(|request, _| {
		let calls = decode_aggregate3_calls(request.data.as_deref().map(|d| &d[..]).unwrap_or_default()).unwrap();
		assert!(calls.iter().all(|(_, allow_failure, _)| *allow_failure));
		Ok(encode_aggregate3_results(
			calls
				.into_iter()
				.map(|(_, _, data)| (!is_value(&data, 2), data))
				.collect(),
		))
	});

	let mut outputs = [U256::from(99); 3];
	let [first, second, third] = &mut outputs;
	let results = manager(client, 0)
		.flex_query(
			|mc| {
				mc.add_value_call(TOKEN, value_call(1), first);
				mc.add_value_call(TOKEN, value_call(2), second);
				mc.add_value_call(TOKEN, value_call(3), third);
				Ok(())
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap();

	assert_eq!(results, vec![true, false, true]);
	assert_eq!(outputs, [U256::from(1), U256::from(99), U256::from(3)]);
}

#[tokio::test]
async fn test_empty_query_makes_no_call() {
	// No expectations: any call fails the test
	let client = MockExecutionClient::new();

	let results = manager(client, 0)
		.flex_query(|_| Ok(()), vec![], BlockTag::Latest, &CancellationToken::new())
		.await
		.unwrap();

	assert!(results.is_empty());
}

#[tokio::test]
async fn test_client_errors_are_passed_through() {
	let mut client = MockExecutionClient::new();
	client
		.expect_call_contract()
		.returning(|_, _| Err(disconnected()));

	let mut output = U256::ZERO;
	let err = manager(client, 0)
		.query(
			|mc| {
				mc.add_value_call(TOKEN, value_call(1), &mut output);
				Ok(())
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		QueryError::Client(BlockChainError::ConnectionError(_))
	));
}

#[tokio::test]
async fn test_cancelled_query_makes_no_call() {
	let client = MockExecutionClient::new();
	let token = CancellationToken::new();
	token.cancel();

	let mut output = U256::ZERO;
	let err = manager(client, 0)
		.query(
			|mc| {
				mc.add_value_call(TOKEN, value_call(1), &mut output);
				Ok(())
			},
			vec![],
			BlockTag::Latest,
			&token,
		)
		.await
		.unwrap_err();

	assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_batch_query_splits_into_windows() {
	let window_sizes = Arc::new(Mutex::new(Vec::new()));
	let sizes = window_sizes.clone();
	let mut client = MockExecutionClient::new();
	client.expect_call_contract().times(4).returning(move |request, _| {
		let calls = decode_aggregate3_calls(request.data.as_deref().map(|d| &d[..]).unwrap_or_default()).unwrap();
		sizes.lock().unwrap().push(calls.len());
		Ok(encode_aggregate3_results(
			calls.into_iter().map(|(_, _, data)| (true, data)).collect(),
		))
	});

	let results = Mutex::new(vec![U256::ZERO; 10]);
	manager(client, 2)
		.batch_query(
			10,
			3,
			|mc, index| {
				mc.add_raw_call(TOKEN, value_call(index as u64 * 10), store_at(&results, index));
				Ok(())
			},
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap();

	let results = results.into_inner().unwrap();
	for (index, value) in results.iter().enumerate() {
		assert_eq!(*value, U256::from(index * 10));
	}
	let mut sizes = window_sizes.lock().unwrap().clone();
	sizes.sort_unstable();
	assert_eq!(sizes, vec![1, 3, 3, 3]);
}

#[tokio::test]
async fn test_batch_query_fails_with_first_window_error() {
	let client = echo_multicall(|data| is_value(data, 7));

	let err = manager(client, 1)
		.batch_query(
			9,
			3,
			|mc, index| {
				mc.add_raw_call(TOKEN, value_call(index as u64), discard_output());
				Ok(())
			},
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	// Index 7 is the second call of the third window
	assert!(matches!(err, QueryError::CallFailed { index: 1, .. }));
}

#[tokio::test]
async fn test_failed_batch_writes_no_window() {
	let client = echo_multicall(|data| is_value(data, 4));

	let results = Mutex::new(vec![U256::from(99); 6]);
	// One window in flight at a time, so the first window completes before the second fails
	let err = manager(client, 1)
		.batch_query(
			6,
			3,
			|mc, index| {
				mc.add_raw_call(TOKEN, value_call(index as u64), store_at(&results, index));
				Ok(())
			},
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, QueryError::CallFailed { index: 1, .. }));
	assert_eq!(results.into_inner().unwrap(), vec![U256::from(99); 6]);
}

#[tokio::test]
async fn test_flex_batch_query_reports_every_index() {
	let client = echo_multicall(|data| {
		U256::abi_decode(data)
			.map(|v| v % U256::from(4) == U256::ZERO)
			.unwrap_or(true)
	});

	let reported = Mutex::new(Vec::new());
	manager(client, 0)
		.flex_batch_query(
			10,
			4,
			|mc, index| {
				mc.add_raw_call(TOKEN, value_call(index as u64), discard_output());
				Ok(())
			},
			|success, index| {
				reported.lock().unwrap().push((index, success));
				Ok(())
			},
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap();

	let mut reported = reported.into_inner().unwrap();
	reported.sort_unstable();
	let expected: Vec<(usize, bool)> = (0..10).map(|i| (i, i % 4 != 0)).collect();
	assert_eq!(reported, expected);
}

#[tokio::test]
async fn test_batch_query_rejects_zero_batch_size() {
	let client = MockExecutionClient::new();
	let calls = AtomicUsize::new(0);

	let err = manager(client, 0)
		.batch_query(
			5,
			0,
			|_, _| {
				calls.fetch_add(1, Ordering::SeqCst);
				Ok(())
			},
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap_err();

	assert!(matches!(err, QueryError::Build(_)));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
	let client = MockExecutionClient::new();

	manager(client, 0)
		.batch_query(
			0,
			0,
			|_, _| Ok(()),
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap();
}

#[tokio::test]
async fn test_contract_calls_through_dynamic_abi() {
	let abi = r#"[{
		"type": "function",
		"name": "balanceOf",
		"stateMutability": "view",
		"inputs": [{ "name": "owner", "type": "address" }],
		"outputs": [{ "name": "", "type": "uint256" }]
	}]"#;
	let contract = Contract::from_json("token", TOKEN, abi).unwrap();

	let mut client = MockExecutionClient::new();
	client.expect_call_contract().times(1).returning(|request, _| {
		let calls = decode_aggregate3_calls(request.data.as_deref().map(|d| &d[..]).unwrap_or_default()).unwrap();
		assert_eq!(calls[0].0, TOKEN);
		assert_eq!(&calls[0].2[..4], &[0x70, 0xa0, 0x82, 0x31]);
		Ok(encode_aggregate3_results(vec![(
			true,
			U256::from(1234).abi_encode().into(),
		)]))
	});

	let mut output = Vec::new();
	manager(client, 0)
		.query(
			|mc| {
				contract.add_call(
					mc,
					"balanceOf",
					&[DynSolValue::Address(Address::repeat_byte(0x01))],
					&mut output,
				)
			},
			vec![],
			BlockTag::Latest,
			&CancellationToken::new(),
		)
		.await
		.unwrap();

	assert_eq!(output, vec![DynSolValue::Uint(U256::from(1234), 256)]);
	assert!(matches!(
		contract.encode_call("transfer", &[]),
		Err(QueryError::Build(_))
	));
}
