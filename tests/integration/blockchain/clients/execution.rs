use alloy::primitives::{address, b256, Bytes, U256};
use chain_client_manager::{
	models::{BlockTag, CallRequest},
	services::blockchain::{BlockChainError, EvmClient, ExecutionClient, HttpTransportClient},
	utils::tests::create_test_transport,
};
use mockito::Server;
use serde_json::json;

use crate::integration::mocks::{block_header_json, create_rpc_error_mock, create_rpc_result_mock};

fn client_for(url: &str) -> EvmClient<HttpTransportClient> {
	EvmClient::new_with_transport(create_test_transport(url))
}

#[tokio::test]
async fn test_chain_id_and_block_number() {
	let mut server = Server::new_async().await;
	let chain_id = create_rpc_result_mock(&mut server, "eth_chainId", json!("0x4268"));
	let block_number = create_rpc_result_mock(&mut server, "eth_blockNumber", json!("0x10"));

	let client = client_for(&server.url());

	assert_eq!(client.chain_id().await.unwrap(), 17000);
	assert_eq!(client.block_number().await.unwrap(), 16);
	chain_id.assert();
	block_number.assert();
}

#[tokio::test]
async fn test_balance_and_nonce() {
	let mut server = Server::new_async().await;
	let balance = create_rpc_result_mock(
		&mut server,
		"eth_getBalance",
		json!("0xde0b6b3a7640000"),
	);
	let nonce = create_rpc_result_mock(&mut server, "eth_getTransactionCount", json!("0x7"));

	let client = client_for(&server.url());
	let account = address!("0x1111111111111111111111111111111111111111");

	assert_eq!(
		client.balance_at(account, BlockTag::Latest).await.unwrap(),
		U256::from(1_000_000_000_000_000_000u64)
	);
	assert_eq!(client.pending_nonce_at(account).await.unwrap(), 7);
	balance.assert();
	nonce.assert();
}

#[tokio::test]
async fn test_header_by_number() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_result_mock(
		&mut server,
		"eth_getBlockByNumber",
		block_header_json(100, 12),
	);

	let client = client_for(&server.url());
	let header = client.header_by_number(BlockTag::Latest).await.unwrap();

	assert_eq!(header.number(), 100);
	assert_eq!(header.base_fee_per_gas, Some(U256::from(1_000_000_000u64)));
	mock.assert();
}

#[tokio::test]
async fn test_missing_block_is_not_found() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_result_mock(&mut server, "eth_getBlockByNumber", json!(null));

	let client = client_for(&server.url());
	let err = client
		.header_by_number(BlockTag::Number(1_000_000))
		.await
		.unwrap_err();

	assert!(err.is_not_found());
	assert!(!err.is_disconnection());
	mock.assert();
}

#[tokio::test]
async fn test_transaction_by_hash() {
	let mut server = Server::new_async().await;
	let hash = b256!("0x2222222222222222222222222222222222222222222222222222222222222222");
	let mock = create_rpc_result_mock(
		&mut server,
		"eth_getTransactionByHash",
		json!({
			"hash": hash,
			"nonce": "0x5",
			"blockHash": null,
			"blockNumber": null,
			"from": "0x1111111111111111111111111111111111111111",
			"to": "0x3333333333333333333333333333333333333333",
			"value": "0x0",
			"gas": "0x5208",
			"input": "0x"
		}),
	);

	let client = client_for(&server.url());
	let (tx, pending) = client.transaction_by_hash(hash).await.unwrap();

	assert!(pending);
	assert_eq!(tx.hash, hash);
	assert_eq!(tx.nonce(), 5);
	mock.assert();
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_result_mock(&mut server, "eth_getTransactionByHash", json!(null));

	let client = client_for(&server.url());
	let err = client
		.transaction_by_hash(b256!(
			"0x4444444444444444444444444444444444444444444444444444444444444444"
		))
		.await
		.unwrap_err();

	assert!(err.is_not_found());
	mock.assert();
}

#[tokio::test]
async fn test_receipt_of_unmined_transaction_is_none() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_result_mock(&mut server, "eth_getTransactionReceipt", json!(null));

	let client = client_for(&server.url());
	let receipt = client
		.transaction_receipt(b256!(
			"0x4444444444444444444444444444444444444444444444444444444444444444"
		))
		.await
		.unwrap();

	assert!(receipt.is_none());
	mock.assert();
}

#[tokio::test]
async fn test_sync_progress() {
	let mut server = Server::new_async().await;
	let synced = create_rpc_result_mock(&mut server, "eth_syncing", json!(false));
	let client = client_for(&server.url());
	assert!(client.sync_progress().await.unwrap().is_none());
	synced.assert();
	synced.remove();

	let syncing = create_rpc_result_mock(
		&mut server,
		"eth_syncing",
		json!({ "startingBlock": "0x0", "currentBlock": "0x32", "highestBlock": "0x64" }),
	);
	let progress = client.sync_progress().await.unwrap().unwrap();
	assert_eq!(progress.progress(), 0.5);
	syncing.assert();
}

#[tokio::test]
async fn test_call_revert_keeps_error_data() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_error_mock(
		&mut server,
		"eth_call",
		3,
		"execution reverted",
		Some(json!("0x08c379a0")),
	);

	let client = client_for(&server.url());
	let err = client
		.call_contract(
			CallRequest::new(
				address!("0x3333333333333333333333333333333333333333"),
				Bytes::from(vec![0x12, 0x34, 0x56, 0x78]),
			),
			BlockTag::Latest,
		)
		.await
		.unwrap_err();

	assert!(matches!(err, BlockChainError::RequestError(_)));
	assert!(err.to_string().contains("execution reverted"));
	assert_eq!(err.rpc_data(), Some(&json!("0x08c379a0")));
	mock.assert();
}

#[tokio::test]
async fn test_send_raw_transaction_returns_hash() {
	let mut server = Server::new_async().await;
	let hash = b256!("0x5555555555555555555555555555555555555555555555555555555555555555");
	let mock = create_rpc_result_mock(&mut server, "eth_sendRawTransaction", json!(hash));

	let client = client_for(&server.url());
	let reported = client
		.send_raw_transaction(Bytes::from(vec![0x02, 0xf8]))
		.await
		.unwrap();

	assert_eq!(reported, hash);
	mock.assert();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_disconnection() {
	let client = client_for("http://127.0.0.1:9");
	let err = client.block_number().await.unwrap_err();

	assert!(err.is_disconnection(), "unexpected error: {:?}", err);
}
