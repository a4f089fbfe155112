use chain_client_manager::{
	bootstrap::ServiceProvider,
	services::blockchain::{ClientManager, ExecutionClient},
	utils::tests::builders::config::ClientManagerConfigBuilder,
};
use mockito::Server;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

use crate::integration::mocks::{
	block_header_json, create_beacon_get_mock, create_rpc_result_mock, ENV_LOCK,
};

#[tokio::test]
async fn test_from_config_path_builds_services() {
	let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("clients.json");
	fs::write(
		&path,
		json!({
			"execution": {
				"primary_url": "http://localhost:8545",
				"fallback_url": "http://localhost:8546",
				"chain_id": 17000
			},
			"beacon": {
				"primary_url": "http://localhost:5052",
				"fallback_url": "http://localhost:5053"
			},
			"multicall_address": "0xcA11bde05977b3631167028862bE2a173976CA11",
			"concurrent_call_limit": 3,
			"safe_gas_multiplier": 2.0
		})
		.to_string(),
	)
	.unwrap();

	let provider = ServiceProvider::from_config_path(&path).await.unwrap();

	assert_eq!(provider.config().execution.chain_id, 17000);
	assert_eq!(provider.execution_client().expected_chain_id(), 17000);
	assert!(provider.execution_client().is_fallback_enabled());
	assert!(provider.beacon_client().is_fallback_enabled());
	assert_eq!(provider.query_manager().concurrent_call_limit(), 3);
	assert_eq!(
		provider.query_manager().multicall_address(),
		provider.config().multicall_address
	);
}

#[tokio::test]
async fn test_from_invalid_config_path() {
	let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("clients.json");
	fs::write(&path, "{ not json").unwrap();

	let err = ServiceProvider::from_config_path(&path).await.err().unwrap();
	assert!(err.to_string().contains("Failed to load client config"));
}

#[tokio::test]
async fn test_check_status_against_live_endpoints() {
	let mut ec = Server::new_async().await;
	let chain_id = create_rpc_result_mock(&mut ec, "eth_chainId", json!("0x1"));
	let syncing = create_rpc_result_mock(&mut ec, "eth_syncing", json!(false));
	let head = create_rpc_result_mock(&mut ec, "eth_getBlockByNumber", block_header_json(100, 5));
	let block_number = create_rpc_result_mock(&mut ec, "eth_blockNumber", json!("0x64"));

	let mut bn = Server::new_async().await;
	let bn_syncing = create_beacon_get_mock(
		&mut bn,
		"/eth/v1/node/syncing",
		200,
		json!({ "data": { "is_syncing": false, "head_slot": "4096", "sync_distance": "0" } }),
	);

	let config = ClientManagerConfigBuilder::new()
		.execution_primary_url(&ec.url())
		// Nothing listens on the discard port
		.execution_fallback_url("http://127.0.0.1:9")
		.beacon_primary_url(&bn.url())
		.client_timeout_ms(2_000)
		.build();
	let provider = ServiceProvider::new(config).unwrap();

	let (ec_status, bn_status) = provider.check_status().await;

	assert!(ec_status.primary_client_status.is_ready());
	assert_eq!(ec_status.primary_client_status.chain_id, 1);
	assert!(ec_status.fallback_enabled);
	assert!(!ec_status.fallback_client_status.is_working);
	assert!(bn_status.primary_client_status.is_ready());
	assert!(!bn_status.fallback_enabled);

	let execution = provider.execution_client();
	assert!(execution.is_primary_ready());
	assert!(!execution.is_fallback_ready());
	assert_eq!(execution.block_number().await.unwrap(), 100);

	chain_id.assert();
	syncing.assert();
	head.assert();
	block_number.assert();
	bn_syncing.assert();
}

#[tokio::test]
async fn test_provider_cancellation_reaches_waits() {
	let provider = ServiceProvider::new(ClientManagerConfigBuilder::new().build()).unwrap();
	let token = provider.cancel_token();

	provider.cancel_all();

	assert!(token.is_cancelled());
	assert!(provider.is_cancelled());
}
