use chain_client_manager::{
	services::blockchain::{
		BlockchainTransport, HttpTransportClient, RestTransport, TransportError,
	},
	utils::{tests::create_test_transport, RetryConfig},
};
use mockito::Server;
use serde_json::{json, Value};
use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};
use tokio::net::TcpListener;

use crate::integration::mocks::{create_beacon_get_mock, create_rpc_error_mock, create_rpc_result_mock};

#[tokio::test]
async fn test_send_raw_request_returns_full_response() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_result_mock(&mut server, "eth_chainId", json!("0x1"));

	let transport = create_test_transport(&server.url());
	let response = transport
		.send_raw_request("eth_chainId", Some(Value::Array(vec![])))
		.await
		.unwrap();

	assert_eq!(response["result"], json!("0x1"));
	assert_eq!(transport.get_current_url().await, server.url());
	mock.assert();
}

#[tokio::test]
async fn test_rpc_error_is_not_a_disconnection() {
	let mut server = Server::new_async().await;
	let mock = create_rpc_error_mock(
		&mut server,
		"eth_call",
		3,
		"execution reverted",
		Some(json!("0x08c379a0")),
	);

	let transport = create_test_transport(&server.url());
	let err = transport
		.send_raw_request("eth_call", Some(Value::Array(vec![])))
		.await
		.unwrap_err();

	match &err {
		TransportError::Rpc {
			code,
			message,
			data,
			..
		} => {
			assert_eq!(*code, 3);
			assert_eq!(message, "execution reverted");
			assert_eq!(data, &Some(json!("0x08c379a0")));
		}
		other => panic!("expected an RPC error, got {:?}", other),
	}
	assert!(!err.is_disconnection());
	mock.assert();
}

#[tokio::test]
async fn test_server_error_is_not_a_disconnection() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_status(503)
		.with_body("unavailable")
		.create();

	let transport = create_test_transport(&server.url());
	let err = transport
		.send_raw_request("eth_blockNumber", Some(Value::Array(vec![])))
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::Http { .. }));
	assert!(!err.is_disconnection());
	mock.assert();
}

#[tokio::test]
async fn test_refused_connection_is_a_disconnection() {
	// Nothing listens on the discard port
	let transport = create_test_transport("http://127.0.0.1:9");
	let err = transport
		.send_raw_request("eth_blockNumber", Some(Value::Array(vec![])))
		.await
		.unwrap_err();

	assert!(err.is_disconnection(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_retries_transient_failures() {
	let mut server = Server::new_async().await;
	let retry = RetryConfig {
		max_retries: 2,
		initial_backoff: Duration::from_millis(1),
		max_backoff: Duration::from_millis(5),
		..Default::default()
	};
	let mock = server
		.mock("POST", "/")
		.with_status(502)
		.expect(3)
		.create();

	let transport = HttpTransportClient::new(&server.url(), Duration::from_secs(5), &retry).unwrap();
	let result = transport
		.send_raw_request("eth_blockNumber", Some(Value::Array(vec![])))
		.await;

	assert!(result.is_err());
	mock.assert();
}

#[tokio::test]
async fn test_timed_out_endpoint_is_attempted_once() {
	// Accepts connections and never answers, so every attempt ends in a read timeout
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let url = format!("http://{}", listener.local_addr().unwrap());
	let accepted = Arc::new(AtomicUsize::new(0));
	let counter = accepted.clone();
	let silent = tokio::spawn(async move {
		let mut held = Vec::new();
		while let Ok((stream, _)) = listener.accept().await {
			counter.fetch_add(1, Ordering::SeqCst);
			held.push(stream);
		}
	});

	let retry = RetryConfig {
		max_retries: 3,
		initial_backoff: Duration::from_millis(1),
		max_backoff: Duration::from_millis(5),
		..Default::default()
	};
	let transport = HttpTransportClient::new(&url, Duration::from_millis(200), &retry).unwrap();
	let err = transport
		.send_raw_request("eth_blockNumber", Some(Value::Array(vec![])))
		.await
		.unwrap_err();

	assert!(err.is_disconnection(), "unexpected error: {:?}", err);
	assert_eq!(accepted.load(Ordering::SeqCst), 1);
	silent.abort();
}

#[tokio::test]
async fn test_rest_get_returns_status_and_body() {
	let mut server = Server::new_async().await;
	let found = create_beacon_get_mock(
		&mut server,
		"/eth/v1/node/syncing",
		200,
		json!({ "data": { "is_syncing": false } }),
	);
	let missing = create_beacon_get_mock(
		&mut server,
		"/eth/v1/beacon/headers/123",
		404,
		json!({ "code": 404, "message": "not found" }),
	);

	let transport = create_test_transport(&server.url());

	let response = transport.get("/eth/v1/node/syncing").await.unwrap();
	assert!(response.is_success());
	let body: Value = serde_json::from_slice(&response.body).unwrap();
	assert_eq!(body["data"]["is_syncing"], json!(false));

	let response = transport.get("eth/v1/beacon/headers/123").await.unwrap();
	assert!(response.is_not_found());

	found.assert();
	missing.assert();
}

#[tokio::test]
async fn test_rest_get_into_appends_to_buffer() {
	let mut server = Server::new_async().await;
	let mock = create_beacon_get_mock(
		&mut server,
		"/eth/v1/beacon/states/head/committees",
		200,
		json!({ "data": [] }),
	);

	let transport = create_test_transport(&server.url());
	let mut buffer = Vec::new();
	let status = transport
		.get_into("/eth/v1/beacon/states/head/committees", &mut buffer)
		.await
		.unwrap();

	assert_eq!(status, 200);
	assert_eq!(buffer, br#"{"data":[]}"#.to_vec());
	mock.assert();
}

#[tokio::test]
async fn test_rest_post_sends_json_body() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/eth/v1/validator/duties/sync/10")
		.match_body(mockito::Matcher::Json(json!(["1", "2"])))
		.with_status(200)
		.with_body(r#"{"data":[]}"#)
		.create();

	let transport = create_test_transport(&server.url());
	let response = transport
		.post("/eth/v1/validator/duties/sync/10", json!(["1", "2"]))
		.await
		.unwrap();

	assert!(response.is_success());
	mock.assert();
}
