//! Mock JSON-RPC and Beacon REST responses served by `mockito`.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};

/// Answers every JSON-RPC request for `method` with `result`
pub fn create_rpc_result_mock(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": method })))
		.with_header("content-type", "application/json")
		.with_status(200)
		.with_body(json!({ "jsonrpc": "2.0", "id": 0, "result": result }).to_string())
		.create()
}

/// Answers every JSON-RPC request for `method` with an `error` object
pub fn create_rpc_error_mock(
	server: &mut ServerGuard,
	method: &str,
	code: i64,
	message: &str,
	data: Option<Value>,
) -> Mock {
	let mut error = json!({ "code": code, "message": message });
	if let Some(data) = data {
		error["data"] = data;
	}
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": method })))
		.with_header("content-type", "application/json")
		.with_status(200)
		.with_body(json!({ "jsonrpc": "2.0", "id": 0, "error": error }).to_string())
		.create()
}

/// Answers GET requests on paths starting with `path` with `status` and a JSON `body`
pub fn create_beacon_get_mock(
	server: &mut ServerGuard,
	path: &str,
	status: usize,
	body: Value,
) -> Mock {
	server
		.mock("GET", Matcher::Regex(format!("^{}", regex_escape(path))))
		.with_header("content-type", "application/json")
		.with_status(status)
		.with_body(body.to_string())
		.create()
}

/// Answers POST requests on `path` with `status` and a JSON `body`
pub fn create_beacon_post_mock(
	server: &mut ServerGuard,
	path: &str,
	status: usize,
	body: Value,
) -> Mock {
	server
		.mock("POST", path)
		.with_header("content-type", "application/json")
		.with_status(status)
		.with_body(body.to_string())
		.create()
}

/// A header of a block mined `age_secs` ago
pub fn block_header_json(number: u64, age_secs: u64) -> Value {
	let timestamp = chrono::Utc::now().timestamp() as u64 - age_secs;
	json!({
		"hash": format!("0x{:064x}", number),
		"parentHash": format!("0x{:064x}", number.saturating_sub(1)),
		"number": format!("0x{:x}", number),
		"timestamp": format!("0x{:x}", timestamp),
		"gasLimit": "0x1c9c380",
		"gasUsed": "0x5208",
		"baseFeePerGas": "0x3b9aca00",
		"miner": "0x0000000000000000000000000000000000000000",
		"stateRoot": format!("0x{:064x}", 0),
	})
}

/// A validator entry of the Beacon validators route
pub fn validator_json(index: &str, pubkey_byte: u8, status: &str) -> Value {
	json!({
		"index": index,
		"balance": "32000000000",
		"status": status,
		"validator": {
			"pubkey": format!("0x{}", hex::encode([pubkey_byte; 48])),
			"withdrawal_credentials": format!("0x01{}", "00".repeat(31)),
			"effective_balance": "32000000000",
			"slashed": false,
			"activation_eligibility_epoch": "0",
			"activation_epoch": "0",
			"exit_epoch": "18446744073709551615",
			"withdrawable_epoch": "18446744073709551615"
		}
	})
}

fn regex_escape(path: &str) -> String {
	regex::escape(path)
}
