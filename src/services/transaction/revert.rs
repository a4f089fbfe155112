//! Revert message normalization.
//!
//! Some nodes (Nethermind) report reverts as `Reverted 0x<hex>` with the revert string still
//! hex encoded. Those are rewritten as `reverted: <ascii>` so every node produces a readable
//! message.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
	static ref HEX_REVERT_REGEX: Regex =
		Regex::new(r"Reverted 0x(?P<message>[0-9a-fA-F]+).*").expect("valid revert regex");
}

/// Rewrites a hex encoded revert into ASCII; any other message is returned unchanged
pub fn normalize_revert_message(message: &str) -> String {
	let Some(captures) = HEX_REVERT_REGEX.captures(message) else {
		return message.to_string();
	};
	let Some(hex_message) = captures.name("message") else {
		return message.to_string();
	};
	match hex::decode(hex_message.as_str()) {
		Ok(bytes) => format!("reverted: {}", String::from_utf8_lossy(&bytes)),
		Err(_) => message.to_string(),
	}
}
