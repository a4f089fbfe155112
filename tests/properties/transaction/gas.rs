use chain_client_manager::{
	services::{
		blockchain::{EvmClient, ExecutionClientManager},
		transaction::{TransactionError, TransactionManager},
	},
	utils::tests::create_test_transport,
};
use proptest::{prelude::*, test_runner::Config};
use std::sync::Arc;

use crate::properties::strategies::valid_multiplier_strategy;

const BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// A manager whose client is never contacted; gas sizing is pure
fn manager(buffer: u64, multiplier: f64) -> TransactionManager {
	let client = EvmClient::new_with_transport(create_test_transport("http://localhost:8545"));
	let clients = ExecutionClientManager::new(Arc::new(client), None, 1);
	TransactionManager::new(Arc::new(clients), buffer, multiplier, BLOCK_GAS_LIMIT).unwrap()
}

fn expected_limit(estimate: u64, buffer: u64, multiplier: f64) -> u64 {
	let inflated = if multiplier == 0.0 {
		estimate
	} else {
		(estimate as f64 * multiplier).ceil() as u64
	};
	inflated.saturating_add(buffer)
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// The safe limit follows ceil(estimate * multiplier) + buffer and errors instead of clamping
	#[test]
	fn test_safe_limit_formula(
		estimate in 0u64..=40_000_000,
		buffer in 0u64..=1_000_000,
		multiplier in valid_multiplier_strategy(),
	) {
		let expected = expected_limit(estimate, buffer, multiplier);

		match manager(buffer, multiplier).get_safe_gas_limit(estimate) {
			Ok(limit) => {
				prop_assert_eq!(limit, expected);
				prop_assert!(limit >= estimate + buffer);
				prop_assert!(limit <= BLOCK_GAS_LIMIT);
			}
			Err(err) => {
				prop_assert!(matches!(err, TransactionError::GasLimitExceeded(_)));
				prop_assert!(estimate > BLOCK_GAS_LIMIT || expected > BLOCK_GAS_LIMIT);
			}
		}
	}

	// A larger estimate never yields a smaller safe limit
	#[test]
	fn test_safe_limit_is_monotonic(
		a in 0u64..=20_000_000,
		b in 0u64..=20_000_000,
		buffer in 0u64..=100_000,
		multiplier in valid_multiplier_strategy(),
	) {
		let manager = manager(buffer, multiplier);
		let (low, high) = if a <= b { (a, b) } else { (b, a) };

		if let (Ok(low_limit), Ok(high_limit)) =
			(manager.get_safe_gas_limit(low), manager.get_safe_gas_limit(high))
		{
			prop_assert!(low_limit <= high_limit);
		}
		if manager.get_safe_gas_limit(low).is_err() {
			prop_assert!(manager.get_safe_gas_limit(high).is_err());
		}
	}

	// Multipliers strictly between 0 and 1 are rejected
	#[test]
	fn test_deflating_multiplier_is_rejected(multiplier in 0.000_001f64..0.999_999) {
		let client = EvmClient::new_with_transport(create_test_transport("http://localhost:8545"));
		let result = TransactionManager::new(Arc::new(client), 0, multiplier, BLOCK_GAS_LIMIT);
		prop_assert!(matches!(result, Err(TransactionError::InvalidMultiplier(_))));
	}
}
