//! Conversions between wei, gwei and ETH amounts.
//!
//! Wei amounts are exact `U256` values. ETH and gwei amounts are floating point, for display
//! and for human supplied inputs.

use alloy::primitives::{
	utils::{format_units, parse_units, UnitsError},
	U256,
};
use thiserror::Error as ThisError;

/// Amount of gwei in 1 ETH
pub const GWEI_PER_ETH: f64 = 1e9;

/// Errors converting a floating point amount into wei
#[derive(ThisError, Debug)]
pub enum ConversionError {
	#[error("{0} is not a valid amount")]
	InvalidAmount(f64),

	#[error(transparent)]
	Units(#[from] UnitsError),
}

fn wei_to_float(wei: U256, decimals: u8) -> f64 {
	format_units(wei, decimals)
		.ok()
		.and_then(|amount| amount.parse().ok())
		.unwrap_or(f64::INFINITY)
}

fn float_to_wei(amount: f64, decimals: u8) -> Result<U256, ConversionError> {
	if !amount.is_finite() || amount < 0.0 {
		return Err(ConversionError::InvalidAmount(amount));
	}
	let formatted = format!("{:.*}", decimals as usize, amount);
	Ok(parse_units(&formatted, decimals)?.get_absolute())
}

/// Converts a wei amount into ETH
pub fn wei_to_eth(wei: U256) -> f64 {
	wei_to_float(wei, 18)
}

/// Converts an ETH amount into wei, rounding to the nearest wei
pub fn eth_to_wei(eth: f64) -> Result<U256, ConversionError> {
	float_to_wei(eth, 18)
}

/// Converts a wei amount into gwei
pub fn wei_to_gwei(wei: U256) -> f64 {
	wei_to_float(wei, 9)
}

/// Converts a gwei amount into wei, rounding to the nearest wei
pub fn gwei_to_wei(gwei: f64) -> Result<U256, ConversionError> {
	float_to_wei(gwei, 9)
}

pub fn eth_to_gwei(eth: f64) -> f64 {
	eth * GWEI_PER_ETH
}

pub fn gwei_to_eth(gwei: f64) -> f64 {
	gwei / GWEI_PER_ETH
}
