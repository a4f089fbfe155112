//! Bindings for well-known contracts, built on [`Contract`] and the query and transaction
//! managers.
//!
//! - `erc20`: [`Erc20Contract`], token details, balances and transfers
//!
//! [`Contract`]: crate::services::query::Contract

mod erc20;

pub use erc20::{Erc20Contract, ERC20_ABI};
