//! Core services.
//!
//! - `blockchain`: Execution and Beacon clients, their managers and the failover core
//! - `contracts`: Bindings for well-known contracts such as ERC-20 tokens
//! - `query`: Multicall queries, single and batched
//! - `transaction`: Gas sizing, signing, submission and inclusion waits

pub mod blockchain;
pub mod contracts;
pub mod query;
pub mod transaction;
