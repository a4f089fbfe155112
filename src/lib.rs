//! Failover-aware Ethereum Execution and Beacon node clients.
//!
//! This library lets a node management daemon talk to an Execution layer JSON-RPC endpoint and
//! a Beacon REST endpoint, each with a primary and an optional fallback instance. It includes:
//!
//! - Transparent failover from a disconnected primary endpoint to its fallback
//! - Batched multicall reads with a concurrency ceiling
//! - Transaction simulation, safe gas limits, bundled submission and inclusion waits
//! - Configuration management through JSON files
//!
//! # Module Structure
//!
//! - `bootstrap`: Builds the service graph from a configuration
//! - `models`: Data structures for configuration and chain data
//! - `services`: Clients, failover core, query and transaction managers
//! - `utils`: Common utilities and helper functions

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
