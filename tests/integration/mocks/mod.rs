//! Mock implementations for testing purposes.
//!
//! This module contains mock implementations of the traits the managers are built on:
//! - Execution and Beacon clients
//! - Transaction signers
//! - JSON-RPC and Beacon REST responses served by `mockito`
//!
//! The trait mocks are implemented using the `mockall` crate.

mod clients;
mod servers;

#[allow(unused_imports)]
pub use clients::*;
#[allow(unused_imports)]
pub use servers::*;

use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Serializes tests that read or write the endpoint override variables
pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
