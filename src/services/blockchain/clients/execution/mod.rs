//! Execution layer (JSON-RPC) client and its primary/fallback manager.

mod client;
mod manager;
mod subscription;

pub use client::{EvmClient, ExecutionClient};
pub use manager::{ExecutionClientManager, SYNC_THRESHOLD};
pub use subscription::LogSubscription;
