//! Beacon node (REST) client, its route provider and its primary/fallback manager.

mod client;
mod decoder_pool;
mod manager;
mod provider;

pub use client::{compute_domain, BeaconClient, StandardBeaconClient, DOMAIN_TYPE_LENGTH};
pub use decoder_pool::{
	CommitteesDecoder, CommitteesDecoderPool, PooledDecoder, DEFAULT_MAX_IDLE_DECODERS,
};
pub use manager::BeaconClientManager;
pub use provider::{BeaconApiProvider, BeaconHttpProvider, MAX_REQUEST_VALIDATORS_COUNT};
