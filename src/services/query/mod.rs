//! Multicall query service.
//!
//! - `multicall`: the [`MultiCaller`] builder and the [`Queryable`] capability
//! - `contract`: named contracts with a dynamic ABI
//! - `manager`: [`QueryManager`], single and batched queries

mod contract;
mod error;
mod manager;
mod multicall;

pub use contract::Contract;
pub use error::QueryError;
pub use manager::{batch_windows, QueryManager};
pub use multicall::{
	add_queryables, decode_aggregate3_calls, discard_output, encode_aggregate3_results, stage,
	Commit, Decoder, MultiCaller, Queryable, StagedResults,
};
