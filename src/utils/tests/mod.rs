//! Test helper utilities
//!
//! - `builders`: builders for configurations and execution layer objects
//! - `http`: HTTP clients and transports pointed at mock servers

pub mod builders {
	pub mod config;
	pub mod execution;
}


pub use builders::*;
pub use http::*;
