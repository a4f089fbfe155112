//! Utility modules for common functionality.
//!
//! - `conversion`: wei, gwei and ETH amount conversions
//! - `http`: retryable HTTP client construction and `RetryConfig`
//! - `logging`: subscriber setup and the traceable error context
//! - `time`: cancellable sleeping
//! - `tests`: test helpers (builders, mock server transports)

pub mod conversion;
pub mod http;
pub mod logging;
pub mod tests;
pub mod time;

pub use http::*;
