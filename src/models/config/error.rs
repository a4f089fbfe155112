//! Failures while loading the client manager configuration.
//!
//! A validation failure always names the rejected field by its JSON path (`field` metadata,
//! e.g. `execution.fallback_url`). When the rejected value was supplied by one of the endpoint
//! override variables instead of the file, the variable is named as well (`env` metadata): the
//! file on disk looks correct in that case and the log line is the only pointer to the cause.
//!
//! These errors are not logged on creation; whoever gives up on the configuration logs them.

use crate::utils::logging::error::{keys, BoxedSource, ErrorContext, TraceableError};
use std::path::Path;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
	/// A value parsed but is not acceptable
	#[error("Validation error: {0}")]
	ValidationError(ErrorContext),

	/// The file is not valid JSON or does not match the configuration schema
	#[error("Parse error: {0}")]
	ParseError(ErrorContext),

	/// The file is missing, unreadable or not a JSON file
	#[error("File error: {0}")]
	FileError(ErrorContext),
}

impl ConfigError {
	pub fn invalid_field(
		field: &str,
		msg: impl Into<String>,
		source: Option<BoxedSource>,
	) -> Self {
		Self::ValidationError(ErrorContext::new(msg, source, None).with_metadata(keys::FIELD, field))
	}

	pub fn file_error(path: &Path, msg: impl Into<String>, source: Option<BoxedSource>) -> Self {
		Self::FileError(
			ErrorContext::new(msg, source, None).with_metadata("path", path.display().to_string()),
		)
	}

	pub fn parse_error(path: &Path, err: serde_json::Error) -> Self {
		let msg = format!(
			"failed to parse client config at line {}, column {}",
			err.line(),
			err.column()
		);
		Self::ParseError(
			ErrorContext::new(msg, Some(Box::new(err)), None)
				.with_metadata("path", path.display().to_string()),
		)
	}

	/// Records that the rejected value came from the environment variable `var`
	pub fn with_env_var(self, var: &str) -> Self {
		let tag = |ctx: ErrorContext| ctx.with_metadata(keys::ENV, var);
		match self {
			Self::ValidationError(ctx) => Self::ValidationError(tag(ctx)),
			Self::ParseError(ctx) => Self::ParseError(tag(ctx)),
			Self::FileError(ctx) => Self::FileError(tag(ctx)),
		}
	}

	/// JSON path of the rejected field, for validation failures
	pub fn field(&self) -> Option<&str> {
		self.context().metadata_value(keys::FIELD)
	}

	/// Override variable that supplied the rejected value, if any
	pub fn env_var(&self) -> Option<&str> {
		self.context().metadata_value(keys::ENV)
	}

	fn context(&self) -> &ErrorContext {
		match self {
			Self::ValidationError(ctx) | Self::ParseError(ctx) | Self::FileError(ctx) => ctx,
		}
	}
}

impl TraceableError for ConfigError {
	fn trace_id(&self) -> String {
		self.context().trace_id.clone()
	}
}
