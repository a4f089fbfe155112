//! Logging setup.
//!
//! The subscriber is configured from environment variables:
//! - `LOG_MODE`: `stdout` (default) or `file`
//! - `LOG_LEVEL`: `trace`, `debug`, `info` (default), `warn` or `error`
//! - `LOG_DATA_DIR`: directory of the log files in file mode; default `logs/`
//! - `LOG_MAX_SIZE`: size in bytes above which a new log file is started; default 1 GiB
//!
//! In file mode a new file is started every day (`<name>-<date>.<n>.log`) and whenever the
//! current one outgrows `LOG_MAX_SIZE`.

pub mod error;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::{
	env,
	fs::{create_dir_all, metadata},
	path::Path,
};
use tracing::{info, Subscriber};
use tracing_subscriber::{
	filter::EnvFilter,
	fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
	prelude::*,
	registry::LookupSpan,
};

/// Base name of the log file in file mode
pub const LOG_FILE_NAME: &str = "chain-client-manager.log";

/// Default `LOG_MAX_SIZE`
pub const DEFAULT_LOG_MAX_SIZE: u64 = 1_073_741_824;

lazy_static! {
	static ref ANSI_ESCAPE_REGEX: Regex =
		Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI escape regex");
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
	Stdout,
	File,
}

/// Logging settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub mode: LogMode,
	pub level: tracing::Level,
	pub data_dir: String,
	pub max_size: u64,
}

impl LoggingConfig {
	/// Reads the settings, falling back to defaults for unset variables
	///
	/// Unknown levels fall back to `info`; an unparsable `LOG_MAX_SIZE` is an error.
	pub fn from_env() -> Result<Self, String> {
		let mode = match env::var("LOG_MODE")
			.unwrap_or_default()
			.to_lowercase()
			.as_str()
		{
			"file" => LogMode::File,
			_ => LogMode::Stdout,
		};
		let level = parse_level(&env::var("LOG_LEVEL").unwrap_or_default());
		let data_dir = env::var("LOG_DATA_DIR").unwrap_or_else(|_| "logs/".to_string());
		let max_size = match env::var("LOG_MAX_SIZE") {
			Ok(value) => value
				.parse::<u64>()
				.map_err(|e| format!("LOG_MAX_SIZE must be a valid u64 if set: {}", e))?,
			Err(_) => DEFAULT_LOG_MAX_SIZE,
		};
		Ok(Self {
			mode,
			level,
			data_dir,
			max_size,
		})
	}

	/// Path of the base log file inside the data directory
	pub fn base_file_path(&self) -> String {
		format!("{}/{}", self.data_dir.trim_end_matches('/'), LOG_FILE_NAME)
	}
}

fn parse_level(level: &str) -> tracing::Level {
	match level.to_lowercase().as_str() {
		"trace" => tracing::Level::TRACE,
		"debug" => tracing::Level::DEBUG,
		"warn" => tracing::Level::WARN,
		"error" => tracing::Level::ERROR,
		_ => tracing::Level::INFO,
	}
}

/// Formatter wrapper that strips ANSI escape codes, for log files
struct StripAnsiFormatter<T> {
	inner: T,
}

impl<S, N, T> FormatEvent<S, N> for StripAnsiFormatter<T>
where
	S: Subscriber + for<'a> LookupSpan<'a>,
	N: for<'a> FormatFields<'a> + 'static,
	T: FormatEvent<S, N>,
{
	fn format_event(
		&self,
		ctx: &FmtContext<'_, S, N>,
		mut writer: Writer<'_>,
		event: &tracing::Event<'_>,
	) -> std::fmt::Result {
		let mut buf = String::new();
		self.inner.format_event(ctx, Writer::new(&mut buf), event)?;
		write!(writer, "{}", strip_ansi_escapes(&buf))
	}
}

fn strip_ansi_escapes(s: &str) -> String {
	ANSI_ESCAPE_REGEX.replace_all(s, "").to_string()
}

/// Computes the path of the rolled log file for `date_str` and sequence number `index`
pub fn compute_rolled_file_path(base_file_path: &str, date_str: &str, index: u32) -> String {
	let trimmed = base_file_path
		.strip_suffix(".log")
		.unwrap_or(base_file_path);
	format!("{}-{}.{}.log", trimmed, date_str, index)
}

/// Moves on to the next sequence number while the log file at hand is larger than `max_size`
///
/// Returns the path of the first file that is missing or still small enough.
pub fn space_based_rolling(
	file_path: &str,
	base_file_path: &str,
	date_str: &str,
	max_size: u64,
) -> String {
	let mut final_path = file_path.to_string();
	let mut index = 1;
	while let Ok(metadata) = metadata(&final_path) {
		if metadata.len() <= max_size {
			break;
		}
		index += 1;
		final_path = compute_rolled_file_path(base_file_path, date_str, index);
	}
	final_path
}

fn create_log_format(with_ansi: bool) -> fmt::format::Format<fmt::format::Compact> {
	fmt::format()
		.with_level(true)
		.with_target(true)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_ansi(with_ansi)
		.compact()
}

/// Installs the global subscriber described by the environment
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error>> {
	let config = LoggingConfig::from_env()?;
	let subscriber =
		tracing_subscriber::registry().with(EnvFilter::new(config.level.to_string()));

	match config.mode {
		LogMode::File => {
			let base_file_path = config.base_file_path();
			let date_str = Utc::now().format("%Y-%m-%d").to_string();
			let time_based_path = compute_rolled_file_path(&base_file_path, &date_str, 1);
			if let Some(parent) = Path::new(&time_based_path).parent() {
				create_dir_all(parent)?;
			}
			let final_path = space_based_rolling(
				&time_based_path,
				&base_file_path,
				&date_str,
				config.max_size,
			);

			let final_path = Path::new(&final_path);
			let file_appender = tracing_appender::rolling::never(
				final_path.parent().unwrap_or(Path::new(".")),
				final_path.file_name().unwrap_or_default(),
			);
			subscriber
				.with(
					fmt::layer()
						.event_format(StripAnsiFormatter {
							inner: create_log_format(false),
						})
						.with_writer(file_appender)
						.fmt_fields(fmt::format::PrettyFields::new()),
				)
				.try_init()?;
		}
		LogMode::Stdout => {
			subscriber
				.with(
					fmt::layer()
						.event_format(create_log_format(true))
						.fmt_fields(fmt::format::PrettyFields::new()),
				)
				.try_init()?;
		}
	}

	info!(mode = ?config.mode, level = %config.level, "Logging configured");
	Ok(())
}
