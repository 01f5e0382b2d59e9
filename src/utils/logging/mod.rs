//! ## Sets up logging by reading configuration from environment variables.
//!
//! Environment variables used:
//! - LOG_MODE: "stdout" (default) or "file"
//! - LOG_LEVEL: log level ("trace", "debug", "info", "warn", "error"); default is "info",
//!   or "debug" when the indexer runs with the debug flag
//! - LOG_DATA_DIR: directory for log files; default is "logs/"
//! - LOG_MAX_SIZE: maximum size of log files in bytes; default is 1GB

pub mod error;

use chrono::Utc;
use std::{
	env,
	fs::{create_dir_all, metadata},
	path::Path,
};
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIR: &str = "logs/";
const DEFAULT_LOG_MAX_SIZE: u64 = 1_073_741_824;

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub mode: String,
	pub level: String,
	pub dir: String,
	pub max_size: u64,
}

impl LoggingConfig {
	/// Reads the logging settings from the environment.
	///
	/// `debug` only changes the default level; an explicit `LOG_LEVEL` wins.
	pub fn from_env(debug: bool) -> Result<Self, String> {
		let default_level = if debug { "debug" } else { "info" };
		let max_size = match env::var("LOG_MAX_SIZE") {
			Ok(s) => s
				.parse::<u64>()
				.map_err(|_| format!("LOG_MAX_SIZE must be a valid u64 if set, got '{}'", s))?,
			Err(_) => DEFAULT_LOG_MAX_SIZE,
		};

		Ok(Self {
			mode: env::var("LOG_MODE")
				.unwrap_or_else(|_| "stdout".to_string())
				.to_lowercase(),
			level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string()),
			dir: env::var("LOG_DATA_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string()),
			max_size,
		})
	}

	fn level_filter(&self) -> tracing::Level {
		match self.level.to_lowercase().as_str() {
			"trace" => tracing::Level::TRACE,
			"debug" => tracing::Level::DEBUG,
			"warn" => tracing::Level::WARN,
			"error" => tracing::Level::ERROR,
			_ => tracing::Level::INFO,
		}
	}
}

/// Computes the path of the rolled log file given the base file path and the date string.
pub fn compute_rolled_file_path(base_file_path: &str, date_str: &str, index: u32) -> String {
	let trimmed = base_file_path
		.strip_suffix(".log")
		.unwrap_or(base_file_path);
	format!("{}-{}.{}.log", trimmed, date_str, index)
}

/// Returns the first rolled file path whose file is absent or not larger than `max_size`.
pub fn space_based_rolling(
	file_path: &str,
	base_file_path: &str,
	date_str: &str,
	max_size: u64,
) -> String {
	let mut final_path = file_path.to_string();
	let mut index = 1;
	while let Ok(file_metadata) = metadata(&final_path) {
		if file_metadata.len() <= max_size {
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

/// Installs the global tracing subscriber.
pub fn setup_logging(debug: bool) -> Result<(), Box<dyn std::error::Error>> {
	let config = LoggingConfig::from_env(debug)?;
	let subscriber =
		tracing_subscriber::registry().with(EnvFilter::new(config.level_filter().to_string()));

	if config.mode == "file" {
		let log_dir = format!("{}/", config.dir.trim_end_matches('/'));
		let date_str = Utc::now().format("%Y-%m-%d").to_string();
		let base_file_path = format!("{}indexer.log", log_dir);

		create_dir_all(&log_dir)?;

		let time_based_path = compute_rolled_file_path(&base_file_path, &date_str, 1);
		let final_path =
			space_based_rolling(&time_based_path, &base_file_path, &date_str, config.max_size);

		let file_appender = tracing_appender::rolling::never(
			Path::new(&final_path).parent().unwrap_or(Path::new(".")),
			Path::new(&final_path).file_name().unwrap_or_default(),
		);

		subscriber
			.with(
				fmt::layer()
					.event_format(create_log_format(false))
					.with_writer(file_appender)
					.fmt_fields(fmt::format::PrettyFields::new()),
			)
			.try_init()?;
	} else {
		subscriber
			.with(
				fmt::layer()
					.event_format(create_log_format(true))
					.fmt_fields(fmt::format::PrettyFields::new()),
			)
			.try_init()?;
	}

	info!(
		"Logging is successfully configured (mode: {}, level: {})",
		config.mode, config.level
	);
	Ok(())
}
