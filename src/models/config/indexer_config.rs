//! Indexer configuration.
//!
//! File keys keep the names operators already use (`database`, `rpc`,
//! `blockFile`, `fromBlock`, `toBlock`, `batch`, `debug`) so existing
//! configuration files keep working.

use serde::{Deserialize, Serialize};
use std::{
	collections::HashMap,
	path::{Path, PathBuf},
	time::Duration,
};
use url::Url;

use crate::{
	models::{config::error::ConfigError, RetrievalPolicy},
	utils::RetryConfig,
};

/// Configuration file read when no explicit path is given, if it exists
pub const DEFAULT_CONFIG_PATH: &str = "config/local.json";

/// Number of blocks fetched per iteration unless configured otherwise
pub const DEFAULT_BATCH_SIZE: u64 = 99;

/// Upper bound for the batch size, most nodes reject larger batches
pub const MAX_BATCH_SIZE: u64 = 1000;

/// Cursor file used unless configured otherwise
pub const DEFAULT_CURSOR_FILE: &str = "data/next_block.txt";

const SUPPORTED_DATABASE_SCHEMES: [&str; 3] = ["postgres://", "postgresql://", "sqlite:"];

fn default_idle_initial_ms() -> u64 {
	1_000
}

fn default_idle_max_ms() -> u64 {
	30_000
}

/// Bounds of the pause taken when a whole batch found no block (chain head reached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdleBackoffConfig {
	/// First pause, in milliseconds
	#[serde(default = "default_idle_initial_ms")]
	pub initial_ms: u64,
	/// Largest pause, in milliseconds
	#[serde(default = "default_idle_max_ms")]
	pub max_ms: u64,
}

impl IdleBackoffConfig {
	pub fn initial(&self) -> Duration {
		Duration::from_millis(self.initial_ms)
	}

	pub fn max(&self) -> Duration {
		Duration::from_millis(self.max_ms)
	}
}

impl Default for IdleBackoffConfig {
	fn default() -> Self {
		Self {
			initial_ms: default_idle_initial_ms(),
			max_ms: default_idle_max_ms(),
		}
	}
}

/// Partial configuration, as found in a configuration file or given on the
/// command line. Unset fields fall through to the next source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverrides {
	/// Ledger connection string
	pub database: Option<String>,
	/// JSON-RPC endpoint
	pub rpc: Option<String>,
	/// Cursor file path
	pub block_file: Option<PathBuf>,
	/// First block to process when no cursor is persisted
	pub from_block: Option<u64>,
	/// Block at which the loop stops, 0 means unbounded
	pub to_block: Option<u64>,
	/// Blocks per iteration
	pub batch: Option<u64>,
	pub debug: Option<bool>,
	pub policy: Option<RetrievalPolicy>,
	pub include_transactions: Option<bool>,
	/// Start from `fromBlock` even when a cursor is persisted
	pub rewind: Option<bool>,
	pub create_schema: Option<bool>,
	pub retry: Option<RetryConfig>,
	pub idle_backoff: Option<IdleBackoffConfig>,
}

impl ConfigOverrides {
	/// Reads overrides from a JSON file.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path).map_err(|e| {
			ConfigError::file_error(
				format!("failed to open config file: {}", e),
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.display().to_string(),
				)])),
			)
		})?;

		serde_json::from_reader(file).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse config file: {}", e),
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.display().to_string(),
				)])),
			)
		})
	}

	/// Keeps every field set in `self` and fills the rest from `fallback`.
	pub fn or(self, fallback: Self) -> Self {
		Self {
			database: self.database.or(fallback.database),
			rpc: self.rpc.or(fallback.rpc),
			block_file: self.block_file.or(fallback.block_file),
			from_block: self.from_block.or(fallback.from_block),
			to_block: self.to_block.or(fallback.to_block),
			batch: self.batch.or(fallback.batch),
			debug: self.debug.or(fallback.debug),
			policy: self.policy.or(fallback.policy),
			include_transactions: self.include_transactions.or(fallback.include_transactions),
			rewind: self.rewind.or(fallback.rewind),
			create_schema: self.create_schema.or(fallback.create_schema),
			retry: self.retry.or(fallback.retry),
			idle_backoff: self.idle_backoff.or(fallback.idle_backoff),
		}
	}
}

/// Complete, validated configuration of one indexer run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexerConfig {
	pub database_url: String,
	pub rpc_url: String,
	pub cursor_file: PathBuf,
	pub start_block: u64,
	/// Exclusive stop block; `None` follows the chain forever
	pub end_block: Option<u64>,
	pub batch_size: u64,
	pub debug: bool,
	pub policy: RetrievalPolicy,
	pub include_transactions: bool,
	pub rewind: bool,
	pub create_schema: bool,
	pub retry: RetryConfig,
	pub idle_backoff: IdleBackoffConfig,
}

impl IndexerConfig {
	/// Loads the configuration.
	///
	/// `overrides` (usually the command line) win over the configuration file,
	/// which wins over defaults. An explicit `path` must exist; without one,
	/// [`DEFAULT_CONFIG_PATH`] is read only if present.
	pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
		let from_file = match path {
			Some(path) => ConfigOverrides::from_file(path)?,
			None => {
				let default_path = Path::new(DEFAULT_CONFIG_PATH);
				if default_path.exists() {
					ConfigOverrides::from_file(default_path)?
				} else {
					ConfigOverrides::default()
				}
			}
		};

		let config = Self::from_overrides(overrides.or(from_file));
		config.validate()?;
		Ok(config)
	}

	/// Applies defaults to the unset fields. Does not validate.
	pub fn from_overrides(overrides: ConfigOverrides) -> Self {
		let database_url = overrides.database.unwrap_or_default();
		let rpc_url = overrides.rpc.unwrap_or_default();

		Self {
			database_url: database_url.trim().to_string(),
			rpc_url: rpc_url.trim().to_string(),
			cursor_file: overrides
				.block_file
				.unwrap_or_else(|| PathBuf::from(DEFAULT_CURSOR_FILE)),
			start_block: overrides.from_block.unwrap_or(0),
			end_block: overrides.to_block.filter(|end| *end > 0),
			batch_size: overrides.batch.unwrap_or(DEFAULT_BATCH_SIZE),
			debug: overrides.debug.unwrap_or(false),
			policy: overrides.policy.unwrap_or_default(),
			include_transactions: overrides.include_transactions.unwrap_or(false),
			rewind: overrides.rewind.unwrap_or(false),
			create_schema: overrides.create_schema.unwrap_or(true),
			retry: overrides.retry.unwrap_or_default(),
			idle_backoff: overrides.idle_backoff.unwrap_or_default(),
		}
	}

	/// Validate the configuration
	///
	/// Ensures that:
	/// - The database URL is set and uses a supported scheme
	/// - The RPC URL is set and is an HTTP(S) URL
	/// - The batch size is within bounds
	/// - The idle backoff bounds are ordered
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.database_url.is_empty() {
			return Err(ConfigError::validation_error(
				"Database connection string is required",
				None,
				None,
			));
		}

		if !SUPPORTED_DATABASE_SCHEMES
			.iter()
			.any(|scheme| self.database_url.starts_with(scheme))
		{
			return Err(ConfigError::validation_error(
				format!(
					"Unsupported database connection string, expected one of: {}",
					SUPPORTED_DATABASE_SCHEMES.join(", ")
				),
				None,
				None,
			));
		}

		if self.rpc_url.is_empty() {
			return Err(ConfigError::validation_error(
				"RPC URL is required",
				None,
				None,
			));
		}

		let rpc_url = Url::parse(&self.rpc_url).map_err(|e| {
			ConfigError::validation_error(
				format!("Invalid RPC URL: {}", e),
				Some(Box::new(e)),
				Some(HashMap::from([("url".to_string(), self.rpc_url.clone())])),
			)
		})?;
		if !matches!(rpc_url.scheme(), "http" | "https") {
			return Err(ConfigError::validation_error(
				"RPC URL must use http or https",
				None,
				Some(HashMap::from([("url".to_string(), self.rpc_url.clone())])),
			));
		}

		if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
			return Err(ConfigError::validation_error(
				format!("Batch size must be between 1 and {}", MAX_BATCH_SIZE),
				None,
				Some(HashMap::from([(
					"batch".to_string(),
					self.batch_size.to_string(),
				)])),
			));
		}

		if self.idle_backoff.initial_ms == 0 || self.idle_backoff.max_ms < self.idle_backoff.initial_ms
		{
			return Err(ConfigError::validation_error(
				"Idle backoff must be positive and its maximum not below its initial value",
				None,
				None,
			));
		}

		if let Some(end) = self.end_block {
			if end <= self.start_block {
				tracing::warn!(
					"End block {} is not after start block {}, nothing will be indexed",
					end,
					self.start_block
				);
			}
		}

		Ok(())
	}
}
