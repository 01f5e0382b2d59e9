//! Test helper utilities for indexer configuration
//!
//! - `IndexerConfigBuilder`: Builder for creating test IndexerConfig instances

use std::{path::PathBuf, time::Duration};

use crate::{
	models::{
		IdleBackoffConfig, IndexerConfig, RetrievalPolicy, DEFAULT_BATCH_SIZE, DEFAULT_CURSOR_FILE,
	},
	utils::{JitterSetting, RetryConfig},
};

/// Builder for creating test IndexerConfig instances
///
/// Defaults to an in-memory SQLite ledger and short retry and idle delays so
/// follow loops run quickly under test.
pub struct IndexerConfigBuilder {
	database_url: String,
	rpc_url: String,
	cursor_file: PathBuf,
	start_block: u64,
	end_block: Option<u64>,
	batch_size: u64,
	policy: RetrievalPolicy,
	include_transactions: bool,
	rewind: bool,
	create_schema: bool,
	retry: RetryConfig,
	idle_backoff: IdleBackoffConfig,
}

impl Default for IndexerConfigBuilder {
	fn default() -> Self {
		Self {
			database_url: "sqlite::memory:".to_string(),
			rpc_url: "http://localhost:8545".to_string(),
			cursor_file: PathBuf::from(DEFAULT_CURSOR_FILE),
			start_block: 0,
			end_block: None,
			batch_size: DEFAULT_BATCH_SIZE,
			policy: RetrievalPolicy::Batch,
			include_transactions: false,
			rewind: false,
			create_schema: true,
			retry: RetryConfig {
				max_retries: 2,
				base_for_backoff: 2,
				initial_backoff: Duration::from_millis(1),
				max_backoff: Duration::from_millis(5),
				jitter: JitterSetting::None,
			},
			idle_backoff: IdleBackoffConfig {
				initial_ms: 1,
				max_ms: 2,
			},
		}
	}
}

impl IndexerConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn database_url(mut self, url: &str) -> Self {
		self.database_url = url.to_string();
		self
	}

	pub fn rpc_url(mut self, url: &str) -> Self {
		self.rpc_url = url.to_string();
		self
	}

	pub fn cursor_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.cursor_file = path.into();
		self
	}

	pub fn start_block(mut self, block: u64) -> Self {
		self.start_block = block;
		self
	}

	pub fn end_block(mut self, block: u64) -> Self {
		self.end_block = Some(block);
		self
	}

	pub fn unbounded(mut self) -> Self {
		self.end_block = None;
		self
	}

	pub fn batch_size(mut self, size: u64) -> Self {
		self.batch_size = size;
		self
	}

	pub fn policy(mut self, policy: RetrievalPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn include_transactions(mut self, include: bool) -> Self {
		self.include_transactions = include;
		self
	}

	pub fn rewind(mut self, rewind: bool) -> Self {
		self.rewind = rewind;
		self
	}

	pub fn create_schema(mut self, create: bool) -> Self {
		self.create_schema = create;
		self
	}

	pub fn max_retries(mut self, retries: u32) -> Self {
		self.retry.max_retries = retries;
		self
	}

	pub fn idle_backoff(mut self, initial_ms: u64, max_ms: u64) -> Self {
		self.idle_backoff = IdleBackoffConfig { initial_ms, max_ms };
		self
	}

	pub fn build(self) -> IndexerConfig {
		IndexerConfig {
			database_url: self.database_url,
			rpc_url: self.rpc_url,
			cursor_file: self.cursor_file,
			start_block: self.start_block,
			end_block: self.end_block,
			batch_size: self.batch_size,
			debug: false,
			policy: self.policy,
			include_transactions: self.include_transactions,
			rewind: self.rewind,
			create_schema: self.create_schema,
			retry: self.retry,
			idle_backoff: self.idle_backoff,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::{ConfigError, MAX_BATCH_SIZE};

	#[test]
	fn test_default_config_is_valid() {
		let config = IndexerConfigBuilder::new().build();

		assert!(config.validate().is_ok());
		assert_eq!(config.database_url, "sqlite::memory:");
		assert_eq!(config.end_block, None);
		assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
		assert_eq!(config.cursor_file, PathBuf::from(DEFAULT_CURSOR_FILE));
		assert_eq!(config.retry.jitter, JitterSetting::None);
	}

	#[test]
	fn test_builder_methods() {
		let config = IndexerConfigBuilder::new()
			.start_block(100)
			.end_block(103)
			.batch_size(2)
			.policy(RetrievalPolicy::Single)
			.include_transactions(true)
			.rewind(true)
			.max_retries(0)
			.build();

		assert_eq!(config.start_block, 100);
		assert_eq!(config.end_block, Some(103));
		assert_eq!(config.batch_size, 2);
		assert_eq!(config.policy, RetrievalPolicy::Single);
		assert!(config.include_transactions);
		assert!(config.rewind);
		assert_eq!(config.retry.max_retries, 0);
	}

	#[test]
	fn test_batch_size_upper_bound() {
		let at_bound = IndexerConfigBuilder::new()
			.batch_size(MAX_BATCH_SIZE)
			.build();
		assert!(at_bound.validate().is_ok());

		let over_bound = IndexerConfigBuilder::new()
			.batch_size(MAX_BATCH_SIZE + 1)
			.build();
		assert!(matches!(
			over_bound.validate(),
			Err(ConfigError::ValidationError(_))
		));
	}
}
