//! Configuration loading and validation.
//!
//! The indexer is configured once at startup from command line flags, an
//! optional JSON file and built-in defaults, in that order of precedence.
//! The resulting [`IndexerConfig`] is immutable and shared by every component.

#![allow(clippy::result_large_err)]

mod error;
mod indexer_config;

pub use error::ConfigError;
pub use indexer_config::{
	ConfigOverrides, IdleBackoffConfig, IndexerConfig, DEFAULT_BATCH_SIZE, DEFAULT_CONFIG_PATH,
	DEFAULT_CURSOR_FILE, MAX_BATCH_SIZE,
};
