//! Domain models and data structures for the transaction indexer.
//!
//! - `blockchain`: JSON-RPC wire types for upstream block payloads
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (block queries and results, ledger records)

mod blockchain;
mod config;
mod core;

pub use blockchain::{RawBlock, RetrievalPolicy, TransactionEntry};

pub use config::{
	ConfigError, ConfigOverrides, IdleBackoffConfig, IndexerConfig, DEFAULT_BATCH_SIZE,
	DEFAULT_CONFIG_PATH, DEFAULT_CURSOR_FILE, MAX_BATCH_SIZE,
};

pub use core::{BlockQuery, BlockResult, GapRecord, LedgerRecord};
