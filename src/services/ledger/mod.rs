//! Transaction ledger.
//!
//! Records every observed transaction hash with an observation counter, and
//! every block number that had no block at fetch time (a gap).

mod error;
mod sql;

pub use error::LedgerError;
pub use sql::{SqlLedger, GAPS_TABLE, TRANSACTIONS_TABLE};

use async_trait::async_trait;

/// Destination of the follow loop's effects
///
/// Both writes are idempotent with respect to the set of stored keys:
/// recording a transaction twice bumps its counter, recording a gap twice is
/// a no-op.
#[async_trait]
pub trait LedgerSink: Send + Sync {
	/// Inserts the hash with a count of 1, or increments its count
	async fn record_transaction(&self, hash: &str) -> Result<(), LedgerError>;

	/// Inserts the block number unless already recorded
	async fn record_gap(&self, block: u64) -> Result<(), LedgerError>;
}
