use serde::{Deserialize, Serialize};

/// A transaction hash observation and the number of times it was recorded.
///
/// The counter goes up on every write of the same hash, so retries of an already
/// committed write and genuine repeat observations are not told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
	pub hash: String,
	pub count: i64,
}

/// A block number that had no block at fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRecord {
	pub block: u64,
}
