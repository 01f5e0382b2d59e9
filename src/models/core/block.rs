use serde::{Deserialize, Serialize};

/// A request for a single block by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockQuery {
	/// Block number to fetch
	pub number: u64,
	/// Ask the node for full transaction objects instead of bare hashes
	pub include_transactions: bool,
}

impl BlockQuery {
	pub fn new(number: u64, include_transactions: bool) -> Self {
		Self {
			number,
			include_transactions,
		}
	}

	/// Builds the contiguous queries `[from, from + count)`.
	pub fn range(from: u64, count: u64, include_transactions: bool) -> Vec<Self> {
		(from..from.saturating_add(count))
			.map(|number| Self::new(number, include_transactions))
			.collect()
	}
}

/// Interpreted outcome of fetching one block.
///
/// `present == false` means the upstream had no block at that height, which is
/// different from a block that exists and holds no transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResult {
	pub number: u64,
	pub present: bool,
	pub transaction_hashes: Vec<String>,
}

impl BlockResult {
	pub fn absent(number: u64) -> Self {
		Self {
			number,
			present: false,
			transaction_hashes: Vec::new(),
		}
	}

	pub fn present(number: u64, transaction_hashes: Vec<String>) -> Self {
		Self {
			number,
			present: true,
			transaction_hashes,
		}
	}
}
