//! JSON-RPC wire types for block payloads.
//!
//! Only the fields the indexer reads are modelled; everything else in the
//! upstream block object is ignored.

use serde::{Deserialize, Serialize};

/// Block object returned in the `result` of `eth_getBlockByNumber`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawBlock {
	/// Block number as a hex quantity. Empty or missing when the node has no block.
	#[serde(default)]
	pub number: Option<String>,
	/// Transactions as bare hashes or as full objects, depending on the request flag
	#[serde(default)]
	pub transactions: Vec<TransactionEntry>,
}

/// A transaction entry in a block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TransactionEntry {
	/// Returned when full transaction objects were not requested
	Hash(String),
	/// Returned when full transaction objects were requested
	Object { hash: String },
}

impl TransactionEntry {
	pub fn hash(&self) -> &str {
		match self {
			Self::Hash(hash) => hash,
			Self::Object { hash } => hash,
		}
	}
}

/// How the block source retrieves a range of blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPolicy {
	/// One JSON-RPC batch request carrying every block of the range
	#[default]
	Batch,
	/// One request per block number
	Single,
}

impl std::str::FromStr for RetrievalPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"batch" => Ok(Self::Batch),
			"single" => Ok(Self::Single),
			other => Err(format!(
				"Invalid retrieval policy '{}', expected 'batch' or 'single'",
				other
			)),
		}
	}
}

impl std::fmt::Display for RetrievalPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Batch => write!(f, "batch"),
			Self::Single => write!(f, "single"),
		}
	}
}
