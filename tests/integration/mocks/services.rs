use async_trait::async_trait;
use mockall::mock;

use tx_indexer::{
	models::{BlockQuery, BlockResult},
	services::{
		blockchain::{BlockChainError, BlockSource},
		follower::CursorStore,
		ledger::{LedgerError, LedgerSink},
	},
};

mock! {
	pub BlockSource {}

	#[async_trait]
	impl BlockSource for BlockSource {
		async fn fetch(&self, queries: &[BlockQuery]) -> Result<Vec<BlockResult>, BlockChainError>;
	}
}

mock! {
	pub LedgerSink {}

	#[async_trait]
	impl LedgerSink for LedgerSink {
		async fn record_transaction(&self, hash: &str) -> Result<(), LedgerError>;
		async fn record_gap(&self, block: u64) -> Result<(), LedgerError>;
	}
}

mock! {
	pub CursorStore {}

	#[async_trait]
	impl CursorStore for CursorStore {
		async fn load(&self) -> Result<Option<u64>, anyhow::Error>;
		async fn save(&self, cursor: u64) -> Result<(), anyhow::Error>;
	}
}
