use async_trait::async_trait;
use proptest::{collection, prelude::*, test_runner::Config};
use std::{
	collections::{BTreeSet, HashSet},
	sync::{Arc, Mutex},
};

use tx_indexer::{
	models::{BlockQuery, BlockResult},
	services::{
		blockchain::{BlockChainError, BlockSource},
		follower::{CursorStore, FollowLoop},
		ledger::{LedgerError, LedgerSink},
	},
	utils::tests::IndexerConfigBuilder,
};

use crate::properties::strategies::follow_plan_strategy;

/// Answers every query, leaving out the blocks in `absent`, and records each batch
struct RecordingSource {
	absent: HashSet<u64>,
	batches: Mutex<Vec<Vec<u64>>>,
}

#[async_trait]
impl BlockSource for RecordingSource {
	async fn fetch(&self, queries: &[BlockQuery]) -> Result<Vec<BlockResult>, BlockChainError> {
		self.batches
			.lock()
			.unwrap()
			.push(queries.iter().map(|q| q.number).collect());

		Ok(queries
			.iter()
			.map(|q| {
				if self.absent.contains(&q.number) {
					BlockResult::absent(q.number)
				} else {
					BlockResult::present(q.number, vec![format!("0x{:x}", q.number)])
				}
			})
			.collect())
	}
}

#[derive(Default)]
struct RecordingLedger {
	transactions: Mutex<Vec<String>>,
	gaps: Mutex<BTreeSet<u64>>,
}

#[async_trait]
impl LedgerSink for RecordingLedger {
	async fn record_transaction(&self, hash: &str) -> Result<(), LedgerError> {
		self.transactions.lock().unwrap().push(hash.to_string());
		Ok(())
	}

	async fn record_gap(&self, block: u64) -> Result<(), LedgerError> {
		self.gaps.lock().unwrap().insert(block);
		Ok(())
	}
}

#[derive(Default)]
struct MemoryCursor {
	saved: Mutex<Vec<u64>>,
}

#[async_trait]
impl CursorStore for MemoryCursor {
	async fn load(&self) -> Result<Option<u64>, anyhow::Error> {
		Ok(self.saved.lock().unwrap().last().copied())
	}

	async fn save(&self, cursor: u64) -> Result<(), anyhow::Error> {
		self.saved.lock().unwrap().push(cursor);
		Ok(())
	}
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		cases: 64,
		..Config::default()
	})]

	#[test]
	fn test_every_block_in_range_is_processed_once(
		(start, length, batch_size) in follow_plan_strategy(),
		absent_offsets in collection::hash_set(0u64..40, 0..10),
	) {
		let end = start + length;
		let absent: HashSet<u64> = absent_offsets
			.into_iter()
			.map(|offset| start + offset)
			.collect();

		let config = IndexerConfigBuilder::new()
			.start_block(start)
			.end_block(end)
			.batch_size(batch_size)
			.idle_backoff(1, 1)
			.build();
		let source = Arc::new(RecordingSource {
			absent: absent.clone(),
			batches: Mutex::new(Vec::new()),
		});
		let ledger = Arc::new(RecordingLedger::default());
		let cursor_store = Arc::new(MemoryCursor::default());

		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_time()
			.build()
			.unwrap();
		let final_cursor = runtime
			.block_on(async {
				FollowLoop::new(
					Arc::new(config),
					cursor_store.clone(),
					source.clone(),
					ledger.clone(),
				)
				.run()
				.await
			})
			.unwrap();

		prop_assert_eq!(final_cursor, end);

		let batches = source.batches.lock().unwrap().clone();
		prop_assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() as u64 <= batch_size));
		let fetched: Vec<u64> = batches.into_iter().flatten().collect();
		prop_assert_eq!(fetched, (start..end).collect::<Vec<u64>>());

		// The cursor moves one block at a time
		let saved = cursor_store.saved.lock().unwrap().clone();
		prop_assert_eq!(saved, (start + 1..=end).collect::<Vec<u64>>());

		let expected_gaps: BTreeSet<u64> = (start..end).filter(|n| absent.contains(n)).collect();
		prop_assert_eq!(ledger.gaps.lock().unwrap().clone(), expected_gaps);

		let expected_transactions: Vec<String> = (start..end)
			.filter(|n| !absent.contains(n))
			.map(|n| format!("0x{:x}", n))
			.collect();
		prop_assert_eq!(ledger.transactions.lock().unwrap().clone(), expected_transactions);
	}
}
