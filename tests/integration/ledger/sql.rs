use futures::future::join_all;
use tempfile::TempDir;

use tx_indexer::{
	models::GapRecord,
	services::ledger::{LedgerSink, SqlLedger},
};

use crate::integration::mocks::create_test_ledger;

#[tokio::test]
async fn test_concurrent_writes_of_same_hash_are_all_counted() {
	let ledger = create_test_ledger().await;

	let writes = (0..10).map(|_| ledger.record_transaction("0xabc"));
	for result in join_all(writes).await {
		result.unwrap();
	}

	let record = ledger.get_transaction("0xabc").await.unwrap().unwrap();
	assert_eq!(record.count, 10);
}

#[tokio::test]
async fn test_ledger_survives_reopen() {
	let dir = TempDir::new().unwrap();
	let url = format!("sqlite://{}", dir.path().join("ledger.db").display());

	let ledger = SqlLedger::connect(&url).await.unwrap();
	ledger.ensure_schema().await.unwrap();
	ledger.record_transaction("0x01").await.unwrap();
	ledger.record_gap(12).await.unwrap();
	ledger.close().await;

	let reopened = SqlLedger::connect(&url).await.unwrap();
	reopened.ensure_schema().await.unwrap();
	reopened.record_transaction("0x01").await.unwrap();
	reopened.record_gap(12).await.unwrap();

	let record = reopened.get_transaction("0x01").await.unwrap().unwrap();
	assert_eq!(record.count, 2);
	assert_eq!(
		reopened.get_gap(12).await.unwrap(),
		Some(GapRecord { block: 12 })
	);
}

#[tokio::test]
async fn test_large_block_numbers_round_trip() {
	let ledger = create_test_ledger().await;

	ledger.record_gap(u64::MAX).await.unwrap();

	assert_eq!(
		ledger.get_gap(u64::MAX).await.unwrap(),
		Some(GapRecord { block: u64::MAX })
	);
	assert!(ledger.get_gap(u64::MAX - 1).await.unwrap().is_none());
}
