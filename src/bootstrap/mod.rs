//! Bootstrap module for wiring the indexer together.
//!
//! Builds the production collaborators of the follow loop from the
//! configuration:
//! - `HttpTransportClient` + `RpcBlockSource`: block retrieval over JSON-RPC
//! - `SqlLedger`: transaction and gap persistence
//! - `FileCursorStore`: durable cursor

use std::{error::Error, sync::Arc};

use crate::{
	models::IndexerConfig,
	services::{
		blockchain::{BlockSource, HttpTransportClient, RpcBlockSource},
		follower::{CursorStore, FileCursorStore, FollowLoop},
		ledger::{LedgerSink, SqlLedger},
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Follow loop over the production collaborators
pub type IndexerLoop = FollowLoop<FileCursorStore, RpcBlockSource<HttpTransportClient>, SqlLedger>;

/// Initializes all services and returns a follow loop ready to run.
///
/// Checks that the RPC endpoint answers and that the ledger is reachable, and
/// creates the ledger tables unless disabled.
///
/// # Errors
/// Returns an error if the RPC endpoint or the database cannot be reached
pub async fn initialize_services(config: Arc<IndexerConfig>) -> Result<IndexerLoop> {
	let transport = HttpTransportClient::new(&config.rpc_url, &config.retry)?;
	transport.try_connect().await?;
	let block_source = RpcBlockSource::new(Arc::new(transport), config.policy);

	let ledger = SqlLedger::connect(&config.database_url).await?;
	if config.create_schema {
		ledger.ensure_schema().await?;
	}

	let cursor_store = FileCursorStore::new(config.cursor_file.clone());

	tracing::info!(
		"Indexer initialized: policy {}, batch size {}, cursor file {}",
		config.policy,
		config.batch_size,
		config.cursor_file.display()
	);

	Ok(create_follow_loop(
		config,
		Arc::new(cursor_store),
		Arc::new(block_source),
		Arc::new(ledger),
	))
}

/// Creates a follow loop over arbitrary collaborators.
pub fn create_follow_loop<C, B, L>(
	config: Arc<IndexerConfig>,
	cursor_store: Arc<C>,
	block_source: Arc<B>,
	ledger: Arc<L>,
) -> FollowLoop<C, B, L>
where
	C: CursorStore,
	B: BlockSource,
	L: LedgerSink,
{
	FollowLoop::new(config, cursor_store, block_source, ledger)
}
