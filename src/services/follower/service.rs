//! Follow loop implementation.
//!
//! Walks the chain from the cursor, one batch at a time: fetch the batch,
//! record a gap for every absent block and every transaction hash of every
//! present block, then persist the cursor past the block. A block's effects
//! are always stored before the cursor moves past it.

use backon::{ExponentialBuilder, Retryable};
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tracing::instrument;

use crate::{
	models::{BlockQuery, IndexerConfig},
	services::{
		blockchain::BlockSource,
		follower::{cursor::CursorStore, error::FollowerError},
		ledger::{LedgerError, LedgerSink},
	},
	utils::JitterSetting,
};

/// Lifecycle of the follow loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
	Running,
	/// The end block was reached and the loop is winding down
	Stopping,
	Stopped,
}

impl std::fmt::Display for FollowState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Running => write!(f, "running"),
			Self::Stopping => write!(f, "stopping"),
			Self::Stopped => write!(f, "stopped"),
		}
	}
}

/// Counts of what one batch did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
	/// First block of the batch
	pub first_block: u64,
	/// Blocks whose effects were stored and whose cursor was persisted
	pub processed: u64,
	/// Blocks the node returned
	pub present: u64,
	/// Blocks the node did not have, recorded as gaps
	pub gaps: u64,
	/// Transaction hashes recorded
	pub transactions: u64,
}

/// Cursor-driven block follower
///
/// # Type Parameters
/// * `C` - Cursor storage
/// * `B` - Block source
/// * `L` - Ledger sink
pub struct FollowLoop<C, B, L> {
	config: Arc<IndexerConfig>,
	cursor_store: Arc<C>,
	block_source: Arc<B>,
	ledger: Arc<L>,
	state: FollowState,
	cursor: u64,
}

impl<C, B, L> FollowLoop<C, B, L>
where
	C: CursorStore,
	B: BlockSource,
	L: LedgerSink,
{
	pub fn new(
		config: Arc<IndexerConfig>,
		cursor_store: Arc<C>,
		block_source: Arc<B>,
		ledger: Arc<L>,
	) -> Self {
		let cursor = config.start_block;
		Self {
			config,
			cursor_store,
			block_source,
			ledger,
			state: FollowState::Stopped,
			cursor,
		}
	}

	pub fn state(&self) -> FollowState {
		self.state
	}

	/// Next block to process
	pub fn cursor(&self) -> u64 {
		self.cursor
	}

	/// Whether the configured end block has been reached
	pub fn end_reached(&self) -> bool {
		self.config
			.end_block
			.map(|end| self.cursor >= end)
			.unwrap_or(false)
	}

	/// Positions the cursor and marks the loop as running
	///
	/// The persisted cursor wins over the configured start block, unless the
	/// rewind override is set.
	#[instrument(skip_all)]
	pub async fn initialize(&mut self) -> Result<u64, FollowerError> {
		let persisted = self.cursor_store.load().await.map_err(|e| {
			FollowerError::cursor_error("Failed to load cursor", Some(e.into()), None)
		})?;

		self.cursor = match persisted {
			Some(persisted) if self.config.rewind => {
				tracing::info!(
					"Rewinding from persisted cursor {} to start block {}",
					persisted,
					self.config.start_block
				);
				self.config.start_block
			}
			Some(persisted) => {
				tracing::info!("Resuming from persisted cursor {}", persisted);
				persisted
			}
			None => {
				tracing::info!(
					"No persisted cursor, starting at block {}",
					self.config.start_block
				);
				self.config.start_block
			}
		};

		self.state = FollowState::Running;
		Ok(self.cursor)
	}

	/// Queries for the next batch, clamped so the end block is never requested
	pub fn next_batch(&self) -> Vec<BlockQuery> {
		let count = match self.config.end_block {
			Some(end) => self.config.batch_size.min(end.saturating_sub(self.cursor)),
			None => self.config.batch_size,
		};
		BlockQuery::range(self.cursor, count, self.config.include_transactions)
	}

	/// Fetches and stores one batch, advancing the cursor block by block
	///
	/// On error the cursor stays at the first block whose effects or cursor
	/// write failed.
	#[instrument(skip_all, fields(cursor = self.cursor))]
	pub async fn process_batch(&mut self) -> Result<BatchSummary, FollowerError> {
		let queries = self.next_batch();
		let mut summary = BatchSummary {
			first_block: self.cursor,
			..Default::default()
		};

		let (first, last) = match (queries.first(), queries.last()) {
			(Some(first), Some(last)) => (first.number, last.number),
			_ => return Ok(summary),
		};
		let range_metadata = || {
			Some(HashMap::from([
				("from".to_string(), first.to_string()),
				("to".to_string(), last.to_string()),
			]))
		};

		let results = self.block_source.fetch(&queries).await.map_err(|e| {
			FollowerError::source_error(
				format!("Failed to fetch blocks {} to {}", first, last),
				Some(Box::new(e)),
				range_metadata(),
			)
		})?;

		if results.len() != queries.len() {
			return Err(FollowerError::processing_error(
				format!(
					"Block source returned {} results for {} blocks",
					results.len(),
					queries.len()
				),
				None,
				range_metadata(),
			));
		}
		if let Some((query, result)) = queries
			.iter()
			.zip(results.iter())
			.find(|(query, result)| query.number != result.number)
		{
			return Err(FollowerError::processing_error(
				format!(
					"Block source returned block {} in place of block {}",
					result.number, query.number
				),
				None,
				range_metadata(),
			));
		}

		for result in results {
			let block = result.number;
			if result.present {
				for hash in &result.transaction_hashes {
					self.write_with_retry(|| self.ledger.record_transaction(hash))
						.await
						.map_err(|e| {
							FollowerError::ledger_error(
								format!("Failed to record transaction of block {}", block),
								Some(Box::new(e)),
								Some(HashMap::from([
									("block".to_string(), block.to_string()),
									("tx".to_string(), hash.clone()),
								])),
							)
						})?;
				}
				summary.present += 1;
				summary.transactions += result.transaction_hashes.len() as u64;
			} else {
				tracing::debug!("Block {} not available, recording gap", block);
				self.write_with_retry(|| self.ledger.record_gap(block))
					.await
					.map_err(|e| {
						FollowerError::ledger_error(
							format!("Failed to record gap for block {}", block),
							Some(Box::new(e)),
							Some(HashMap::from([("block".to_string(), block.to_string())])),
						)
					})?;
				summary.gaps += 1;
			}

			let next = block.checked_add(1).ok_or_else(|| {
				FollowerError::processing_error(
					format!("Cursor cannot move past block {}", block),
					None,
					Some(HashMap::from([("block".to_string(), block.to_string())])),
				)
			})?;
			self.cursor_store.save(next).await.map_err(|e| {
				FollowerError::cursor_error(
					format!("Failed to save cursor {}", next),
					Some(e.into()),
					None,
				)
			})?;
			self.cursor = next;
			summary.processed += 1;
		}

		Ok(summary)
	}

	/// Runs until the end block is reached or an error occurs
	///
	/// # Returns
	/// * `Result<u64, FollowerError>` - Final cursor, or the error that stopped the loop
	pub async fn run(&mut self) -> Result<u64, FollowerError> {
		self.initialize().await?;

		let idle_initial = self.config.idle_backoff.initial();
		let idle_max = self.config.idle_backoff.max();
		let mut idle_delay = idle_initial;

		loop {
			if self.end_reached() {
				self.state = FollowState::Stopping;
				tracing::info!(
					"Reached end block {}, stopping",
					self.config.end_block.unwrap_or(self.cursor)
				);
				self.state = FollowState::Stopped;
				return Ok(self.cursor);
			}

			if self.next_batch().is_empty() {
				self.state = FollowState::Stopping;
				tracing::warn!("No block numbers left after {}, stopping", self.cursor);
				self.state = FollowState::Stopped;
				return Ok(self.cursor);
			}

			let start_time = std::time::Instant::now();
			let summary = match self.process_batch().await {
				Ok(summary) => summary,
				Err(e) => {
					self.state = FollowState::Stopped;
					return Err(e);
				}
			};

			tracing::info!(
				"Processed {} blocks in {}ms ({} present, {} gaps, {} transactions), next block {}",
				summary.processed,
				start_time.elapsed().as_millis(),
				summary.present,
				summary.gaps,
				summary.transactions,
				self.cursor
			);

			if summary.processed > 0 && summary.present == 0 {
				tracing::debug!("No block available, waiting {:?}", idle_delay);
				tokio::time::sleep(idle_delay).await;
				idle_delay = next_idle_delay(idle_delay, idle_max);
			} else {
				idle_delay = idle_initial;
			}
		}
	}

	/// Runs a ledger write, retrying transient failures with exponential backoff
	async fn write_with_retry<F, Fut>(&self, operation: F) -> Result<(), LedgerError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<(), LedgerError>>,
	{
		let retry_policy = &self.config.retry;
		let backoff = ExponentialBuilder::default()
			.with_min_delay(retry_policy.initial_backoff)
			.with_max_delay(retry_policy.max_backoff)
			.with_factor(retry_policy.base_for_backoff as f32)
			.with_max_times(retry_policy.max_retries as usize);

		let backoff_with_jitter = match retry_policy.jitter {
			JitterSetting::Full => backoff.with_jitter(),
			JitterSetting::None => backoff,
		};

		operation
			.retry(backoff_with_jitter)
			.when(|e: &LedgerError| e.is_transient())
			.notify(|e: &LedgerError, delay: Duration| {
				tracing::warn!("Retrying ledger write in {:?}: {}", delay, e);
			})
			.await
	}
}

fn next_idle_delay(current: Duration, max: Duration) -> Duration {
	current.saturating_mul(2).min(max)
}
