//! Block retrieval over JSON-RPC.
//!
//! One [`RpcBlockSource`] serves both retrieval policies: a single JSON-RPC
//! batch per range, or one request per block awaited together.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tracing::instrument;

use crate::{
	models::{BlockQuery, BlockResult, RetrievalPolicy},
	services::blockchain::{
		interpret_block,
		transports::{build_rpc_request, BlockchainTransport},
		BlockChainError,
	},
	utils::to_hex_quantity,
};

/// JSON-RPC method used to fetch blocks
pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Source of interpreted blocks
#[async_trait]
pub trait BlockSource: Send + Sync {
	/// Fetches the given blocks.
	///
	/// Returns exactly one result per query, in query order.
	async fn fetch(&self, queries: &[BlockQuery]) -> Result<Vec<BlockResult>, BlockChainError>;
}

/// Block source backed by a JSON-RPC transport
pub struct RpcBlockSource<T: BlockchainTransport> {
	transport: Arc<T>,
	policy: RetrievalPolicy,
}

impl<T: BlockchainTransport> RpcBlockSource<T> {
	pub fn new(transport: Arc<T>, policy: RetrievalPolicy) -> Self {
		Self { transport, policy }
	}

	pub fn policy(&self) -> RetrievalPolicy {
		self.policy
	}

	async fn fetch_batch(&self, queries: &[BlockQuery]) -> Result<Vec<BlockResult>, BlockChainError> {
		let requests = queries
			.iter()
			.enumerate()
			.map(|(id, query)| build_rpc_request(GET_BLOCK_BY_NUMBER, block_params(query), id as u64))
			.collect();

		let responses = self.transport.send_batch_request(requests).await?;
		let envelopes = order_by_id(responses, queries.len())?;

		queries
			.iter()
			.zip(envelopes.iter())
			.map(|(query, envelope)| result_from_envelope(query.number, envelope))
			.collect()
	}

	async fn fetch_each(&self, queries: &[BlockQuery]) -> Result<Vec<BlockResult>, BlockChainError> {
		let transport = &self.transport;
		try_join_all(queries.iter().map(|query| async move {
			let envelope = transport
				.send_raw_request(GET_BLOCK_BY_NUMBER, block_params(query))
				.await?;
			result_from_envelope(query.number, &envelope)
		}))
		.await
	}
}

#[async_trait]
impl<T: BlockchainTransport> BlockSource for RpcBlockSource<T> {
	#[instrument(skip_all, fields(policy = %self.policy, blocks = queries.len()))]
	async fn fetch(&self, queries: &[BlockQuery]) -> Result<Vec<BlockResult>, BlockChainError> {
		if queries.is_empty() {
			return Ok(Vec::new());
		}

		let results = match self.policy {
			RetrievalPolicy::Batch => self.fetch_batch(queries).await?,
			RetrievalPolicy::Single => self.fetch_each(queries).await?,
		};

		tracing::debug!(
			"Fetched {} blocks, {} present",
			results.len(),
			results.iter().filter(|r| r.present).count()
		);
		Ok(results)
	}
}

fn block_params(query: &BlockQuery) -> Value {
	json!([to_hex_quantity(query.number), query.include_transactions])
}

/// Puts batch response envelopes back in request order.
///
/// Envelopes are matched by their numeric `id` (the request index); an
/// envelope without an id takes its position in the response array.
fn order_by_id(responses: Vec<Value>, expected: usize) -> Result<Vec<Value>, BlockChainError> {
	if responses.len() != expected {
		return Err(BlockChainError::decode_error(
			format!(
				"Batch response has {} entries, expected {}",
				responses.len(),
				expected
			),
			None,
			None,
		));
	}

	let mut slots: Vec<Option<Value>> = vec![None; expected];
	for (position, envelope) in responses.into_iter().enumerate() {
		let slot = match envelope.get("id") {
			None | Some(Value::Null) => position,
			Some(id) => match id.as_u64() {
				Some(id) if (id as usize) < expected => id as usize,
				_ => {
					return Err(BlockChainError::decode_error(
						format!("Batch response carries an unknown id: {}", id),
						None,
						None,
					));
				}
			},
		};

		if slots[slot].is_some() {
			return Err(BlockChainError::decode_error(
				format!("Batch response answers request {} twice", slot),
				None,
				None,
			));
		}
		slots[slot] = Some(envelope);
	}

	// Length matches and no slot was filled twice, so every slot is filled
	Ok(slots.into_iter().flatten().collect())
}

/// Reads one JSON-RPC response envelope for block `number`.
fn result_from_envelope(number: u64, envelope: &Value) -> Result<BlockResult, BlockChainError> {
	if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
		return Err(BlockChainError::request_error(
			format!("RPC error for block {}: {}", number, error),
			None,
			Some(HashMap::from([("block".to_string(), number.to_string())])),
		));
	}

	interpret_block(number, envelope.get("result"))
}
