//! Turns `eth_getBlockByNumber` payloads into [`BlockResult`]s.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::{BlockResult, RawBlock},
	services::blockchain::BlockChainError,
	utils::parse_block_number,
};

/// Interprets the `result` member of a block response for block `number`.
///
/// A missing or `null` payload, or a block object without a number, means the
/// node has no block at that height. Transaction hashes are taken in order,
/// from bare strings or from transaction objects.
pub fn interpret_block(number: u64, payload: Option<&Value>) -> Result<BlockResult, BlockChainError> {
	let payload = match payload {
		None | Some(Value::Null) => return Ok(BlockResult::absent(number)),
		Some(payload) => payload,
	};

	if !payload.is_object() {
		return Err(BlockChainError::decode_error(
			format!("Block payload is not an object: {}", payload),
			None,
			Some(HashMap::from([("block".to_string(), number.to_string())])),
		));
	}

	let block = RawBlock::deserialize(payload).map_err(|e| {
		BlockChainError::decode_error(
			format!("Failed to decode block payload: {}", e),
			Some(Box::new(e)),
			Some(HashMap::from([("block".to_string(), number.to_string())])),
		)
	})?;

	let reported = match block.number.as_deref().map(str::trim) {
		None | Some("") => return Ok(BlockResult::absent(number)),
		Some(reported) => reported,
	};

	match parse_block_number(reported) {
		Ok(reported_number) if reported_number != number => {
			tracing::warn!(
				"Node returned block {} when asked for block {}",
				reported_number,
				number
			);
		}
		Ok(_) => {}
		Err(e) => {
			return Err(BlockChainError::decode_error(
				format!("Invalid block number '{}': {}", reported, e),
				None,
				Some(HashMap::from([("block".to_string(), number.to_string())])),
			));
		}
	}

	let hashes = block
		.transactions
		.iter()
		.map(|tx| tx.hash().to_string())
		.collect();

	Ok(BlockResult::present(number, hashes))
}
