//! Block retrieval error types.
//!
//! Every variant is fatal for the current iteration: the cursor has not moved,
//! so the same range is fetched again on the next run.

use crate::{
	services::blockchain::transports::TransportError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors that can occur while retrieving blocks
#[derive(ThisError, Debug)]
pub enum BlockChainError {
	/// The node could not be reached or answered with a failure status
	#[error("Transport error: {0}")]
	TransportError(#[from] TransportError),

	/// The node answered with a payload of an unexpected shape
	#[error("Decode error: {0}")]
	DecodeError(ErrorContext),

	/// The node answered with a JSON-RPC error object
	#[error("Request error: {0}")]
	RequestError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BlockChainError {
	// Decode error
	pub fn decode_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DecodeError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Request error
	pub fn request_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for BlockChainError {
	fn trace_id(&self) -> String {
		match self {
			Self::TransportError(err) => err.trace_id(),
			Self::DecodeError(ctx) => ctx.trace_id.clone(),
			Self::RequestError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
