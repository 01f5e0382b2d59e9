//! Follow loop error types.
//!
//! Any of these stops the loop. The cursor is never advanced past a block
//! whose effects failed, so a restart picks up where the error happened.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can stop the follow loop
#[derive(ThisError, Debug)]
pub enum FollowerError {
	/// Blocks could not be fetched or decoded
	#[error("Source error: {0}")]
	SourceError(ErrorContext),

	/// A ledger write failed permanently or ran out of retries
	#[error("Ledger error: {0}")]
	LedgerError(ErrorContext),

	/// The cursor could not be loaded or saved
	#[error("Cursor error: {0}")]
	CursorError(ErrorContext),

	/// The fetched results do not match the requested range
	#[error("Processing error: {0}")]
	ProcessingError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl FollowerError {
	// Source error
	pub fn source_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SourceError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Ledger error
	pub fn ledger_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::LedgerError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Cursor error
	pub fn cursor_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::CursorError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Processing error
	pub fn processing_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ProcessingError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for FollowerError {
	fn trace_id(&self) -> String {
		match self {
			Self::SourceError(ctx) => ctx.trace_id.clone(),
			Self::LedgerError(ctx) => ctx.trace_id.clone(),
			Self::CursorError(ctx) => ctx.trace_id.clone(),
			Self::ProcessingError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
