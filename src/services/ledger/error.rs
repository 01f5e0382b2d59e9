//! Ledger error types.
//!
//! Errors are split into transient ones, which the follow loop retries with
//! backoff, and everything else, which stops the loop.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Database error codes worth retrying: Postgres serialization failure and
/// deadlock, SQLite busy and locked.
const TRANSIENT_DATABASE_CODES: [&str; 4] = ["40001", "40P01", "5", "6"];

/// Represents errors that can occur while writing to or reading from the ledger
#[derive(ThisError, Debug)]
pub enum LedgerError {
	/// The database could not be reached or the connection string is unusable
	#[error("Connection error: {0}")]
	ConnectionError(ErrorContext),

	/// The ledger tables could not be created
	#[error("Schema error: {0}")]
	SchemaError(ErrorContext),

	/// A statement was rejected by the database
	#[error("Persistence error: {0}")]
	PersistenceError(ErrorContext),

	/// A statement failed for a reason that may go away on its own
	#[error("Transient error: {0}")]
	TransientError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl LedgerError {
	// Connection error
	pub fn connection_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConnectionError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Schema error
	pub fn schema_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SchemaError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Persistence error
	pub fn persistence_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::PersistenceError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Transient error
	pub fn transient_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::TransientError(ErrorContext::new_with_log(msg, source, metadata))
	}

	/// Wraps a failed statement, classifying it as transient or permanent
	pub fn from_sqlx(
		msg: impl Into<String>,
		err: sqlx::Error,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		if is_transient_sqlx_error(&err) {
			Self::transient_error(msg, Some(Box::new(err)), metadata)
		} else {
			Self::persistence_error(msg, Some(Box::new(err)), metadata)
		}
	}

	/// Whether retrying the failed operation may succeed
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::TransientError(_))
	}
}

fn is_transient_sqlx_error(err: &sqlx::Error) -> bool {
	match err {
		sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
		sqlx::Error::Database(db_err) => db_err
			.code()
			.map(|code| TRANSIENT_DATABASE_CODES.iter().any(|c| code == *c))
			.unwrap_or(false),
		_ => false,
	}
}

impl TraceableError for LedgerError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConnectionError(ctx) => ctx.trace_id.clone(),
			Self::SchemaError(ctx) => ctx.trace_id.clone(),
			Self::PersistenceError(ctx) => ctx.trace_id.clone(),
			Self::TransientError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
