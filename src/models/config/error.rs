//! Configuration error types.
//!
//! Every configuration error is fatal at startup.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur while loading or validating the configuration
#[derive(ThisError, Debug)]
pub enum ConfigError {
	/// A required value is missing or a value is out of range
	#[error("Validation error: {0}")]
	ValidationError(ErrorContext),

	/// The configuration file is not valid JSON or has unknown keys
	#[error("Parse error: {0}")]
	ParseError(ErrorContext),

	/// The configuration file could not be read
	#[error("File error: {0}")]
	FileError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ConfigError {
	// Validation error
	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		// Not logged here: main reports configuration errors once, on exit
		Self::ValidationError(ErrorContext::new(msg, source, metadata))
	}

	// Parse error
	pub fn parse_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ParseError(ErrorContext::new(msg, source, metadata))
	}

	// File error
	pub fn file_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::FileError(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for ConfigError {
	fn trace_id(&self) -> String {
		match self {
			Self::ValidationError(ctx) => ctx.trace_id.clone(),
			Self::ParseError(ctx) => ctx.trace_id.clone(),
			Self::FileError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}

impl From<std::io::Error> for ConfigError {
	fn from(err: std::io::Error) -> Self {
		Self::file_error(err.to_string(), None, None)
	}
}

impl From<serde_json::Error> for ConfigError {
	fn from(err: serde_json::Error) -> Self {
		Self::parse_error(err.to_string(), None, None)
	}
}
