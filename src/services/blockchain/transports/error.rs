//! Error types for the JSON-RPC transport
//!
//! Covers HTTP status failures, network failures and JSON (de)serialization.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
	/// HTTP error
	#[error("HTTP error: status {status_code} for URL {url}")]
	Http {
		status_code: reqwest::StatusCode,
		url: String,
		body: String,
		context: ErrorContext,
	},

	/// Network error
	#[error("Network error: {0}")]
	Network(ErrorContext),

	/// JSON parsing error
	#[error("Failed to parse JSON response: {0}")]
	ResponseParse(ErrorContext),

	/// Request body serialization error
	#[error("Failed to serialize request JSON: {0}")]
	RequestSerialization(ErrorContext),
}

impl TransportError {
	pub fn http(
		status_code: reqwest::StatusCode,
		url: String,
		body: String,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let msg = format!("HTTP error: status {} for URL {}", status_code, url);

		Self::Http {
			status_code,
			url,
			body,
			context: ErrorContext::new_with_log(msg, source, metadata),
		}
	}

	pub fn network(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Network(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn response_parse(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn request_serialization(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestSerialization(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for TransportError {
	fn trace_id(&self) -> String {
		match self {
			Self::Http { context, .. } => context.trace_id.clone(),
			Self::Network(ctx) => ctx.trace_id.clone(),
			Self::ResponseParse(ctx) => ctx.trace_id.clone(),
			Self::RequestSerialization(ctx) => ctx.trace_id.clone(),
		}
	}
}
