//! JSON-RPC transport for talking to the upstream node.
//!
//! - `BlockchainTransport`: the seam the block source talks through
//! - `HttpTransportClient`: JSON-RPC 2.0 over HTTP(S) with retries

mod error;
mod http;

pub use error::TransportError;
pub use http::HttpTransportClient;

use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde_json::{json, Value};

/// Base trait for JSON-RPC transports
///
/// Both request methods return the raw response envelopes; interpreting
/// `result` and `error` members is left to the caller.
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// Get the URL requests are sent to
	async fn get_current_url(&self) -> String;

	/// Send a single JSON-RPC call
	async fn send_raw_request(&self, method: &str, params: Value)
		-> Result<Value, TransportError>;

	/// Send several prebuilt JSON-RPC calls as one batch
	///
	/// The returned envelopes are in whatever order the node produced them.
	async fn send_batch_request(&self, requests: Vec<Value>) -> Result<Vec<Value>, TransportError>;
}

/// Builds a JSON-RPC 2.0 request object
pub fn build_rpc_request(method: &str, params: Value, id: u64) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": id,
		"method": method,
		"params": params
	})
}

/// Retries connection failures, timeouts, 5xx and 429 responses
pub struct TransientErrorRetryStrategy;
impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}
