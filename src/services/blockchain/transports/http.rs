//! HTTP transport implementation for JSON-RPC.
//!
//! Requests go through a retryable client: connection failures, timeouts,
//! 5xx and 429 responses are retried with exponential backoff before an
//! error is returned.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};
use std::{
	collections::HashMap,
	sync::atomic::{AtomicU64, Ordering},
	time::Duration,
};
use url::Url;

use crate::{
	services::blockchain::transports::{
		build_rpc_request, BlockchainTransport, TransientErrorRetryStrategy, TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

/// HTTP transport client for one JSON-RPC endpoint
///
/// The client is thread-safe and can be shared across tasks.
#[derive(Debug)]
pub struct HttpTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	url: Url,
	next_id: AtomicU64,
}

impl HttpTransportClient {
	/// Creates a new HTTP transport client
	///
	/// # Arguments
	/// * `rpc_url` - JSON-RPC endpoint
	/// * `retry_config` - Retry policy for transient HTTP failures
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or configuration error
	pub fn new(rpc_url: &str, retry_config: &RetryConfig) -> Result<Self, anyhow::Error> {
		let url = Url::parse(rpc_url).with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

		let base_http_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(Duration::from_secs(30))
			.connect_timeout(Duration::from_secs(20))
			.build()
			.context("Failed to create base HTTP client")?;

		let client = create_retryable_http_client(
			retry_config,
			base_http_client,
			Some(TransientErrorRetryStrategy),
		);

		Ok(Self {
			client,
			url,
			next_id: AtomicU64::new(1),
		})
	}

	/// Checks that the endpoint answers a `net_version` call
	pub async fn try_connect(&self) -> Result<(), anyhow::Error> {
		let test_request = json!({
			"jsonrpc": "2.0",
			"id": 0,
			"method": "net_version",
			"params": []
		});

		let response = self
			.client
			.post(self.url.clone())
			.json(&test_request)
			.send()
			.await
			.map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", self.url, e))?;

		let status = response.status();
		if !status.is_success() {
			return Err(anyhow::anyhow!(
				"Failed to connect to {}: {}",
				self.url,
				status.as_u16()
			));
		}

		let body: Value = response
			.json()
			.await
			.with_context(|| format!("Invalid net_version response from {}", self.url))?;
		if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
			return Err(anyhow::anyhow!(
				"net_version rejected by {}: {}",
				self.url,
				error
			));
		}

		let network = body.get("result").unwrap_or(&Value::Null);
		tracing::debug!("Connected to {} (network {})", self.url, network);
		Ok(())
	}

	/// Posts a JSON body and parses the JSON response
	async fn post(&self, body: &Value) -> Result<Value, TransportError> {
		let body_str = serde_json::to_string(body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;

		let response = self
			.client
			.post(self.url.clone())
			.header("Content-Type", "application/json")
			.body(body_str)
			.send()
			.await
			.map_err(|e| {
				TransportError::network(
					format!("Request to {} failed", self.url),
					Some(Box::new(e)),
					None,
				)
			})?;

		let status = response.status();
		if !status.is_success() {
			let error_body = response.text().await.unwrap_or_default();
			tracing::warn!(
				"Request to {} failed with status {}: {}",
				self.url,
				status,
				error_body
			);
			return Err(TransportError::http(
				status,
				self.url.to_string(),
				error_body,
				None,
				None,
			));
		}

		response.json().await.map_err(|e| {
			TransportError::response_parse(
				"Failed to parse JSON response".to_string(),
				Some(Box::new(e)),
				None,
			)
		})
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.url.to_string()
	}

	/// Sends a JSON-RPC request with a fresh request id
	///
	/// # Arguments
	/// * `method` - The JSON-RPC method name to call
	/// * `params` - Parameters for the method call
	///
	/// # Returns
	/// * `Result<Value, TransportError>` - Response envelope or error with context
	async fn send_raw_request(
		&self,
		method: &str,
		params: Value,
	) -> Result<Value, TransportError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.post(&build_rpc_request(method, params, id)).await
	}

	/// Sends a JSON-RPC batch
	///
	/// A node that rejects the batch as a whole answers with a single error
	/// object instead of an array; that is reported as a parse error.
	async fn send_batch_request(&self, requests: Vec<Value>) -> Result<Vec<Value>, TransportError> {
		if requests.is_empty() {
			return Ok(Vec::new());
		}

		let sent = requests.len();
		match self.post(&Value::Array(requests)).await? {
			Value::Array(responses) => Ok(responses),
			other => Err(TransportError::response_parse(
				format!("Expected a batch response array, got: {}", other),
				None,
				Some(HashMap::from([("requests".to_string(), sent.to_string())])),
			)),
		}
	}
}
