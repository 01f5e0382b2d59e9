use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use tx_indexer::services::blockchain::{BlockchainTransport, TransportError};

mock! {
	pub Transport {}

	#[async_trait]
	impl BlockchainTransport for Transport {
		async fn get_current_url(&self) -> String;
		async fn send_raw_request(&self, method: &str, params: Value) -> Result<Value, TransportError>;
		async fn send_batch_request(&self, requests: Vec<Value>) -> Result<Vec<Value>, TransportError>;
	}
}
