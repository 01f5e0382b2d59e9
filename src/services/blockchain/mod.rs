//! Block retrieval from an EVM JSON-RPC node.
//!
//! - Transport: JSON-RPC 2.0 over HTTP(S) with retries
//! - Source: fetches ranges of blocks with the configured retrieval policy
//! - Interpreter: turns block payloads into present/absent results
//! - Error handling for block retrieval

mod error;
mod interpreter;
mod source;
mod transports;

pub use error::BlockChainError;
pub use interpreter::interpret_block;
pub use source::{BlockSource, RpcBlockSource, GET_BLOCK_BY_NUMBER};
pub use transports::{
	build_rpc_request, BlockchainTransport, HttpTransportClient, TransientErrorRetryStrategy,
	TransportError,
};
