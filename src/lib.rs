//! EVM transaction indexer.
//!
//! This library follows an EVM chain over JSON-RPC and persists the hash of
//! every transaction it sees, along with the numbers of blocks that were not
//! available, into a relational ledger. It includes:
//!
//! - Cursor-driven batch block retrieval with resumable progress
//! - Missing-block (gap) detection
//! - Idempotent persistence to PostgreSQL or SQLite
//!
//! # Module Structure
//!
//! - `bootstrap`: Wires the services together
//! - `models`: Configuration, wire types and domain data
//! - `services`: Block retrieval, the ledger and the follow loop
//! - `utils`: Logging, HTTP retry and parsing helpers

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
