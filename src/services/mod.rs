//! Core services implementing the indexer.
//!
//! This module contains the main service implementations:
//! - `blockchain`: JSON-RPC transport, block source and block interpretation
//! - `follower`: Cursor storage and the follow loop
//! - `ledger`: Transaction and gap persistence

pub mod blockchain;
pub mod follower;
pub mod ledger;
