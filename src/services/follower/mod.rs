//! Chain follower.
//!
//! Drives block retrieval from the persisted cursor and hands the results to
//! the ledger. Components:
//! - `cursor`: durable storage of the next block to process
//! - `service`: the follow loop
//! - `error`: errors that stop the loop

mod cursor;
mod error;
mod service;

pub use cursor::{CursorStore, FileCursorStore};
pub use error::FollowerError;
pub use service::{BatchSummary, FollowLoop, FollowState};
