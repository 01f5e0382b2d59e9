//! Core domain models.
//!
//! - `block`: block queries sent to the block source and the interpreted results
//! - `ledger`: records persisted by the ledger sink

mod block;
mod ledger;

pub use block::{BlockQuery, BlockResult};
pub use ledger::{GapRecord, LedgerRecord};
