//! Test helper utilities
//!
//! This module contains test helper utilities for the application.
//!
//! - `builders`: Test helper utilities for creating configurations and node payloads

pub mod builders {
	pub mod block;
	pub mod config;
}

pub use builders::{block::*, config::*};
