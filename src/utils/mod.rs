//! Utility modules for common functionality.
//!
//! - http: retryable HTTP client creation and the shared retry policy
//! - logging: logging setup and the error context used by every error type
//! - parsing: parsing helpers (sizes, block numbers)
//! - tests: Test utilities

pub mod http;
pub mod logging;
pub mod parsing;
pub mod tests;

pub use http::*;
pub use parsing::*;
