//! Parsing utilities
//!
//! This module provides utilities for parsing various types of data.

use byte_unit::Byte;
use std::str::FromStr;

/// Parses a string argument into a `u64` value representing a file size.
///
/// Accepts human-readable formats like "1GB", "500MB", "1024KB", etc.
/// Returns an error if the format is invalid.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Parses a block number given either as a JSON-RPC hex quantity ("0x1b4") or in decimal.
pub fn parse_block_number(s: &str) -> Result<u64, String> {
	let trimmed = s.trim();
	let parsed = match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some(hex) => u64::from_str_radix(hex, 16),
		None => trimmed.parse::<u64>(),
	};
	parsed.map_err(|e| format!("Invalid block number: '{}'. Error: {}", s, e))
}

/// Formats a block number as a JSON-RPC hex quantity.
pub fn to_hex_quantity(number: u64) -> String {
	format!("0x{:x}", number)
}
