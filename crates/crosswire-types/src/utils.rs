//! String formatting and value-extraction utilities.

use crate::fault::Fault;
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Renders a decoded ABI value as a readable string.
pub fn format_sol_value(value: &DynSolValue) -> String {
	match value {
		DynSolValue::Address(address) => format!("{address}"),
		DynSolValue::Bool(b) => b.to_string(),
		DynSolValue::Uint(v, _) => v.to_string(),
		DynSolValue::Int(v, _) => v.to_string(),
		DynSolValue::String(s) => format!("\"{s}\""),
		DynSolValue::Bytes(bytes) => with_0x_prefix(&hex::encode(bytes)),
		DynSolValue::FixedBytes(word, size) => with_0x_prefix(&hex::encode(&word[..*size])),
		DynSolValue::Array(items)
		| DynSolValue::FixedArray(items)
		| DynSolValue::Tuple(items) => {
			let inner: Vec<String> = items.iter().map(format_sol_value).collect();
			format!("({})", inner.join(", "))
		}
		other => format!("{other:?}"),
	}
}

/// Extracts an unsigned integer from a decoded return value.
pub fn expect_uint(value: &DynSolValue) -> Result<U256, Fault> {
	value
		.as_uint()
		.map(|(v, _)| v)
		.ok_or_else(|| decode_mismatch("uint", value))
}

/// Extracts an address from a decoded return value.
pub fn expect_address(value: &DynSolValue) -> Result<Address, Fault> {
	value
		.as_address()
		.ok_or_else(|| decode_mismatch("address", value))
}

/// Extracts a boolean from a decoded return value.
pub fn expect_bool(value: &DynSolValue) -> Result<bool, Fault> {
	value
		.as_bool()
		.ok_or_else(|| decode_mismatch("bool", value))
}

/// Extracts a string from a decoded return value.
pub fn expect_string(value: &DynSolValue) -> Result<String, Fault> {
	value
		.as_str()
		.map(str::to_string)
		.ok_or_else(|| decode_mismatch("string", value))
}

fn decode_mismatch(expected: &str, value: &DynSolValue) -> Fault {
	Fault::Decode {
		message: format!(
			"expected {expected} return value, got {}",
			format_sol_value(value)
		),
	}
}
