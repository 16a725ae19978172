//! Decoding of `Error(string)` reverts and `Panic(uint256)` aborts.

use alloy::sol_types::{Panic, Revert, SolError};
use crosswire_types::{RevertFault, RevertKind};

use crate::RevertDecoder;

/// Decodes the two built-in Solidity revert shapes.
#[derive(Debug, Default, Clone)]
pub struct StringRevertDecoder;

impl StringRevertDecoder {
	pub fn new() -> Self {
		Self
	}
}

impl RevertDecoder for StringRevertDecoder {
	fn decode(&self, data: &[u8]) -> Option<RevertFault> {
		if data.len() < 4 {
			return None;
		}
		if let Ok(revert) = Revert::abi_decode(data) {
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::StringRevert {
					reason: revert.reason,
				},
			));
		}
		if let Ok(panic) = Panic::abi_decode(data) {
			let code = u64::try_from(panic.code).unwrap_or(u64::MAX);
			return Some(RevertFault::new(data.to_vec(), RevertKind::Panic { code }));
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::U256;

	#[test]
	fn decodes_string_reverts() {
		let data = Revert::from("insufficient liquidity").abi_encode();
		let fault = StringRevertDecoder::new().decode(&data).unwrap();
		match fault.kind {
			RevertKind::StringRevert { reason } => {
				assert_eq!(reason, "insufficient liquidity");
			}
			other => panic!("expected string revert, got {other:?}"),
		}
	}

	#[test]
	fn decodes_arithmetic_panics() {
		let data = Panic {
			code: U256::from(0x11u64),
		}
		.abi_encode();
		let fault = StringRevertDecoder::new().decode(&data).unwrap();
		assert!(matches!(fault.kind, RevertKind::Panic { code: 0x11 }));
	}

	#[test]
	fn ignores_unrelated_selectors() {
		assert!(StringRevertDecoder::new()
			.decode(&[0xde, 0xad, 0xbe, 0xef, 0x00])
			.is_none());
		assert!(StringRevertDecoder::new().decode(&[]).is_none());
	}
}
