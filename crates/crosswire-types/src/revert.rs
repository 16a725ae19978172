//! Decoded revert representations.
//!
//! A [`RevertFault`] always carries the raw revert bytes; the decoder
//! chain attaches a [`RevertKind`] describing what those bytes were
//! recognized as. Unrecognized bytes keep [`RevertKind::Generic`].

use alloy::primitives::{Address, Bytes, U256};
use std::fmt;

/// A contract revert, raw bytes plus the decoded interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RevertFault {
	/// The exact revert bytes returned by the node.
	pub raw: Bytes,
	/// What the decoder chain recognized the bytes as.
	pub kind: RevertKind,
}

/// Decoded interpretation of revert bytes.
///
/// The ERC-6093 variants carry optional fields: custom-error decoding
/// fills them, while legacy string reverts mapped onto the same variant
/// leave them empty.
#[derive(Debug, Clone, PartialEq)]
pub enum RevertKind {
	/// ERC20 transfer exceeding the sender balance.
	Erc20InsufficientBalance {
		sender: Option<Address>,
		balance: Option<U256>,
		needed: Option<U256>,
	},
	/// ERC20 transfer-from exceeding the spender allowance.
	Erc20InsufficientAllowance {
		spender: Option<Address>,
		allowance: Option<U256>,
		needed: Option<U256>,
	},
	/// ERC721 operation on a token ID that was never minted or was burned.
	Erc721NonexistentToken { token_id: Option<U256> },
	/// ERC721 transfer from an address that does not own the token.
	Erc721IncorrectOwner {
		sender: Option<Address>,
		token_id: Option<U256>,
		owner: Option<Address>,
	},
	/// ERC721 operation by an operator lacking approval for the token.
	Erc721InsufficientApproval {
		operator: Option<Address>,
		token_id: Option<U256>,
	},
	/// A custom error decoded against a caller-supplied ABI.
	Custom {
		/// Error name from the ABI.
		name: String,
		/// Formatted argument list, e.g. `(0x1234…, 100)`.
		description: String,
	},
	/// Legacy `Error(string)` revert.
	StringRevert { reason: String },
	/// Solidity `Panic(uint256)`.
	Panic { code: u64 },
	/// Bytes matched no configured decoder.
	Generic,
}

impl RevertFault {
	pub fn new(raw: impl Into<Bytes>, kind: RevertKind) -> Self {
		Self {
			raw: raw.into(),
			kind,
		}
	}

	/// A revert no decoder recognized, carrying only the raw bytes.
	pub fn generic(raw: impl Into<Bytes>) -> Self {
		Self::new(raw, RevertKind::Generic)
	}

	/// Whether the decoder chain recognized the revert bytes.
	pub fn is_decoded(&self) -> bool {
		!matches!(self.kind, RevertKind::Generic)
	}

	/// Structured detail lines for logging.
	pub fn detail_lines(&self) -> Vec<String> {
		let mut lines = vec![format!("Revert data: {}", self.raw)];
		match &self.kind {
			RevertKind::Erc20InsufficientBalance {
				sender,
				balance,
				needed,
			} => {
				push_opt(&mut lines, "Sender", sender);
				push_opt(&mut lines, "Balance", balance);
				push_opt(&mut lines, "Needed", needed);
			}
			RevertKind::Erc20InsufficientAllowance {
				spender,
				allowance,
				needed,
			} => {
				push_opt(&mut lines, "Spender", spender);
				push_opt(&mut lines, "Allowance", allowance);
				push_opt(&mut lines, "Needed", needed);
			}
			RevertKind::Erc721NonexistentToken { token_id } => {
				push_opt(&mut lines, "Token ID", token_id);
			}
			RevertKind::Erc721IncorrectOwner {
				sender,
				token_id,
				owner,
			} => {
				push_opt(&mut lines, "Sender", sender);
				push_opt(&mut lines, "Token ID", token_id);
				push_opt(&mut lines, "Owner", owner);
			}
			RevertKind::Erc721InsufficientApproval { operator, token_id } => {
				push_opt(&mut lines, "Operator", operator);
				push_opt(&mut lines, "Token ID", token_id);
			}
			RevertKind::Custom { name, description } => {
				lines.push(format!("Error: {name}{description}"));
			}
			RevertKind::StringRevert { reason } => {
				lines.push(format!("Reason: {reason}"));
			}
			RevertKind::Panic { code } => {
				lines.push(format!("Panic code: 0x{code:02x}"));
			}
			RevertKind::Generic => {}
		}
		lines
	}
}

fn push_opt<T: fmt::Display>(lines: &mut Vec<String>, label: &str, value: &Option<T>) {
	if let Some(value) = value {
		lines.push(format!("{label}: {value}"));
	}
}

impl fmt::Display for RevertFault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			RevertKind::Erc20InsufficientBalance { .. } => {
				write!(f, "contract reverted: ERC20 insufficient balance")
			}
			RevertKind::Erc20InsufficientAllowance { .. } => {
				write!(f, "contract reverted: ERC20 insufficient allowance")
			}
			RevertKind::Erc721NonexistentToken { .. } => {
				write!(f, "contract reverted: ERC721 nonexistent token")
			}
			RevertKind::Erc721IncorrectOwner { .. } => {
				write!(f, "contract reverted: ERC721 incorrect owner")
			}
			RevertKind::Erc721InsufficientApproval { .. } => {
				write!(f, "contract reverted: ERC721 insufficient approval")
			}
			RevertKind::Custom { name, .. } => {
				write!(f, "contract reverted: {name}")
			}
			RevertKind::StringRevert { reason } => {
				write!(f, "contract reverted: {reason}")
			}
			RevertKind::Panic { code } => {
				write!(f, "contract panicked with code 0x{code:02x}")
			}
			RevertKind::Generic => {
				write!(f, "contract reverted with unrecognized data {}", self.raw)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generic_revert_displays_raw_bytes() {
		let revert = RevertFault::generic(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]));
		assert!(!revert.is_decoded());
		assert_eq!(
			revert.to_string(),
			"contract reverted with unrecognized data 0xdeadbeef"
		);
	}

	#[test]
	fn decoded_revert_lists_present_fields_only() {
		let revert = RevertFault::new(
			Bytes::new(),
			RevertKind::Erc20InsufficientAllowance {
				spender: None,
				allowance: None,
				needed: Some(U256::from(100)),
			},
		);
		let lines = revert.detail_lines();
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[1], "Needed: 100");
	}
}
