//! ERC-20 revert decoding.
//!
//! Recognizes the ERC-6093 custom errors emitted by current token
//! contracts and the legacy `Error(string)` messages older ones still
//! revert with. Unknown string reasons fall through so the plain string
//! decoder can report them verbatim.

use alloy::sol;
use alloy::sol_types::{Revert, SolError};
use crosswire_types::{RevertFault, RevertKind};

use crate::RevertDecoder;

sol! {
	error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
	error ERC20InvalidSender(address sender);
	error ERC20InvalidReceiver(address receiver);
	error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
	error ERC20InvalidApprover(address approver);
	error ERC20InvalidSpender(address spender);
}

/// Decodes ERC-20 token reverts, modern and legacy.
#[derive(Debug, Default, Clone)]
pub struct Erc20RevertDecoder;

impl Erc20RevertDecoder {
	pub fn new() -> Self {
		Self
	}
}

impl RevertDecoder for Erc20RevertDecoder {
	fn decode(&self, data: &[u8]) -> Option<RevertFault> {
		if data.len() < 4 {
			return None;
		}
		if let Ok(e) = ERC20InsufficientBalance::abi_decode(data) {
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::Erc20InsufficientBalance {
					sender: Some(e.sender),
					balance: Some(e.balance),
					needed: Some(e.needed),
				},
			));
		}
		if let Ok(e) = ERC20InsufficientAllowance::abi_decode(data) {
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::Erc20InsufficientAllowance {
					spender: Some(e.spender),
					allowance: Some(e.allowance),
					needed: Some(e.needed),
				},
			));
		}
		if let Ok(e) = ERC20InvalidSender::abi_decode(data) {
			return Some(custom(data, "ERC20InvalidSender", format!("invalid sender {}", e.sender)));
		}
		if let Ok(e) = ERC20InvalidReceiver::abi_decode(data) {
			return Some(custom(
				data,
				"ERC20InvalidReceiver",
				format!("invalid receiver {}", e.receiver),
			));
		}
		if let Ok(e) = ERC20InvalidApprover::abi_decode(data) {
			return Some(custom(
				data,
				"ERC20InvalidApprover",
				format!("invalid approver {}", e.approver),
			));
		}
		if let Ok(e) = ERC20InvalidSpender::abi_decode(data) {
			return Some(custom(
				data,
				"ERC20InvalidSpender",
				format!("invalid spender {}", e.spender),
			));
		}
		if let Ok(revert) = Revert::abi_decode(data) {
			return legacy_kind(&revert.reason).map(|kind| RevertFault::new(data.to_vec(), kind));
		}
		None
	}
}

fn custom(data: &[u8], name: &str, description: String) -> RevertFault {
	RevertFault::new(
		data.to_vec(),
		RevertKind::Custom {
			name: name.to_string(),
			description,
		},
	)
}

/// Maps pre-6093 OpenZeppelin revert strings onto the typed kinds, with
/// the argument fields absent.
fn legacy_kind(reason: &str) -> Option<RevertKind> {
	if !reason.starts_with("ERC20:") {
		return None;
	}
	if reason.contains("exceeds balance") {
		return Some(RevertKind::Erc20InsufficientBalance {
			sender: None,
			balance: None,
			needed: None,
		});
	}
	if reason.contains("insufficient allowance") || reason.contains("exceeds allowance") {
		return Some(RevertKind::Erc20InsufficientAllowance {
			spender: None,
			allowance: None,
			needed: None,
		});
	}
	None
}
