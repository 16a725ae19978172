//! ERC-721 revert decoding.
//!
//! Same layering as the ERC-20 decoder: ERC-6093 custom errors first,
//! then the legacy OpenZeppelin revert strings, everything else falls
//! through.

use alloy::sol;
use alloy::sol_types::{Revert, SolError};
use crosswire_types::{RevertFault, RevertKind};

use crate::RevertDecoder;

sol! {
	error ERC721InvalidOwner(address owner);
	error ERC721NonexistentToken(uint256 tokenId);
	error ERC721IncorrectOwner(address sender, uint256 tokenId, address owner);
	error ERC721InvalidSender(address sender);
	error ERC721InvalidReceiver(address receiver);
	error ERC721InsufficientApproval(address operator, uint256 tokenId);
	error ERC721InvalidApprover(address approver);
	error ERC721InvalidOperator(address operator);
}

/// Decodes ERC-721 token reverts, modern and legacy.
#[derive(Debug, Default, Clone)]
pub struct Erc721RevertDecoder;

impl Erc721RevertDecoder {
	pub fn new() -> Self {
		Self
	}
}

impl RevertDecoder for Erc721RevertDecoder {
	fn decode(&self, data: &[u8]) -> Option<RevertFault> {
		if data.len() < 4 {
			return None;
		}
		if let Ok(e) = ERC721NonexistentToken::abi_decode(data) {
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::Erc721NonexistentToken {
					token_id: Some(e.tokenId),
				},
			));
		}
		if let Ok(e) = ERC721IncorrectOwner::abi_decode(data) {
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::Erc721IncorrectOwner {
					sender: Some(e.sender),
					token_id: Some(e.tokenId),
					owner: Some(e.owner),
				},
			));
		}
		if let Ok(e) = ERC721InsufficientApproval::abi_decode(data) {
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::Erc721InsufficientApproval {
					operator: Some(e.operator),
					token_id: Some(e.tokenId),
				},
			));
		}
		if let Ok(e) = ERC721InvalidOwner::abi_decode(data) {
			return Some(custom(data, "ERC721InvalidOwner", format!("invalid owner {}", e.owner)));
		}
		if let Ok(e) = ERC721InvalidSender::abi_decode(data) {
			return Some(custom(data, "ERC721InvalidSender", format!("invalid sender {}", e.sender)));
		}
		if let Ok(e) = ERC721InvalidReceiver::abi_decode(data) {
			return Some(custom(
				data,
				"ERC721InvalidReceiver",
				format!("invalid receiver {}", e.receiver),
			));
		}
		if let Ok(e) = ERC721InvalidApprover::abi_decode(data) {
			return Some(custom(
				data,
				"ERC721InvalidApprover",
				format!("invalid approver {}", e.approver),
			));
		}
		if let Ok(e) = ERC721InvalidOperator::abi_decode(data) {
			return Some(custom(
				data,
				"ERC721InvalidOperator",
				format!("invalid operator {}", e.operator),
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

fn legacy_kind(reason: &str) -> Option<RevertKind> {
	if !reason.starts_with("ERC721:") {
		return None;
	}
	if reason.contains("invalid token ID") || reason.contains("nonexistent token") {
		return Some(RevertKind::Erc721NonexistentToken { token_id: None });
	}
	if reason.contains("not token owner or approved") || reason.contains("not owner nor approved")
	{
		return Some(RevertKind::Erc721InsufficientApproval {
			operator: None,
			token_id: None,
		});
	}
	if reason.contains("incorrect owner") {
		return Some(RevertKind::Erc721IncorrectOwner {
			sender: None,
			token_id: None,
			owner: None,
		});
	}
	None
}
