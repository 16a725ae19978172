//! Revert-data decoding for failed contract calls.
//!
//! Raw revert bytes pass through a chain of [`RevertDecoder`]s; the
//! first decoder that recognizes the data produces a typed
//! [`RevertFault`]. Undecodable data always falls back to a generic
//! fault that preserves the raw bytes untouched, so no revert is ever
//! swallowed.

use std::sync::Arc;

use crosswire_types::{RevertFault, RevertKind};

pub mod implementations {
	pub mod abi;
	pub mod erc20;
	pub mod erc721;
	pub mod strings;
}

pub use implementations::abi::AbiErrorDecoder;
pub use implementations::erc20::Erc20RevertDecoder;
pub use implementations::erc721::Erc721RevertDecoder;
pub use implementations::strings::StringRevertDecoder;

/// Trait defining one link in the revert-decoding chain.
///
/// Implementations return `None` for data they do not recognize so the
/// next decoder gets its turn.
pub trait RevertDecoder: Send + Sync {
	fn decode(&self, data: &[u8]) -> Option<RevertFault>;
}

/// Runs a list of decoders in order and takes the first hit.
#[derive(Clone)]
pub struct CompositeDecoder {
	decoders: Vec<Arc<dyn RevertDecoder>>,
}

impl CompositeDecoder {
	pub fn new(decoders: Vec<Arc<dyn RevertDecoder>>) -> Self {
		Self { decoders }
	}

	/// The default chain: ERC-20 errors, ERC-721 errors, then plain
	/// string reverts and panics.
	pub fn standard() -> Self {
		Self::new(vec![
			Arc::new(Erc20RevertDecoder::new()),
			Arc::new(Erc721RevertDecoder::new()),
			Arc::new(StringRevertDecoder::new()),
		])
	}

	/// Returns a copy of this chain with one more decoder tried first.
	pub fn with_leading_decoder(&self, decoder: Arc<dyn RevertDecoder>) -> Self {
		let mut decoders = Vec::with_capacity(self.decoders.len() + 1);
		decoders.push(decoder);
		decoders.extend(self.decoders.iter().cloned());
		Self::new(decoders)
	}

	/// Decodes the data or wraps it in a generic fault carrying the raw
	/// bytes unchanged.
	pub fn decode_or_generic(&self, data: &[u8]) -> RevertFault {
		if let Some(fault) = self.decode(data) {
			return fault;
		}
		tracing::trace!(len = data.len(), "revert data matched no decoder");
		RevertFault::generic(data.to_vec())
	}
}

impl RevertDecoder for CompositeDecoder {
	fn decode(&self, data: &[u8]) -> Option<RevertFault> {
		self.decoders.iter().find_map(|decoder| decoder.decode(data))
	}
}
