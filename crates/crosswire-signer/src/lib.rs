//! Transaction signing boundary.
//!
//! The write pipeline hands a fully assembled [`TransactionPayload`] to a
//! [`Signer`] and gets back EIP-2718 encoded raw bytes, ready for
//! broadcast. Key handling stays behind this trait so clients never see
//! private key material.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use crosswire_types::{Fault, TransactionPayload};

pub mod implementations {
	pub mod local;
}

pub use implementations::local::LocalSigner;

/// Trait defining the interface for transaction signers.
#[async_trait]
pub trait Signer: Send + Sync {
	/// The address transactions are signed for.
	fn address(&self) -> Address;

	/// Signs the payload as an EIP-1559 transaction and returns the
	/// EIP-2718 encoded envelope bytes.
	async fn sign_transaction(&self, payload: &TransactionPayload) -> Result<Bytes, Fault>;
}
