//! In-process signer backed by a local private key.

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSigner;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use crosswire_types::{utils::without_0x_prefix, Fault, TransactionPayload};

use crate::Signer;

/// Signer holding a secp256k1 key in memory.
pub struct LocalSigner {
	signer: PrivateKeySigner,
}

impl LocalSigner {
	pub fn new(signer: PrivateKeySigner) -> Self {
		Self { signer }
	}

	/// Parses a hex-encoded private key, with or without a "0x" prefix.
	pub fn from_hex_key(key: &str) -> Result<Self, Fault> {
		let signer = without_0x_prefix(key)
			.parse::<PrivateKeySigner>()
			.map_err(|e| Fault::Signing {
				message: format!("invalid private key: {}", e),
			})?;
		Ok(Self::new(signer))
	}
}

#[async_trait]
impl Signer for LocalSigner {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_transaction(&self, payload: &TransactionPayload) -> Result<Bytes, Fault> {
		let mut tx = TxEip1559 {
			chain_id: payload.chain_id,
			nonce: payload.nonce,
			gas_limit: payload.gas_limit,
			max_fee_per_gas: payload.max_fee_per_gas,
			max_priority_fee_per_gas: payload.max_priority_fee_per_gas,
			to: TxKind::Call(payload.to),
			value: payload.value,
			access_list: Default::default(),
			input: payload.input.clone(),
		};

		let signature = self
			.signer
			.sign_transaction(&mut tx)
			.await
			.map_err(|e| Fault::Signing {
				message: format!("signing failed: {}", e),
			})?;

		let envelope = TxEnvelope::Eip1559(tx.into_signed(signature));
		let mut raw = Vec::with_capacity(envelope.encode_2718_len());
		envelope.encode_2718(&mut raw);
		Ok(Bytes::from(raw))
	}
}
