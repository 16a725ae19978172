//! Write-pipeline transaction artifacts.
//!
//! The write lifecycle is linear: a [`PreparedTransaction`] comes out of
//! simulation and estimation, a [`SignedTransaction`] out of signing, and
//! a [`TransactionReceipt`] out of the confirmation wait. Prepared and
//! signed artifacts record the chain ID they were built for; clients
//! re-check it at every seam.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// EIP-1559 fee parameters fetched during prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
	pub max_fee_per_gas: u128,
	pub max_priority_fee_per_gas: u128,
}

/// Fully assembled EIP-1559 transaction request, ready for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
	pub to: Address,
	pub input: Bytes,
	pub value: U256,
	pub nonce: u64,
	pub gas_limit: u64,
	pub max_fee_per_gas: u128,
	pub max_priority_fee_per_gas: u128,
	pub chain_id: u64,
}

/// Output of the prepare step: simulated, estimated, and assembled, but
/// not yet signed. Immutable; consumed exactly once by sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedTransaction {
	pub payload: TransactionPayload,
}

impl PreparedTransaction {
	pub fn new(payload: TransactionPayload) -> Self {
		Self { payload }
	}

	/// The chain this transaction was prepared for.
	pub fn chain_id(&self) -> u64 {
		self.payload.chain_id
	}

	/// The gas estimate produced during prepare.
	pub fn gas_limit(&self) -> u64 {
		self.payload.gas_limit
	}
}

/// Serialized, signed transaction bytes bound to a chain.
///
/// May be persisted or transmitted between processes; the chain ID is
/// re-checked against the sending client before broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
	pub raw: Bytes,
	pub chain_id: u64,
}

impl SignedTransaction {
	pub fn new(raw: impl Into<Bytes>, chain_id: u64) -> Self {
		Self {
			raw: raw.into(),
			chain_id,
		}
	}
}

/// Transaction receipt containing execution details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub transaction_hash: B256,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}
