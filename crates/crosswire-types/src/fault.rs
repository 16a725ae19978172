//! Structured fault hierarchy for the crosswire workspace.
//!
//! Every error surfaced by the library is a [`Fault`]: one tagged-variant
//! type carrying a human-readable message, optional structured detail
//! lines, and an optional underlying cause. Causes form a linked chain
//! that can be walked to find the deepest failure or the first one
//! matching a predicate.

use crate::revert::RevertFault;
use alloy::primitives::Bytes;
use thiserror::Error;

/// Uniform error representation for all crosswire operations.
///
/// Per-call failures inside a batch are carried as data
/// ([`crate::CallOutcome::Failure`]); everything that aborts an operation
/// is returned as a `Fault`.
#[derive(Debug, Clone, Error)]
pub enum Fault {
	/// A chain was requested that is not present in the registry.
	#[error("chain {chain_id} is not configured")]
	UnsupportedChain {
		/// The chain ID that was requested.
		chain_id: u64,
		/// Every chain ID the registry holds, in insertion order.
		available_chain_ids: Vec<u64>,
	},

	/// The same chain ID was supplied twice during construction or extension.
	#[error("chain {chain_id} is already registered")]
	DuplicateChain { chain_id: u64 },

	/// A required builder field was not provided.
	#[error("missing required field `{field}`")]
	MissingField { field: &'static str },

	/// An RPC request failed at the transport level.
	#[error("RPC request failed: {message}")]
	Rpc {
		message: String,
		#[source]
		cause: Option<Box<Fault>>,
	},

	/// Returned data could not be decoded against the ABI.
	#[error("ABI decoding failed: {message}")]
	Decode { message: String },

	/// The multicall request itself was rejected before any per-call
	/// result existed. This is a whole-batch failure, never a per-call one.
	#[error("multicall batch of {batch_size} calls failed on chain {chain_id}")]
	MulticallBatchFailure {
		chain_id: u64,
		batch_size: usize,
		#[source]
		cause: Box<Fault>,
	},

	/// A write operation was attempted on a client with no bound signer.
	#[error("signer required for write operations")]
	MissingSigner,

	/// A prepared or signed payload was handed to a client bound to a
	/// different chain.
	#[error("chain ID {actual} does not match client chain ID {expected}")]
	ChainIdMismatch { expected: u64, actual: u64 },

	/// The signer failed to produce a signature.
	#[error("signing failed: {message}")]
	Signing { message: String },

	/// A contract call reverted. Carries the raw revert bytes and, when
	/// the decoder chain recognized them, a structured decoded fault.
	#[error("{0}")]
	Revert(RevertFault),
}

impl Fault {
	/// Wraps a transport-level error message as an RPC fault.
	pub fn rpc(message: impl Into<String>) -> Self {
		Fault::Rpc {
			message: message.into(),
			cause: None,
		}
	}

	/// Wraps a transport-level error with an underlying cause.
	pub fn rpc_caused(message: impl Into<String>, cause: Fault) -> Self {
		Fault::Rpc {
			message: message.into(),
			cause: Some(Box::new(cause)),
		}
	}

	/// Returns the direct cause of this fault, if any.
	pub fn cause(&self) -> Option<&Fault> {
		match self {
			Fault::Rpc { cause, .. } => cause.as_deref(),
			Fault::MulticallBatchFailure { cause, .. } => Some(cause),
			_ => None,
		}
	}

	/// Iterates the cause chain starting from this fault itself.
	pub fn cause_chain(&self) -> CauseChain<'_> {
		CauseChain {
			current: Some(self),
		}
	}

	/// Returns the deepest fault in the cause chain (this fault when it
	/// has no cause).
	pub fn deepest_cause(&self) -> &Fault {
		let mut current = self;
		while let Some(next) = current.cause() {
			current = next;
		}
		current
	}

	/// Returns the first fault in the chain matching the predicate,
	/// starting from this fault itself.
	pub fn find_cause(&self, predicate: impl Fn(&Fault) -> bool) -> Option<&Fault> {
		self.cause_chain().find(|fault| predicate(fault))
	}

	/// Returns the raw revert bytes when this fault is a contract revert.
	pub fn revert_data(&self) -> Option<&Bytes> {
		match self {
			Fault::Revert(revert) => Some(&revert.raw),
			_ => None,
		}
	}

	/// Structured detail lines for logging, e.g. `Chain ID: 10`.
	///
	/// Every line is already formatted; callers can log the fault message
	/// followed by these lines without extra formatting work.
	pub fn details(&self) -> Vec<String> {
		match self {
			Fault::UnsupportedChain {
				chain_id,
				available_chain_ids,
			} => vec![
				format!("Chain ID: {chain_id}"),
				format!("Available chain IDs: {}", join_ids(available_chain_ids)),
			],
			Fault::DuplicateChain { chain_id } => vec![format!("Chain ID: {chain_id}")],
			Fault::MulticallBatchFailure {
				chain_id,
				batch_size,
				..
			} => vec![
				format!("Chain ID: {chain_id}"),
				format!("Batch size: {batch_size}"),
			],
			Fault::ChainIdMismatch { expected, actual } => vec![
				format!("Expected chain ID: {expected}"),
				format!("Actual chain ID: {actual}"),
			],
			Fault::Revert(revert) => revert.detail_lines(),
			_ => Vec::new(),
		}
	}
}

fn join_ids(ids: &[u64]) -> String {
	ids.iter()
		.map(|id| id.to_string())
		.collect::<Vec<_>>()
		.join(", ")
}

/// Iterator over a fault's cause chain, beginning with the fault itself.
pub struct CauseChain<'a> {
	current: Option<&'a Fault>,
}

impl<'a> Iterator for CauseChain<'a> {
	type Item = &'a Fault;

	fn next(&mut self) -> Option<Self::Item> {
		let fault = self.current?;
		self.current = fault.cause();
		Some(fault)
	}
}
