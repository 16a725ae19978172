//! Call, outcome, and batch-result value types.
//!
//! These are pure values: a [`ContractCall`] names what to read, a
//! [`CallOutcome`] is the per-call result inside a batch, and the batch
//! result types keep outcomes positionally aligned with the input call
//! order.

use crate::fault::Fault;
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use std::collections::HashMap;

/// One contract read: target address, function name, arguments.
#[derive(Debug, Clone)]
pub struct ContractCall {
	pub address: Address,
	pub function: String,
	pub args: Vec<DynSolValue>,
}

impl ContractCall {
	pub fn new(address: Address, function: impl Into<String>, args: Vec<DynSolValue>) -> Self {
		Self {
			address,
			function: function.into(),
			args,
		}
	}
}

/// A [`ContractCall`] routed to a specific chain, for cross-chain batches.
#[derive(Debug, Clone)]
pub struct ChainCall {
	pub chain_id: u64,
	pub call: ContractCall,
}

impl ChainCall {
	pub fn new(chain_id: u64, call: ContractCall) -> Self {
		Self { chain_id, call }
	}
}

/// Per-call result inside a batch. Exactly one variant is populated;
/// failures are data here, never thrown.
#[derive(Debug, Clone)]
pub enum CallOutcome {
	Success { value: DynSolValue },
	Failure { error: Fault },
}

impl CallOutcome {
	pub fn success(value: DynSolValue) -> Self {
		CallOutcome::Success { value }
	}

	pub fn failure(error: Fault) -> Self {
		CallOutcome::Failure { error }
	}

	pub fn is_success(&self) -> bool {
		matches!(self, CallOutcome::Success { .. })
	}

	pub fn value(&self) -> Option<&DynSolValue> {
		match self {
			CallOutcome::Success { value } => Some(value),
			CallOutcome::Failure { .. } => None,
		}
	}

	pub fn error(&self) -> Option<&Fault> {
		match self {
			CallOutcome::Success { .. } => None,
			CallOutcome::Failure { error } => Some(error),
		}
	}

	/// Converts the outcome into a `Result`, consuming it.
	pub fn into_result(self) -> Result<DynSolValue, Fault> {
		match self {
			CallOutcome::Success { value } => Ok(value),
			CallOutcome::Failure { error } => Err(error),
		}
	}
}

/// Result of one chain's batched read. `outcomes[i]` corresponds to the
/// i-th input call for that chain regardless of completion order.
#[derive(Debug, Clone)]
pub struct BatchResult {
	pub chain_id: u64,
	pub outcomes: Vec<CallOutcome>,
}

impl BatchResult {
	pub fn new(chain_id: u64, outcomes: Vec<CallOutcome>) -> Self {
		Self { chain_id, outcomes }
	}

	pub fn empty(chain_id: u64) -> Self {
		Self::new(chain_id, Vec::new())
	}

	pub fn len(&self) -> usize {
		self.outcomes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.outcomes.is_empty()
	}
}

/// A chain whose whole batch failed, with the fault that sank it.
#[derive(Debug, Clone)]
pub struct ChainFailure {
	pub chain_id: u64,
	pub error: Fault,
}

/// Aggregate of a cross-chain batched read. A chain appears in exactly
/// one of the two collections, never both.
#[derive(Debug, Clone, Default)]
pub struct CrossChainBatchResult {
	/// Batch results for chains whose dispatch succeeded as a whole.
	pub results_by_chain: HashMap<u64, BatchResult>,
	/// Chains whose batch failed outright, in dispatch order.
	pub failed_chains: Vec<ChainFailure>,
}

impl CrossChainBatchResult {
	pub fn is_empty(&self) -> bool {
		self.results_by_chain.is_empty() && self.failed_chains.is_empty()
	}

	pub fn chain_result(&self, chain_id: u64) -> Option<&BatchResult> {
		self.results_by_chain.get(&chain_id)
	}
}
