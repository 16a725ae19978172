//! RPC connection boundary for the crosswire multichain client.
//!
//! This module defines the [`Connection`] trait consumed by the contract
//! clients: single reads, multicall-batched reads, call simulation, gas
//! and fee estimation, nonce queries, raw-transaction broadcast, and the
//! receipt wait. One connection serves exactly one chain.

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use crosswire_types::{
	CallOutcome, ChainMetadata, ContractCall, Fault, FeeEstimate, TransactionReceipt,
};

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod mock;
}

pub use implementations::http::HttpConnection;
pub use implementations::mock::MockConnection;

/// Number of calls folded into one aggregate3 request when no explicit
/// batch size is configured.
pub const DEFAULT_MULTICALL_BATCH_SIZE: usize = 512;

/// A call shape used for gas estimation and simulation.
#[derive(Debug, Clone)]
pub struct EstimateRequest {
	pub from: Option<Address>,
	pub to: Address,
	pub input: Bytes,
}

/// Trait defining the interface for per-chain RPC connections.
///
/// This trait must be implemented by any transport that wants to serve
/// the contract clients. ABI encoding and decoding of call data is the
/// implementation's concern; callers hand over the ABI and a
/// [`ContractCall`] value.
#[async_trait]
pub trait Connection: Send + Sync {
	/// Metadata for the chain this connection serves.
	fn metadata(&self) -> &ChainMetadata;

	/// The chain ID this connection serves.
	fn chain_id(&self) -> u64 {
		self.metadata().chain_id
	}

	/// True iff the chain metadata declares a multicall contract address.
	fn supports_multicall(&self) -> bool {
		self.metadata().multicall_address.is_some()
	}

	/// Executes a single read-only contract call and decodes the result.
	async fn read_contract(
		&self,
		abi: &JsonAbi,
		call: &ContractCall,
	) -> Result<DynSolValue, Fault>;

	/// Executes many read-only calls through the chain's multicall
	/// aggregator, chunked at `batch_size` calls per request.
	///
	/// With `allow_failure`, individual reverting calls come back as
	/// [`CallOutcome::Failure`] without sinking the others. An `Err`
	/// return means the aggregate request itself failed and no per-call
	/// results exist.
	async fn multicall(
		&self,
		abi: &JsonAbi,
		calls: &[ContractCall],
		allow_failure: bool,
		batch_size: usize,
	) -> Result<Vec<CallOutcome>, Fault>;

	/// Simulates a state-changing call without broadcasting it, surfacing
	/// reverts before any gas is spent.
	async fn simulate_contract(
		&self,
		abi: &JsonAbi,
		call: &ContractCall,
		from: Option<Address>,
	) -> Result<DynSolValue, Fault>;

	/// Estimates the gas required by the given call.
	async fn estimate_gas(&self, request: &EstimateRequest) -> Result<u64, Fault>;

	/// Fetches current EIP-1559 fee parameters.
	async fn estimate_fees_per_gas(&self) -> Result<FeeEstimate, Fault>;

	/// Fetches the next valid nonce for an address.
	async fn transaction_count(&self, address: Address) -> Result<u64, Fault>;

	/// Broadcasts raw signed transaction bytes, returning the hash.
	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, Fault>;

	/// Blocks until the transaction is mined, returning its receipt.
	async fn wait_for_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<TransactionReceipt, Fault>;
}
