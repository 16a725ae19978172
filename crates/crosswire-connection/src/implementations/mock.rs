//! In-memory mock implementation of the [`Connection`] trait.
//!
//! Tests stage results per function name and the mock hands them back in
//! FIFO order. Every network-shaped method bumps an RPC call counter so
//! tests can assert how many round trips an operation cost, including
//! the zero-round-trip case.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, B256};
use async_trait::async_trait;
use crosswire_types::{
	CallOutcome, ChainMetadata, ContractCall, Fault, FeeEstimate, TransactionReceipt,
};

use crate::{Connection, EstimateRequest};

struct MockState {
	reads: HashMap<String, VecDeque<Result<DynSolValue, Fault>>>,
	simulations: HashMap<String, VecDeque<Result<DynSolValue, Fault>>>,
	multicalls: VecDeque<Result<Vec<CallOutcome>, Fault>>,
	gas_estimate: u64,
	fees: FeeEstimate,
	nonce: u64,
	receipt: Option<TransactionReceipt>,
	sent: Vec<Bytes>,
}

impl Default for MockState {
	fn default() -> Self {
		Self {
			reads: HashMap::new(),
			simulations: HashMap::new(),
			multicalls: VecDeque::new(),
			gas_estimate: 50_000,
			fees: FeeEstimate {
				max_fee_per_gas: 2_000_000_000,
				max_priority_fee_per_gas: 1_000_000_000,
			},
			nonce: 0,
			receipt: None,
			sent: Vec::new(),
		}
	}
}

/// Connection double whose responses are staged by the test.
pub struct MockConnection {
	metadata: ChainMetadata,
	state: Mutex<MockState>,
	rpc_calls: AtomicUsize,
}

impl MockConnection {
	/// A mock chain without a multicall aggregator.
	pub fn new(chain_id: u64) -> Self {
		Self::with_metadata(ChainMetadata {
			chain_id,
			name: format!("mock-{chain_id}"),
			rpc_url: "http://localhost:0".to_string(),
			multicall_address: None,
		})
	}

	/// A mock chain that reports multicall support.
	pub fn with_multicall(chain_id: u64) -> Self {
		let mut connection = Self::new(chain_id);
		connection.metadata.multicall_address = Some(Address::repeat_byte(0xca));
		connection
	}

	pub fn with_metadata(metadata: ChainMetadata) -> Self {
		Self {
			metadata,
			state: Mutex::new(MockState::default()),
			rpc_calls: AtomicUsize::new(0),
		}
	}

	/// Queues the next result for a single read of `function`.
	pub fn stage_read(&self, function: &str, result: Result<DynSolValue, Fault>) {
		self.lock()
			.reads
			.entry(function.to_string())
			.or_default()
			.push_back(result);
	}

	/// Queues the next result for a simulation of `function`.
	pub fn stage_simulation(&self, function: &str, result: Result<DynSolValue, Fault>) {
		self.lock()
			.simulations
			.entry(function.to_string())
			.or_default()
			.push_back(result);
	}

	/// Queues the next multicall result.
	pub fn stage_multicall(&self, result: Result<Vec<CallOutcome>, Fault>) {
		self.lock().multicalls.push_back(result);
	}

	pub fn set_gas_estimate(&self, gas: u64) {
		self.lock().gas_estimate = gas;
	}

	pub fn set_fees(&self, fees: FeeEstimate) {
		self.lock().fees = fees;
	}

	pub fn set_transaction_count(&self, nonce: u64) {
		self.lock().nonce = nonce;
	}

	pub fn set_receipt(&self, receipt: TransactionReceipt) {
		self.lock().receipt = Some(receipt);
	}

	/// Raw transaction payloads passed to [`Connection::send_raw_transaction`].
	pub fn sent_transactions(&self) -> Vec<Bytes> {
		self.lock().sent.clone()
	}

	/// Total RPC round trips this connection has served.
	pub fn rpc_call_count(&self) -> usize {
		self.rpc_calls.load(Ordering::SeqCst)
	}

	fn record_call(&self) {
		self.rpc_calls.fetch_add(1, Ordering::SeqCst);
	}

	fn lock(&self) -> MutexGuard<'_, MockState> {
		self.state
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[async_trait]
impl Connection for MockConnection {
	fn metadata(&self) -> &ChainMetadata {
		&self.metadata
	}

	async fn read_contract(
		&self,
		_abi: &JsonAbi,
		call: &ContractCall,
	) -> Result<DynSolValue, Fault> {
		self.record_call();
		self.lock()
			.reads
			.get_mut(&call.function)
			.and_then(VecDeque::pop_front)
			.unwrap_or_else(|| {
				Err(Fault::rpc(format!(
					"no staged read result for '{}'",
					call.function
				)))
			})
	}

	async fn multicall(
		&self,
		_abi: &JsonAbi,
		_calls: &[ContractCall],
		_allow_failure: bool,
		_batch_size: usize,
	) -> Result<Vec<CallOutcome>, Fault> {
		self.record_call();
		self.lock()
			.multicalls
			.pop_front()
			.unwrap_or_else(|| Err(Fault::rpc("no staged multicall result")))
	}

	async fn simulate_contract(
		&self,
		_abi: &JsonAbi,
		call: &ContractCall,
		_from: Option<Address>,
	) -> Result<DynSolValue, Fault> {
		self.record_call();
		self.lock()
			.simulations
			.get_mut(&call.function)
			.and_then(VecDeque::pop_front)
			.unwrap_or_else(|| {
				Err(Fault::rpc(format!(
					"no staged simulation result for '{}'",
					call.function
				)))
			})
	}

	async fn estimate_gas(&self, _request: &EstimateRequest) -> Result<u64, Fault> {
		self.record_call();
		Ok(self.lock().gas_estimate)
	}

	async fn estimate_fees_per_gas(&self) -> Result<FeeEstimate, Fault> {
		self.record_call();
		Ok(self.lock().fees)
	}

	async fn transaction_count(&self, _address: Address) -> Result<u64, Fault> {
		self.record_call();
		Ok(self.lock().nonce)
	}

	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, Fault> {
		self.record_call();
		let hash = keccak256(raw);
		self.lock().sent.push(Bytes::copy_from_slice(raw));
		Ok(hash)
	}

	async fn wait_for_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<TransactionReceipt, Fault> {
		self.record_call();
		let staged = self.lock().receipt.clone();
		Ok(staged.unwrap_or(TransactionReceipt {
			transaction_hash: hash,
			block_number: 1,
			success: true,
		}))
	}
}
