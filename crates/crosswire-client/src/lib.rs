//! Per-chain contract client.
//!
//! A [`ContractClient`] binds one connection, one ABI, and optionally a
//! signer and a revert-decoder chain. Reads go through
//! [`ContractClient::read`] and [`ContractClient::read_batch`]; writes
//! walk the linear pipeline prepare, sign, send, wait, each step
//! re-checking the chain ID carried by the artifact it consumes.
//!
//! Batched reads prefer the chain's multicall aggregator when the
//! metadata declares one. On the multicall path a failed aggregate
//! request fails the whole batch; on the sequential fallback each call
//! fails alone and the batch itself always succeeds.

use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, B256, U256};
use crosswire_connection::{Connection, EstimateRequest, DEFAULT_MULTICALL_BATCH_SIZE};
use crosswire_decoder::CompositeDecoder;
use crosswire_signer::Signer;
use crosswire_types::abi::{encode_call_data, resolve_function};
use crosswire_types::{
	CallOutcome, ContractCall, Fault, PreparedTransaction, SignedTransaction, TransactionPayload,
	TransactionReceipt,
};
use futures::future::join_all;

/// Optional pieces shared by every client a facade hands out.
#[derive(Clone, Default)]
pub struct ClientOptions {
	pub signer: Option<Arc<dyn Signer>>,
	pub decoder: Option<CompositeDecoder>,
	/// `None` uses [`DEFAULT_MULTICALL_BATCH_SIZE`]; zero forces the
	/// sequential read path even on multicall-capable chains.
	pub multicall_batch_size: Option<usize>,
}

/// Knobs for [`ContractClient::execute`].
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
	pub wait_for_receipt: bool,
	pub value: U256,
}

impl Default for ExecuteOptions {
	fn default() -> Self {
		Self {
			wait_for_receipt: true,
			value: U256::ZERO,
		}
	}
}

/// Result of [`ContractClient::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
	/// Broadcast without waiting for inclusion.
	Submitted(B256),
	/// Broadcast and mined.
	Confirmed(TransactionReceipt),
}

/// Client for one contract ABI on one chain.
#[derive(Clone)]
pub struct ContractClient {
	connection: Arc<dyn Connection>,
	abi: Arc<JsonAbi>,
	signer: Option<Arc<dyn Signer>>,
	decoder: CompositeDecoder,
	multicall_batch_size: Option<usize>,
}

impl ContractClient {
	pub fn builder() -> ContractClientBuilder {
		ContractClientBuilder::default()
	}

	pub fn new(connection: Arc<dyn Connection>, abi: Arc<JsonAbi>) -> Self {
		Self {
			connection,
			abi,
			signer: None,
			decoder: CompositeDecoder::standard(),
			multicall_batch_size: None,
		}
	}

	pub fn from_options(
		connection: Arc<dyn Connection>,
		abi: Arc<JsonAbi>,
		options: &ClientOptions,
	) -> Self {
		Self {
			connection,
			abi,
			signer: options.signer.clone(),
			decoder: options
				.decoder
				.clone()
				.unwrap_or_else(CompositeDecoder::standard),
			multicall_batch_size: options.multicall_batch_size,
		}
	}

	pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
		self.signer = Some(signer);
		self
	}

	pub fn with_decoder(mut self, decoder: CompositeDecoder) -> Self {
		self.decoder = decoder;
		self
	}

	pub fn with_multicall_batch_size(mut self, batch_size: usize) -> Self {
		self.multicall_batch_size = Some(batch_size);
		self
	}

	pub fn chain_id(&self) -> u64 {
		self.connection.chain_id()
	}

	pub fn abi(&self) -> &Arc<JsonAbi> {
		&self.abi
	}

	pub fn has_signer(&self) -> bool {
		self.signer.is_some()
	}

	pub fn signer_address(&self) -> Option<Address> {
		self.signer.as_ref().map(|signer| signer.address())
	}

	/// Executes a single read-only call.
	pub async fn read(&self, call: &ContractCall) -> Result<DynSolValue, Fault> {
		self.connection
			.read_contract(&self.abi, call)
			.await
			.map_err(|fault| self.enrich(fault))
	}

	/// Executes a batch of read-only calls, returning one outcome per
	/// call in input order.
	///
	/// An empty batch returns immediately without touching the network.
	/// On multicall-capable chains the calls go through the aggregator
	/// and a failed aggregate request surfaces as
	/// [`Fault::MulticallBatchFailure`]. Without an aggregator each call
	/// runs on its own and failures stay confined to their slot.
	pub async fn read_batch(&self, calls: &[ContractCall]) -> Result<Vec<CallOutcome>, Fault> {
		if calls.is_empty() {
			return Ok(Vec::new());
		}

		let use_multicall =
			self.connection.supports_multicall() && self.multicall_batch_size != Some(0);
		if use_multicall {
			let batch_size = self
				.multicall_batch_size
				.unwrap_or(DEFAULT_MULTICALL_BATCH_SIZE);
			tracing::debug!(
				chain_id = self.chain_id(),
				calls = calls.len(),
				batch_size,
				"batched read via multicall"
			);
			let outcomes = self
				.connection
				.multicall(&self.abi, calls, true, batch_size)
				.await
				.map_err(|cause| Fault::MulticallBatchFailure {
					chain_id: self.chain_id(),
					batch_size: calls.len(),
					cause: Box::new(cause),
				})?;
			return Ok(outcomes
				.into_iter()
				.map(|outcome| self.enrich_outcome(outcome))
				.collect());
		}

		tracing::debug!(
			chain_id = self.chain_id(),
			calls = calls.len(),
			"batched read via per-call fallback"
		);
		let reads = calls.iter().map(|call| async move {
			match self.connection.read_contract(&self.abi, call).await {
				Ok(value) => CallOutcome::success(value),
				Err(fault) => CallOutcome::failure(self.enrich(fault)),
			}
		});
		Ok(join_all(reads).await)
	}

	/// Simulates the call, then assembles a transaction with estimated
	/// gas, current fees, and the signer's next nonce.
	///
	/// Simulation runs first so a revert costs nothing; the three
	/// estimation queries then run concurrently and fail fast.
	pub async fn prepare(&self, call: &ContractCall) -> Result<PreparedTransaction, Fault> {
		self.prepare_with_value(call, U256::ZERO).await
	}

	pub async fn prepare_with_value(
		&self,
		call: &ContractCall,
		value: U256,
	) -> Result<PreparedTransaction, Fault> {
		let signer = self.require_signer()?;
		let from = signer.address();

		self.connection
			.simulate_contract(&self.abi, call, Some(from))
			.await
			.map_err(|fault| self.enrich(fault))?;

		let function = resolve_function(&self.abi, call)?;
		let input = encode_call_data(function, call)?;
		let request = EstimateRequest {
			from: Some(from),
			to: call.address,
			input: input.clone(),
		};

		let (gas_limit, fees, nonce) = tokio::try_join!(
			self.connection.estimate_gas(&request),
			self.connection.estimate_fees_per_gas(),
			self.connection.transaction_count(from),
		)?;

		Ok(PreparedTransaction::new(TransactionPayload {
			to: call.address,
			input,
			value,
			nonce,
			gas_limit,
			max_fee_per_gas: fees.max_fee_per_gas,
			max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
			chain_id: self.chain_id(),
		}))
	}

	/// Signs a prepared transaction after re-checking its chain ID.
	pub async fn sign(&self, prepared: &PreparedTransaction) -> Result<SignedTransaction, Fault> {
		let signer = self.require_signer()?;
		self.check_chain(prepared.chain_id())?;
		let raw = signer.sign_transaction(&prepared.payload).await?;
		Ok(SignedTransaction::new(raw, prepared.chain_id()))
	}

	/// Broadcasts a signed transaction. The chain ID check runs before
	/// anything reaches the network.
	pub async fn send(&self, signed: &SignedTransaction) -> Result<B256, Fault> {
		self.check_chain(signed.chain_id)?;
		self.connection.send_raw_transaction(&signed.raw).await
	}

	/// Blocks until the transaction is mined.
	pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, Fault> {
		self.connection.wait_for_transaction_receipt(hash).await
	}

	/// Runs the full write pipeline for one call.
	pub async fn execute(
		&self,
		call: &ContractCall,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		let prepared = self.prepare_with_value(call, options.value).await?;
		let signed = self.sign(&prepared).await?;
		let hash = self.send(&signed).await?;
		if options.wait_for_receipt {
			let receipt = self.wait_for_receipt(hash).await?;
			Ok(Execution::Confirmed(receipt))
		} else {
			Ok(Execution::Submitted(hash))
		}
	}

	fn require_signer(&self) -> Result<&Arc<dyn Signer>, Fault> {
		self.signer.as_ref().ok_or(Fault::MissingSigner)
	}

	fn check_chain(&self, actual: u64) -> Result<(), Fault> {
		let expected = self.chain_id();
		if actual != expected {
			return Err(Fault::ChainIdMismatch { expected, actual });
		}
		Ok(())
	}

	/// Re-runs undecoded revert data through the decoder chain.
	fn enrich(&self, fault: Fault) -> Fault {
		match fault {
			Fault::Revert(revert) if !revert.is_decoded() => {
				Fault::Revert(self.decoder.decode_or_generic(&revert.raw))
			}
			other => other,
		}
	}

	fn enrich_outcome(&self, outcome: CallOutcome) -> CallOutcome {
		match outcome {
			CallOutcome::Failure { error } => CallOutcome::failure(self.enrich(error)),
			success => success,
		}
	}
}

/// Builder for [`ContractClient`]. Connection and ABI are required;
/// everything else falls back to the [`ClientOptions`] defaults.
#[derive(Default)]
pub struct ContractClientBuilder {
	connection: Option<Arc<dyn Connection>>,
	abi: Option<Arc<JsonAbi>>,
	options: ClientOptions,
}

impl ContractClientBuilder {
	pub fn connection(mut self, connection: Arc<dyn Connection>) -> Self {
		self.connection = Some(connection);
		self
	}

	pub fn abi(mut self, abi: Arc<JsonAbi>) -> Self {
		self.abi = Some(abi);
		self
	}

	pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
		self.options.signer = Some(signer);
		self
	}

	pub fn decoder(mut self, decoder: CompositeDecoder) -> Self {
		self.options.decoder = Some(decoder);
		self
	}

	pub fn multicall_batch_size(mut self, batch_size: usize) -> Self {
		self.options.multicall_batch_size = Some(batch_size);
		self
	}

	pub fn build(self) -> Result<ContractClient, Fault> {
		let connection = self.connection.ok_or(Fault::MissingField {
			field: "connection",
		})?;
		let abi = self.abi.ok_or(Fault::MissingField { field: "abi" })?;
		Ok(ContractClient::from_options(connection, abi, &self.options))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::sol_types::{Revert, SolError};
	use crosswire_connection::MockConnection;
	use crosswire_signer::LocalSigner;
	use crosswire_types::{RevertFault, RevertKind};

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn erc20_abi() -> Arc<JsonAbi> {
		Arc::new(
			JsonAbi::parse([
				"function balanceOf(address owner) view returns (uint256)",
				"function transfer(address to, uint256 amount) returns (bool)",
			])
			.unwrap(),
		)
	}

	fn balance_call() -> ContractCall {
		ContractCall::new(
			Address::repeat_byte(0x11),
			"balanceOf",
			vec![DynSolValue::Address(Address::repeat_byte(0x22))],
		)
	}

	fn transfer_call() -> ContractCall {
		ContractCall::new(
			Address::repeat_byte(0x11),
			"transfer",
			vec![
				DynSolValue::Address(Address::repeat_byte(0x22)),
				DynSolValue::Uint(U256::from(100u64), 256),
			],
		)
	}

	fn uint(value: u64) -> DynSolValue {
		DynSolValue::Uint(U256::from(value), 256)
	}

	fn signer() -> Arc<dyn Signer> {
		Arc::new(LocalSigner::from_hex_key(TEST_KEY).unwrap())
	}

	#[test]
	fn builder_requires_connection_and_abi() {
		assert!(matches!(
			ContractClient::builder().abi(erc20_abi()).build(),
			Err(Fault::MissingField {
				field: "connection",
			})
		));

		let connection = Arc::new(MockConnection::new(1));
		assert!(matches!(
			ContractClient::builder()
				.connection(connection.clone())
				.build(),
			Err(Fault::MissingField { field: "abi" })
		));

		let client = ContractClient::builder()
			.connection(connection)
			.abi(erc20_abi())
			.signer(signer())
			.build()
			.unwrap();
		assert_eq!(client.chain_id(), 1);
		assert!(client.has_signer());
	}

	#[tokio::test]
	async fn empty_batch_makes_no_rpc_calls() {
		let connection = Arc::new(MockConnection::with_multicall(1));
		let client = ContractClient::new(connection.clone(), erc20_abi());

		let outcomes = client.read_batch(&[]).await.unwrap();
		assert!(outcomes.is_empty());
		assert_eq!(connection.rpc_call_count(), 0);
	}

	#[tokio::test]
	async fn multicall_outcomes_stay_positionally_aligned() {
		let connection = Arc::new(MockConnection::with_multicall(1));
		connection.stage_multicall(Ok(vec![
			CallOutcome::success(uint(100)),
			CallOutcome::failure(Fault::Revert(RevertFault::generic(
				Revert::from("ERC20: transfer amount exceeds balance").abi_encode(),
			))),
			CallOutcome::success(uint(300)),
		]));
		let client = ContractClient::new(connection.clone(), erc20_abi());

		let calls = vec![balance_call(), balance_call(), balance_call()];
		let outcomes = client.read_batch(&calls).await.unwrap();
		assert_eq!(outcomes.len(), 3);
		assert!(outcomes[0].is_success());
		assert!(!outcomes[1].is_success());
		assert!(outcomes[2].is_success());
		// one aggregate round trip for the whole batch
		assert_eq!(connection.rpc_call_count(), 1);

		// failure slots get decoded on the way out
		match outcomes[1].error() {
			Some(Fault::Revert(revert)) => {
				assert!(matches!(
					revert.kind,
					RevertKind::Erc20InsufficientBalance { .. }
				));
			}
			other => panic!("expected revert fault, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn failed_aggregate_reports_batch_failure() {
		let connection = Arc::new(MockConnection::with_multicall(10));
		connection.stage_multicall(Err(Fault::rpc("aggregate3 request failed")));
		let client = ContractClient::new(connection, erc20_abi());

		let calls = vec![balance_call(), balance_call()];
		let fault = client.read_batch(&calls).await.err().unwrap();
		match &fault {
			Fault::MulticallBatchFailure {
				chain_id,
				batch_size,
				..
			} => {
				assert_eq!(*chain_id, 10);
				assert_eq!(*batch_size, 2);
			}
			other => panic!("expected batch failure, got {other:?}"),
		}
		// the underlying RPC fault survives in the cause chain
		assert!(fault
			.cause_chain()
			.any(|cause| matches!(cause, Fault::Rpc { .. })));
	}

	#[tokio::test]
	async fn sequential_path_isolates_per_call_failures() {
		let connection = Arc::new(MockConnection::new(1));
		connection.stage_read("balanceOf", Ok(uint(100)));
		connection.stage_read("balanceOf", Err(Fault::rpc("node unavailable")));
		connection.stage_read("balanceOf", Ok(uint(300)));
		let client = ContractClient::new(connection.clone(), erc20_abi());

		let calls = vec![balance_call(), balance_call(), balance_call()];
		let outcomes = client.read_batch(&calls).await.unwrap();
		assert_eq!(outcomes.len(), 3);
		assert_eq!(outcomes[0].value().and_then(DynSolValue::as_uint), Some((U256::from(100u64), 256)));
		assert!(matches!(outcomes[1].error(), Some(Fault::Rpc { .. })));
		assert_eq!(outcomes[2].value().and_then(DynSolValue::as_uint), Some((U256::from(300u64), 256)));
		assert_eq!(connection.rpc_call_count(), 3);
	}

	#[tokio::test]
	async fn zero_batch_size_forces_sequential_reads() {
		// multicall-capable chain, but nothing is staged for multicall;
		// the batch still succeeds because reads go one by one
		let connection = Arc::new(MockConnection::with_multicall(1));
		connection.stage_read("balanceOf", Ok(uint(1)));
		connection.stage_read("balanceOf", Ok(uint(2)));
		let client =
			ContractClient::new(connection.clone(), erc20_abi()).with_multicall_batch_size(0);

		let outcomes = client
			.read_batch(&[balance_call(), balance_call()])
			.await
			.unwrap();
		assert!(outcomes.iter().all(CallOutcome::is_success));
		assert_eq!(connection.rpc_call_count(), 2);
	}

	#[tokio::test]
	async fn single_read_decodes_revert_data() {
		let connection = Arc::new(MockConnection::new(1));
		connection.stage_read(
			"balanceOf",
			Err(Fault::Revert(RevertFault::generic(
				Revert::from("ERC20: insufficient allowance").abi_encode(),
			))),
		);
		let client = ContractClient::new(connection, erc20_abi());

		let fault = client.read(&balance_call()).await.err().unwrap();
		match fault {
			Fault::Revert(revert) => assert!(matches!(
				revert.kind,
				RevertKind::Erc20InsufficientAllowance { .. }
			)),
			other => panic!("expected revert fault, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn prepare_assembles_the_payload() {
		let connection = Arc::new(MockConnection::new(10));
		connection.stage_simulation("transfer", Ok(DynSolValue::Bool(true)));
		connection.set_gas_estimate(60_000);
		connection.set_transaction_count(7);
		let client = ContractClient::new(connection, erc20_abi()).with_signer(signer());

		let prepared = client.prepare(&transfer_call()).await.unwrap();
		assert_eq!(prepared.chain_id(), 10);
		assert_eq!(prepared.gas_limit(), 60_000);
		assert_eq!(prepared.payload.nonce, 7);
		assert_eq!(prepared.payload.to, Address::repeat_byte(0x11));
		assert!(!prepared.payload.input.is_empty());
	}

	#[tokio::test]
	async fn prepare_without_signer_never_reaches_the_network() {
		let connection = Arc::new(MockConnection::new(1));
		let client = ContractClient::new(connection.clone(), erc20_abi());

		let result = client.prepare(&transfer_call()).await;
		assert!(matches!(result, Err(Fault::MissingSigner)));
		assert_eq!(connection.rpc_call_count(), 0);
	}

	#[tokio::test]
	async fn reverting_simulation_aborts_prepare() {
		let connection = Arc::new(MockConnection::new(1));
		connection.stage_simulation(
			"transfer",
			Err(Fault::Revert(RevertFault::generic(
				Revert::from("ERC20: transfer amount exceeds balance").abi_encode(),
			))),
		);
		let client = ContractClient::new(connection.clone(), erc20_abi()).with_signer(signer());

		let fault = client.prepare(&transfer_call()).await.err().unwrap();
		match fault {
			Fault::Revert(revert) => assert!(matches!(
				revert.kind,
				RevertKind::Erc20InsufficientBalance { .. }
			)),
			other => panic!("expected revert fault, got {other:?}"),
		}
		// simulation only; no estimation queries were made
		assert_eq!(connection.rpc_call_count(), 1);
	}

	#[tokio::test]
	async fn sign_rejects_foreign_chain_artifacts() {
		let connection = Arc::new(MockConnection::new(1));
		let client = ContractClient::new(connection, erc20_abi()).with_signer(signer());

		let prepared = PreparedTransaction::new(TransactionPayload {
			to: Address::repeat_byte(0x11),
			input: Default::default(),
			value: U256::ZERO,
			nonce: 0,
			gas_limit: 21_000,
			max_fee_per_gas: 1,
			max_priority_fee_per_gas: 1,
			chain_id: 999,
		});
		assert!(matches!(
			client.sign(&prepared).await,
			Err(Fault::ChainIdMismatch {
				expected: 1,
				actual: 999,
			})
		));
	}

	#[tokio::test]
	async fn send_checks_chain_before_any_network_effect() {
		let connection = Arc::new(MockConnection::new(1));
		let client = ContractClient::new(connection.clone(), erc20_abi());

		let signed = SignedTransaction::new(vec![0x02, 0x01], 999);
		assert!(matches!(
			client.send(&signed).await,
			Err(Fault::ChainIdMismatch { .. })
		));
		assert_eq!(connection.rpc_call_count(), 0);
		assert!(connection.sent_transactions().is_empty());
	}

	#[tokio::test]
	async fn execute_runs_the_full_pipeline() {
		let connection = Arc::new(MockConnection::new(10));
		connection.stage_simulation("transfer", Ok(DynSolValue::Bool(true)));
		let client = ContractClient::new(connection.clone(), erc20_abi()).with_signer(signer());

		let execution = client
			.execute(&transfer_call(), ExecuteOptions::default())
			.await
			.unwrap();
		match execution {
			Execution::Confirmed(receipt) => assert!(receipt.success),
			other => panic!("expected a confirmed execution, got {other:?}"),
		}

		let sent = connection.sent_transactions();
		assert_eq!(sent.len(), 1);
		// EIP-2718 type byte for EIP-1559 transactions
		assert_eq!(sent[0][0], 0x02);
	}

	#[tokio::test]
	async fn execute_can_skip_the_receipt_wait() {
		let connection = Arc::new(MockConnection::new(10));
		connection.stage_simulation("transfer", Ok(DynSolValue::Bool(true)));
		let client = ContractClient::new(connection.clone(), erc20_abi()).with_signer(signer());

		let execution = client
			.execute(
				&transfer_call(),
				ExecuteOptions {
					wait_for_receipt: false,
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert!(matches!(execution, Execution::Submitted(_)));
	}
}
