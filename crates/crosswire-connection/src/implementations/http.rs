//! Alloy-backed HTTP implementation of the [`Connection`] trait.
//!
//! One [`HttpConnection`] wraps one JSON-RPC endpoint. Batched reads go
//! through the chain's multicall aggregator using `aggregate3`; the
//! receipt wait polls the endpoint until the transaction is mined or a
//! timeout elapses.

use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use crosswire_types::abi::{decode_output, encode_call_data, resolve_function};
use crosswire_types::{
	CallOutcome, ChainConfig, ChainMetadata, ContractCall, Fault, FeeEstimate, RevertFault,
	TransactionReceipt,
};

use crate::{Connection, EstimateRequest};

sol! {
	struct Call3 {
		address target;
		bool allowFailure;
		bytes callData;
	}

	struct MulticallResult {
		bool success;
		bytes returnData;
	}

	function aggregate3(Call3[] calldata calls) external payable returns (MulticallResult[] memory returnData);
}

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// JSON-RPC connection to a single chain over HTTP.
pub struct HttpConnection {
	metadata: ChainMetadata,
	provider: DynProvider,
}

impl HttpConnection {
	/// Connects to the RPC endpoint named by the metadata.
	pub fn connect(metadata: ChainMetadata) -> Result<Self, Fault> {
		let url = metadata.rpc_url.parse().map_err(|e| {
			Fault::rpc(format!("invalid RPC URL '{}': {}", metadata.rpc_url, e))
		})?;
		let provider = ProviderBuilder::new().connect_http(url).erased();
		Ok(Self { metadata, provider })
	}

	/// Connects using a chain configuration, applying any multicall
	/// override onto the metadata first.
	pub fn from_config(config: &ChainConfig) -> Result<Self, Fault> {
		Self::connect(config.effective_metadata())
	}
}

/// Maps an RPC error to a fault, surfacing revert data when the node
/// attached any.
fn call_fault(err: RpcError<TransportErrorKind>) -> Fault {
	if let Some(data) = err.as_error_resp().and_then(|payload| payload.as_revert_data()) {
		return Fault::Revert(RevertFault::generic(data));
	}
	Fault::rpc(err.to_string())
}

#[async_trait]
impl Connection for HttpConnection {
	fn metadata(&self) -> &ChainMetadata {
		&self.metadata
	}

	async fn read_contract(
		&self,
		abi: &JsonAbi,
		call: &ContractCall,
	) -> Result<DynSolValue, Fault> {
		let function = resolve_function(abi, call)?;
		let input = encode_call_data(function, call)?;
		let request = TransactionRequest::default()
			.to(call.address)
			.input(TransactionInput::new(input));
		let data = self.provider.call(request).await.map_err(call_fault)?;
		decode_output(function, &data)
	}

	async fn multicall(
		&self,
		abi: &JsonAbi,
		calls: &[ContractCall],
		allow_failure: bool,
		batch_size: usize,
	) -> Result<Vec<CallOutcome>, Fault> {
		let multicall_address = self.metadata.multicall_address.ok_or_else(|| {
			Fault::rpc(format!(
				"chain {} has no multicall contract configured",
				self.metadata.chain_id
			))
		})?;

		let mut functions = Vec::with_capacity(calls.len());
		let mut aggregated = Vec::with_capacity(calls.len());
		for call in calls {
			let function = resolve_function(abi, call)?;
			aggregated.push(Call3 {
				target: call.address,
				allowFailure: allow_failure,
				callData: encode_call_data(function, call)?,
			});
			functions.push(function);
		}

		let chunk_size = batch_size.max(1);
		let mut outcomes = Vec::with_capacity(calls.len());
		for (chunk, chunk_functions) in aggregated
			.chunks(chunk_size)
			.zip(functions.chunks(chunk_size))
		{
			let input = aggregate3Call {
				calls: chunk.to_vec(),
			}
			.abi_encode();
			let request = TransactionRequest::default()
				.to(multicall_address)
				.input(TransactionInput::new(input.into()));
			let data = self.provider.call(request).await.map_err(call_fault)?;
			let results = aggregate3Call::abi_decode_returns(&data).map_err(|e| Fault::Decode {
				message: format!("failed to decode aggregate3 response: {}", e),
			})?;
			if results.len() != chunk.len() {
				return Err(Fault::Decode {
					message: format!(
						"aggregate3 returned {} results for {} calls",
						results.len(),
						chunk.len()
					),
				});
			}
			for (result, function) in results.into_iter().zip(chunk_functions) {
				let outcome = if result.success {
					match decode_output(function, &result.returnData) {
						Ok(value) => CallOutcome::success(value),
						Err(error) => CallOutcome::failure(error),
					}
				} else {
					CallOutcome::failure(Fault::Revert(RevertFault::generic(result.returnData)))
				};
				outcomes.push(outcome);
			}
		}

		Ok(outcomes)
	}

	async fn simulate_contract(
		&self,
		abi: &JsonAbi,
		call: &ContractCall,
		from: Option<Address>,
	) -> Result<DynSolValue, Fault> {
		let function = resolve_function(abi, call)?;
		let input = encode_call_data(function, call)?;
		let mut request = TransactionRequest::default()
			.to(call.address)
			.input(TransactionInput::new(input));
		if let Some(from) = from {
			request = request.from(from);
		}
		let data = self.provider.call(request).await.map_err(call_fault)?;
		decode_output(function, &data)
	}

	async fn estimate_gas(&self, request: &EstimateRequest) -> Result<u64, Fault> {
		let mut tx = TransactionRequest::default()
			.to(request.to)
			.input(TransactionInput::new(request.input.clone()));
		if let Some(from) = request.from {
			tx = tx.from(from);
		}
		self.provider.estimate_gas(tx).await.map_err(call_fault)
	}

	async fn estimate_fees_per_gas(&self) -> Result<FeeEstimate, Fault> {
		let estimate = self
			.provider
			.estimate_eip1559_fees()
			.await
			.map_err(call_fault)?;
		Ok(FeeEstimate {
			max_fee_per_gas: estimate.max_fee_per_gas,
			max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
		})
	}

	async fn transaction_count(&self, address: Address) -> Result<u64, Fault> {
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(call_fault)
	}

	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, Fault> {
		let pending = self
			.provider
			.send_raw_transaction(raw)
			.await
			.map_err(call_fault)?;
		let hash = *pending.tx_hash();
		tracing::info!(chain_id = self.metadata.chain_id, %hash, "submitted transaction");
		Ok(hash)
	}

	async fn wait_for_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<TransactionReceipt, Fault> {
		let deadline = tokio::time::Instant::now() + RECEIPT_TIMEOUT;
		loop {
			match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => {
					return Ok(TransactionReceipt {
						transaction_hash: receipt.transaction_hash,
						block_number: receipt.block_number.unwrap_or(0),
						success: receipt.status(),
					});
				}
				Ok(None) => {}
				Err(err) => {
					tracing::debug!(%hash, error = %err, "receipt query failed, retrying");
				}
			}
			if tokio::time::Instant::now() >= deadline {
				return Err(Fault::rpc(format!(
					"timed out waiting for receipt of transaction {hash}"
				)));
			}
			tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
		}
	}
}
