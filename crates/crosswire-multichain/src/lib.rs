//! Multichain facade over one contract ABI.
//!
//! A [`MultichainContract`] pairs a [`ChainRegistry`] with a single ABI
//! and hands out lazily built per-chain [`ContractClient`]s, all sharing
//! the same signer, decoder chain, and batching options. Cross-chain
//! batched reads fan out concurrently and keep failures confined to the
//! chain that produced them.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::json_abi::JsonAbi;
use crosswire_client::{ClientOptions, ContractClient};
use crosswire_connection::Connection;
use crosswire_registry::ChainRegistry;
use crosswire_types::{
	BatchResult, ChainCall, ChainConfig, ChainFailure, ContractCall, CrossChainBatchResult, Fault,
};
use futures::future::join_all;
use tokio::sync::Mutex;

/// One logical contract deployed across many chains.
pub struct MultichainContract {
	registry: ChainRegistry,
	abi: Arc<JsonAbi>,
	options: ClientOptions,
	clients: Mutex<HashMap<u64, Arc<ContractClient>>>,
}

impl MultichainContract {
	pub fn new(registry: ChainRegistry, abi: Arc<JsonAbi>) -> Self {
		Self::with_options(registry, abi, ClientOptions::default())
	}

	pub fn with_options(registry: ChainRegistry, abi: Arc<JsonAbi>, options: ClientOptions) -> Self {
		Self {
			registry,
			abi,
			options,
			clients: Mutex::new(HashMap::new()),
		}
	}

	pub fn has_chain(&self, chain_id: u64) -> bool {
		self.registry.has_chain(chain_id)
	}

	/// Chain IDs in registration order.
	pub fn chain_ids(&self) -> Vec<u64> {
		self.registry.chain_ids()
	}

	pub fn registry(&self) -> &ChainRegistry {
		&self.registry
	}

	/// Returns a new facade serving one more chain; `self` keeps its
	/// registry and cache unchanged.
	pub fn with_connection(&self, connection: Arc<dyn Connection>) -> Result<Self, Fault> {
		Ok(Self::with_options(
			self.registry.with_connection(connection)?,
			self.abi.clone(),
			self.options.clone(),
		))
	}

	/// Returns a new facade with an HTTP connection built from the given
	/// configuration; `self` is not modified.
	pub fn with_config(&self, config: &ChainConfig) -> Result<Self, Fault> {
		Ok(Self::with_options(
			self.registry.with_config(config)?,
			self.abi.clone(),
			self.options.clone(),
		))
	}

	/// The client for one chain, built on first use and cached.
	pub async fn client(&self, chain_id: u64) -> Result<Arc<ContractClient>, Fault> {
		let mut clients = self.clients.lock().await;
		if let Some(client) = clients.get(&chain_id) {
			return Ok(client.clone());
		}
		let connection = self.registry.connection(chain_id)?;
		let client = Arc::new(ContractClient::from_options(
			connection,
			self.abi.clone(),
			&self.options,
		));
		clients.insert(chain_id, client.clone());
		Ok(client)
	}

	/// Fans a batch of chain-routed calls out to their chains.
	///
	/// Calls are grouped by chain, preserving per-chain call order and
	/// first-seen chain order; the per-chain batches then run
	/// concurrently. A chain that is not registered, or whose whole
	/// batch fails, lands in `failed_chains` without disturbing the
	/// others. An empty input returns an empty result with no network
	/// traffic.
	pub async fn read_across_chains(&self, calls: &[ChainCall]) -> CrossChainBatchResult {
		let mut result = CrossChainBatchResult::default();
		if calls.is_empty() {
			return result;
		}

		let mut chain_order: Vec<u64> = Vec::new();
		let mut grouped: HashMap<u64, Vec<ContractCall>> = HashMap::new();
		for chain_call in calls {
			if !grouped.contains_key(&chain_call.chain_id) {
				chain_order.push(chain_call.chain_id);
			}
			grouped
				.entry(chain_call.chain_id)
				.or_default()
				.push(chain_call.call.clone());
		}
		tracing::debug!(
			chains = chain_order.len(),
			calls = calls.len(),
			"dispatching cross-chain batched read"
		);

		let mut dispatches = Vec::with_capacity(chain_order.len());
		for chain_id in chain_order {
			let chain_calls = grouped.remove(&chain_id).unwrap_or_default();
			match self.client(chain_id).await {
				Ok(client) => {
					dispatches.push(async move {
						let outcome = client.read_batch(&chain_calls).await;
						(chain_id, outcome)
					});
				}
				Err(error) => {
					result.failed_chains.push(ChainFailure { chain_id, error });
				}
			}
		}

		for (chain_id, outcome) in join_all(dispatches).await {
			match outcome {
				Ok(outcomes) => {
					result
						.results_by_chain
						.insert(chain_id, BatchResult::new(chain_id, outcomes));
				}
				Err(error) => {
					tracing::warn!(chain_id, %error, "chain batch failed");
					result.failed_chains.push(ChainFailure { chain_id, error });
				}
			}
		}

		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::dyn_abi::DynSolValue;
	use alloy::primitives::{Address, U256};
	use crosswire_connection::MockConnection;
	use crosswire_signer::{LocalSigner, Signer};
	use crosswire_types::CallOutcome;

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn erc20_abi() -> Arc<JsonAbi> {
		Arc::new(
			JsonAbi::parse(["function balanceOf(address owner) view returns (uint256)"]).unwrap(),
		)
	}

	fn uint(value: u64) -> DynSolValue {
		DynSolValue::Uint(U256::from(value), 256)
	}

	fn balance_call(chain_id: u64) -> ChainCall {
		ChainCall::new(
			chain_id,
			ContractCall::new(
				Address::repeat_byte(0x11),
				"balanceOf",
				vec![DynSolValue::Address(Address::repeat_byte(0x22))],
			),
		)
	}

	fn facade(connections: Vec<Arc<MockConnection>>) -> MultichainContract {
		let registry = ChainRegistry::from_connections(
			connections
				.into_iter()
				.map(|connection| connection as Arc<dyn Connection>),
		)
		.unwrap();
		MultichainContract::new(registry, erc20_abi())
	}

	#[tokio::test]
	async fn one_failing_chain_does_not_disturb_the_others() {
		let mainnet = Arc::new(MockConnection::with_multicall(1));
		mainnet.stage_multicall(Ok(vec![
			CallOutcome::success(uint(100)),
			CallOutcome::success(uint(200)),
		]));
		let optimism = Arc::new(MockConnection::with_multicall(10));
		optimism.stage_multicall(Err(Fault::rpc("rpc down")));

		let contract = facade(vec![mainnet, optimism]);
		let calls = vec![balance_call(1), balance_call(1), balance_call(10)];
		let result = contract.read_across_chains(&calls).await;

		let mainnet_batch = result.chain_result(1).unwrap();
		assert_eq!(mainnet_batch.len(), 2);
		let values: Vec<U256> = mainnet_batch
			.outcomes
			.iter()
			.filter_map(|outcome| outcome.value())
			.filter_map(DynSolValue::as_uint)
			.map(|(value, _)| value)
			.collect();
		assert_eq!(values, vec![U256::from(100u64), U256::from(200u64)]);

		assert_eq!(result.failed_chains.len(), 1);
		assert_eq!(result.failed_chains[0].chain_id, 10);
		assert!(result.chain_result(10).is_none());
	}

	#[tokio::test]
	async fn unregistered_chains_fail_without_touching_the_network() {
		let mainnet = Arc::new(MockConnection::with_multicall(1));
		mainnet.stage_multicall(Ok(vec![CallOutcome::success(uint(100))]));

		let contract = facade(vec![mainnet.clone()]);
		let calls = vec![balance_call(1), balance_call(137)];
		let result = contract.read_across_chains(&calls).await;

		assert!(result.chain_result(1).is_some());
		assert_eq!(result.failed_chains.len(), 1);
		let failure = &result.failed_chains[0];
		assert_eq!(failure.chain_id, 137);
		match &failure.error {
			Fault::UnsupportedChain {
				available_chain_ids,
				..
			} => assert_eq!(available_chain_ids, &vec![1]),
			other => panic!("expected unsupported-chain fault, got {other:?}"),
		}
		// one aggregate call for chain 1, nothing for chain 137
		assert_eq!(mainnet.rpc_call_count(), 1);
	}

	#[tokio::test]
	async fn empty_input_short_circuits() {
		let mainnet = Arc::new(MockConnection::with_multicall(1));
		let contract = facade(vec![mainnet.clone()]);

		let result = contract.read_across_chains(&[]).await;
		assert!(result.is_empty());
		assert_eq!(mainnet.rpc_call_count(), 0);
	}

	#[tokio::test]
	async fn grouping_preserves_per_chain_call_order() {
		// sequential chains, so staged read order doubles as call order
		let mainnet = Arc::new(MockConnection::new(1));
		mainnet.stage_read("balanceOf", Ok(uint(1)));
		mainnet.stage_read("balanceOf", Ok(uint(2)));
		let optimism = Arc::new(MockConnection::new(10));
		optimism.stage_read("balanceOf", Ok(uint(3)));

		let contract = facade(vec![mainnet, optimism]);
		// interleaved input: 1, 10, 1
		let calls = vec![balance_call(1), balance_call(10), balance_call(1)];
		let result = contract.read_across_chains(&calls).await;

		let mainnet_batch = result.chain_result(1).unwrap();
		let values: Vec<U256> = mainnet_batch
			.outcomes
			.iter()
			.filter_map(|outcome| outcome.value())
			.filter_map(DynSolValue::as_uint)
			.map(|(value, _)| value)
			.collect();
		assert_eq!(values, vec![U256::from(1u64), U256::from(2u64)]);
		assert_eq!(result.chain_result(10).unwrap().len(), 1);
	}

	#[tokio::test]
	async fn clients_are_cached_per_chain() {
		let contract = facade(vec![Arc::new(MockConnection::new(1))]);
		let first = contract.client(1).await.unwrap();
		let second = contract.client(1).await.unwrap();
		assert!(Arc::ptr_eq(&first, &second));

		assert!(matches!(
			contract.client(137).await,
			Err(Fault::UnsupportedChain { .. })
		));
	}

	#[tokio::test]
	async fn extension_builds_a_new_facade() {
		let contract = facade(vec![Arc::new(MockConnection::new(1))]);
		let extended = contract
			.with_connection(Arc::new(MockConnection::new(10)))
			.unwrap();

		assert_eq!(contract.chain_ids(), vec![1]);
		assert_eq!(extended.chain_ids(), vec![1, 10]);
		assert!(contract.client(10).await.is_err());
		assert!(extended.client(10).await.is_ok());
	}

	#[tokio::test]
	async fn options_flow_into_every_client() {
		let registry =
			ChainRegistry::from_connections([Arc::new(MockConnection::new(1)) as Arc<dyn Connection>])
				.unwrap();
		let signer = Arc::new(LocalSigner::from_hex_key(TEST_KEY).unwrap());
		let contract = MultichainContract::with_options(
			registry,
			erc20_abi(),
			ClientOptions {
				signer: Some(signer.clone()),
				..Default::default()
			},
		);

		let client = contract.client(1).await.unwrap();
		assert!(client.has_signer());
		assert_eq!(client.signer_address(), Some(signer.address()));
	}
}
