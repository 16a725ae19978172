//! ERC-721 token definition and multichain client.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, U256};
use crosswire_client::{ClientOptions, ExecuteOptions, Execution};
use crosswire_multichain::MultichainContract;
use crosswire_registry::ChainRegistry;
use crosswire_types::utils::{expect_address, expect_bool, expect_string, expect_uint};
use crosswire_types::{CallOutcome, ChainCall, ChainFailure, ContractCall, Fault};

fn erc721_abi() -> Arc<JsonAbi> {
	static ABI: OnceLock<Arc<JsonAbi>> = OnceLock::new();
	ABI.get_or_init(|| {
		Arc::new(
			JsonAbi::parse([
				"function name() view returns (string)",
				"function symbol() view returns (string)",
				"function balanceOf(address owner) view returns (uint256)",
				"function ownerOf(uint256 tokenId) view returns (address)",
				"function tokenURI(uint256 tokenId) view returns (string)",
				"function getApproved(uint256 tokenId) view returns (address)",
				"function isApprovedForAll(address owner, address operator) view returns (bool)",
				"function approve(address to, uint256 tokenId)",
				"function setApprovalForAll(address operator, bool approved)",
				"function transferFrom(address from, address to, uint256 tokenId)",
				"function safeTransferFrom(address from, address to, uint256 tokenId)",
			])
			.expect("static ERC-721 ABI must parse"),
		)
	})
	.clone()
}

/// An ERC-721 collection and its deployment addresses, one per chain.
#[derive(Debug, Clone)]
pub struct Erc721Definition {
	symbol: String,
	name: Option<String>,
	deployments: HashMap<u64, Address>,
	chain_order: Vec<u64>,
}

impl Erc721Definition {
	pub fn builder() -> Erc721DefinitionBuilder {
		Erc721DefinitionBuilder::default()
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Chains this collection is deployed on, in declaration order.
	pub fn chain_ids(&self) -> &[u64] {
		&self.chain_order
	}

	/// Deployment pairs in declaration order.
	pub fn deployments(&self) -> Vec<(u64, Address)> {
		self.chain_order
			.iter()
			.filter_map(|chain_id| {
				self.deployments
					.get(chain_id)
					.map(|address| (*chain_id, *address))
			})
			.collect()
	}

	/// The collection's address on one chain.
	///
	/// # Errors
	///
	/// Returns [`Fault::UnsupportedChain`] naming the chains the
	/// collection is deployed on.
	pub fn address_on(&self, chain_id: u64) -> Result<Address, Fault> {
		self.deployments
			.get(&chain_id)
			.copied()
			.ok_or_else(|| Fault::UnsupportedChain {
				chain_id,
				available_chain_ids: self.chain_order.clone(),
			})
	}
}

/// Builder for [`Erc721Definition`].
#[derive(Debug, Default, Clone)]
pub struct Erc721DefinitionBuilder {
	symbol: Option<String>,
	name: Option<String>,
	deployments: HashMap<u64, Address>,
	chain_order: Vec<u64>,
}

impl Erc721DefinitionBuilder {
	pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
		self.symbol = Some(symbol.into());
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Declares the collection's address on one chain. Re-declaring a
	/// chain replaces the address.
	pub fn deployment(mut self, chain_id: u64, address: Address) -> Self {
		if !self.deployments.contains_key(&chain_id) {
			self.chain_order.push(chain_id);
		}
		self.deployments.insert(chain_id, address);
		self
	}

	pub fn build(self) -> Result<Erc721Definition, Fault> {
		let symbol = self.symbol.ok_or(Fault::MissingField { field: "symbol" })?;
		if self.deployments.is_empty() {
			return Err(Fault::MissingField {
				field: "deployments",
			});
		}
		Ok(Erc721Definition {
			symbol,
			name: self.name,
			deployments: self.deployments,
			chain_order: self.chain_order,
		})
	}
}

/// Owners of one token ID across every deployment chain.
#[derive(Debug, Clone, Default)]
pub struct CrossChainOwners {
	pub owners: HashMap<u64, Address>,
	pub failed_chains: Vec<ChainFailure>,
}

/// Multichain client for one ERC-721 collection.
pub struct Erc721Client {
	definition: Erc721Definition,
	contract: MultichainContract,
}

impl Erc721Client {
	pub fn new(registry: ChainRegistry, definition: Erc721Definition) -> Self {
		Self::with_options(registry, definition, ClientOptions::default())
	}

	pub fn with_options(
		registry: ChainRegistry,
		definition: Erc721Definition,
		options: ClientOptions,
	) -> Self {
		Self {
			definition,
			contract: MultichainContract::with_options(registry, erc721_abi(), options),
		}
	}

	pub fn definition(&self) -> &Erc721Definition {
		&self.definition
	}

	pub fn contract(&self) -> &MultichainContract {
		&self.contract
	}

	pub async fn owner_of(&self, chain_id: u64, token_id: U256) -> Result<Address, Fault> {
		let value = self
			.read(chain_id, "ownerOf", vec![DynSolValue::Uint(token_id, 256)])
			.await?;
		expect_address(&value)
	}

	pub async fn balance_of(&self, chain_id: u64, owner: Address) -> Result<U256, Fault> {
		let value = self
			.read(chain_id, "balanceOf", vec![DynSolValue::Address(owner)])
			.await?;
		expect_uint(&value)
	}

	pub async fn token_uri(&self, chain_id: u64, token_id: U256) -> Result<String, Fault> {
		let value = self
			.read(chain_id, "tokenURI", vec![DynSolValue::Uint(token_id, 256)])
			.await?;
		expect_string(&value)
	}

	pub async fn is_approved_for_all(
		&self,
		chain_id: u64,
		owner: Address,
		operator: Address,
	) -> Result<bool, Fault> {
		let value = self
			.read(
				chain_id,
				"isApprovedForAll",
				vec![DynSolValue::Address(owner), DynSolValue::Address(operator)],
			)
			.await?;
		expect_bool(&value)
	}

	/// Resolves one token ID's owner on every deployment chain in a
	/// single fan-out. A chain where the token does not exist reverts
	/// and lands in `failed_chains`; the others are unaffected.
	pub async fn owners_across_chains(&self, token_id: U256) -> CrossChainOwners {
		let calls: Vec<ChainCall> = self
			.definition
			.deployments()
			.into_iter()
			.map(|(chain_id, address)| {
				ChainCall::new(
					chain_id,
					ContractCall::new(address, "ownerOf", vec![DynSolValue::Uint(token_id, 256)]),
				)
			})
			.collect();

		let result = self.contract.read_across_chains(&calls).await;
		let mut owners = CrossChainOwners {
			failed_chains: result.failed_chains,
			..Default::default()
		};
		for (chain_id, batch) in result.results_by_chain {
			match batch.outcomes.into_iter().next() {
				Some(CallOutcome::Success { value }) => match expect_address(&value) {
					Ok(owner) => {
						owners.owners.insert(chain_id, owner);
					}
					Err(error) => owners.failed_chains.push(ChainFailure { chain_id, error }),
				},
				Some(CallOutcome::Failure { error }) => {
					owners.failed_chains.push(ChainFailure { chain_id, error });
				}
				None => {}
			}
		}
		owners
	}

	pub async fn approve(
		&self,
		chain_id: u64,
		to: Address,
		token_id: U256,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		self.execute(
			chain_id,
			"approve",
			vec![DynSolValue::Address(to), DynSolValue::Uint(token_id, 256)],
			options,
		)
		.await
	}

	pub async fn set_approval_for_all(
		&self,
		chain_id: u64,
		operator: Address,
		approved: bool,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		self.execute(
			chain_id,
			"setApprovalForAll",
			vec![DynSolValue::Address(operator), DynSolValue::Bool(approved)],
			options,
		)
		.await
	}

	pub async fn transfer_from(
		&self,
		chain_id: u64,
		from: Address,
		to: Address,
		token_id: U256,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		self.execute(
			chain_id,
			"transferFrom",
			vec![
				DynSolValue::Address(from),
				DynSolValue::Address(to),
				DynSolValue::Uint(token_id, 256),
			],
			options,
		)
		.await
	}

	async fn read(
		&self,
		chain_id: u64,
		function: &str,
		args: Vec<DynSolValue>,
	) -> Result<DynSolValue, Fault> {
		let address = self.definition.address_on(chain_id)?;
		let client = self.contract.client(chain_id).await?;
		client.read(&ContractCall::new(address, function, args)).await
	}

	async fn execute(
		&self,
		chain_id: u64,
		function: &str,
		args: Vec<DynSolValue>,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		let address = self.definition.address_on(chain_id)?;
		let client = self.contract.client(chain_id).await?;
		client
			.execute(&ContractCall::new(address, function, args), options)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crosswire_connection::{Connection, MockConnection};
	use crosswire_signer::LocalSigner;
	use crosswire_types::{RevertFault, RevertKind};

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn definition() -> Erc721Definition {
		Erc721Definition::builder()
			.symbol("WIRE")
			.deployment(1, Address::repeat_byte(0xb0))
			.deployment(10, Address::repeat_byte(0xb1))
			.build()
			.unwrap()
	}

	fn registry(connections: Vec<Arc<MockConnection>>) -> ChainRegistry {
		ChainRegistry::from_connections(
			connections
				.into_iter()
				.map(|connection| connection as Arc<dyn Connection>),
		)
		.unwrap()
	}

	#[tokio::test]
	async fn reads_owner_and_uri() {
		let mainnet = Arc::new(MockConnection::new(1));
		mainnet.stage_read("ownerOf", Ok(DynSolValue::Address(Address::repeat_byte(0x22))));
		mainnet.stage_read(
			"tokenURI",
			Ok(DynSolValue::String("ipfs://42".to_string())),
		);
		let client = Erc721Client::new(
			registry(vec![mainnet, Arc::new(MockConnection::new(10))]),
			definition(),
		);

		let owner = client.owner_of(1, U256::from(42u64)).await.unwrap();
		assert_eq!(owner, Address::repeat_byte(0x22));
		let uri = client.token_uri(1, U256::from(42u64)).await.unwrap();
		assert_eq!(uri, "ipfs://42");
	}

	#[tokio::test]
	async fn wrong_return_shape_is_a_decode_fault() {
		let mainnet = Arc::new(MockConnection::new(1));
		mainnet.stage_read("ownerOf", Ok(DynSolValue::Bool(true)));
		let client = Erc721Client::new(registry(vec![mainnet]), definition());

		assert!(matches!(
			client.owner_of(1, U256::from(1u64)).await,
			Err(Fault::Decode { .. })
		));
	}

	#[tokio::test]
	async fn owners_fan_out_isolates_nonexistent_tokens() {
		let mainnet = Arc::new(MockConnection::new(1));
		mainnet.stage_read("ownerOf", Ok(DynSolValue::Address(Address::repeat_byte(0x22))));
		let optimism = Arc::new(MockConnection::new(10));
		optimism.stage_read(
			"ownerOf",
			Err(Fault::Revert(RevertFault::new(
				Vec::new(),
				RevertKind::Erc721NonexistentToken { token_id: None },
			))),
		);

		let client = Erc721Client::new(registry(vec![mainnet, optimism]), definition());
		let owners = client.owners_across_chains(U256::from(42u64)).await;

		assert_eq!(owners.owners.get(&1), Some(&Address::repeat_byte(0x22)));
		assert_eq!(owners.failed_chains.len(), 1);
		assert_eq!(owners.failed_chains[0].chain_id, 10);
	}

	#[tokio::test]
	async fn approval_walks_the_write_pipeline() {
		let mainnet = Arc::new(MockConnection::new(1));
		mainnet.stage_simulation("setApprovalForAll", Ok(DynSolValue::Tuple(vec![])));
		let signer = Arc::new(LocalSigner::from_hex_key(TEST_KEY).unwrap());
		let client = Erc721Client::with_options(
			registry(vec![mainnet.clone()]),
			definition(),
			ClientOptions {
				signer: Some(signer),
				..Default::default()
			},
		);

		let execution = client
			.set_approval_for_all(
				1,
				Address::repeat_byte(0x44),
				true,
				ExecuteOptions::default(),
			)
			.await
			.unwrap();
		assert!(matches!(execution, Execution::Confirmed(_)));
		assert_eq!(mainnet.sent_transactions().len(), 1);
	}
}
