//! ERC-20 token definition and multichain client.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, U256};
use crosswire_client::{ClientOptions, ExecuteOptions, Execution};
use crosswire_multichain::MultichainContract;
use crosswire_registry::ChainRegistry;
use crosswire_types::utils::expect_uint;
use crosswire_types::{CallOutcome, ChainCall, ChainFailure, ContractCall, Fault};

fn erc20_abi() -> Arc<JsonAbi> {
	static ABI: OnceLock<Arc<JsonAbi>> = OnceLock::new();
	ABI.get_or_init(|| {
		Arc::new(
			JsonAbi::parse([
				"function name() view returns (string)",
				"function symbol() view returns (string)",
				"function decimals() view returns (uint8)",
				"function totalSupply() view returns (uint256)",
				"function balanceOf(address owner) view returns (uint256)",
				"function allowance(address owner, address spender) view returns (uint256)",
				"function approve(address spender, uint256 amount) returns (bool)",
				"function transfer(address to, uint256 amount) returns (bool)",
				"function transferFrom(address from, address to, uint256 amount) returns (bool)",
			])
			.expect("static ERC-20 ABI must parse"),
		)
	})
	.clone()
}

/// An ERC-20 token and its deployment addresses, one per chain.
#[derive(Debug, Clone)]
pub struct Erc20Definition {
	symbol: String,
	name: Option<String>,
	decimals: Option<u8>,
	deployments: HashMap<u64, Address>,
	chain_order: Vec<u64>,
}

impl Erc20Definition {
	pub fn builder() -> Erc20DefinitionBuilder {
		Erc20DefinitionBuilder::default()
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn decimals(&self) -> Option<u8> {
		self.decimals
	}

	/// Chains this token is deployed on, in declaration order.
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

	/// The token's address on one chain.
	///
	/// # Errors
	///
	/// Returns [`Fault::UnsupportedChain`] naming the chains the token is
	/// deployed on.
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

/// Builder for [`Erc20Definition`].
#[derive(Debug, Default, Clone)]
pub struct Erc20DefinitionBuilder {
	symbol: Option<String>,
	name: Option<String>,
	decimals: Option<u8>,
	deployments: HashMap<u64, Address>,
	chain_order: Vec<u64>,
}

impl Erc20DefinitionBuilder {
	pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
		self.symbol = Some(symbol.into());
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn decimals(mut self, decimals: u8) -> Self {
		self.decimals = Some(decimals);
		self
	}

	/// Declares the token's address on one chain. Re-declaring a chain
	/// replaces the address.
	pub fn deployment(mut self, chain_id: u64, address: Address) -> Self {
		if !self.deployments.contains_key(&chain_id) {
			self.chain_order.push(chain_id);
		}
		self.deployments.insert(chain_id, address);
		self
	}

	pub fn build(self) -> Result<Erc20Definition, Fault> {
		let symbol = self.symbol.ok_or(Fault::MissingField { field: "symbol" })?;
		if self.deployments.is_empty() {
			return Err(Fault::MissingField {
				field: "deployments",
			});
		}
		Ok(Erc20Definition {
			symbol,
			name: self.name,
			decimals: self.decimals,
			deployments: self.deployments,
			chain_order: self.chain_order,
		})
	}
}

/// Balances of one owner across every deployment chain.
#[derive(Debug, Clone, Default)]
pub struct CrossChainBalances {
	pub balances: HashMap<u64, U256>,
	pub failed_chains: Vec<ChainFailure>,
}

/// Multichain client for one ERC-20 token.
pub struct Erc20Client {
	definition: Erc20Definition,
	contract: MultichainContract,
}

impl Erc20Client {
	pub fn new(registry: ChainRegistry, definition: Erc20Definition) -> Self {
		Self::with_options(registry, definition, ClientOptions::default())
	}

	pub fn with_options(
		registry: ChainRegistry,
		definition: Erc20Definition,
		options: ClientOptions,
	) -> Self {
		Self {
			definition,
			contract: MultichainContract::with_options(registry, erc20_abi(), options),
		}
	}

	pub fn definition(&self) -> &Erc20Definition {
		&self.definition
	}

	pub fn contract(&self) -> &MultichainContract {
		&self.contract
	}

	pub async fn balance_of(&self, chain_id: u64, owner: Address) -> Result<U256, Fault> {
		let value = self
			.read(chain_id, "balanceOf", vec![DynSolValue::Address(owner)])
			.await?;
		expect_uint(&value)
	}

	pub async fn allowance(
		&self,
		chain_id: u64,
		owner: Address,
		spender: Address,
	) -> Result<U256, Fault> {
		let value = self
			.read(
				chain_id,
				"allowance",
				vec![DynSolValue::Address(owner), DynSolValue::Address(spender)],
			)
			.await?;
		expect_uint(&value)
	}

	pub async fn total_supply(&self, chain_id: u64) -> Result<U256, Fault> {
		let value = self.read(chain_id, "totalSupply", vec![]).await?;
		expect_uint(&value)
	}

	/// Reads one owner's balance on every deployment chain in a single
	/// fan-out. Chains that fail stay isolated in `failed_chains`.
	pub async fn balances_across_chains(&self, owner: Address) -> CrossChainBalances {
		let calls: Vec<ChainCall> = self
			.definition
			.deployments()
			.into_iter()
			.map(|(chain_id, address)| {
				ChainCall::new(
					chain_id,
					ContractCall::new(address, "balanceOf", vec![DynSolValue::Address(owner)]),
				)
			})
			.collect();

		let result = self.contract.read_across_chains(&calls).await;
		let mut balances = CrossChainBalances {
			failed_chains: result.failed_chains,
			..Default::default()
		};
		for (chain_id, batch) in result.results_by_chain {
			match batch.outcomes.into_iter().next() {
				Some(CallOutcome::Success { value }) => match expect_uint(&value) {
					Ok(balance) => {
						balances.balances.insert(chain_id, balance);
					}
					Err(error) => balances.failed_chains.push(ChainFailure { chain_id, error }),
				},
				Some(CallOutcome::Failure { error }) => {
					balances.failed_chains.push(ChainFailure { chain_id, error });
				}
				None => {}
			}
		}
		balances
	}

	pub async fn approve(
		&self,
		chain_id: u64,
		spender: Address,
		amount: U256,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		self.execute(
			chain_id,
			"approve",
			vec![
				DynSolValue::Address(spender),
				DynSolValue::Uint(amount, 256),
			],
			options,
		)
		.await
	}

	pub async fn transfer(
		&self,
		chain_id: u64,
		to: Address,
		amount: U256,
		options: ExecuteOptions,
	) -> Result<Execution, Fault> {
		self.execute(
			chain_id,
			"transfer",
			vec![DynSolValue::Address(to), DynSolValue::Uint(amount, 256)],
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
