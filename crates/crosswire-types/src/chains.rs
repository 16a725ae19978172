//! Chain metadata and configuration types.
//!
//! Defines the per-chain settings the library needs: chain ID, RPC URL,
//! and the optional multicall contract address that enables batched
//! reads. Configurations deserialize from TOML where chain IDs appear as
//! string table keys.

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Metadata describing one blockchain network.
///
/// `multicall_address` declares the chain's deployed multicall aggregator;
/// its presence is what makes a connection report multicall support.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainMetadata {
	#[serde(default)]
	pub chain_id: u64,
	pub name: String,
	pub rpc_url: String,
	#[serde(default)]
	pub multicall_address: Option<Address>,
}

/// Configuration entry for one chain: metadata plus an optional
/// multicall-address override.
///
/// The override is applied onto a copy of the metadata at
/// materialization time; shared metadata values are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
	#[serde(flatten)]
	pub metadata: ChainMetadata,
	#[serde(default)]
	pub multicall_override: Option<Address>,
}

impl ChainConfig {
	pub fn new(metadata: ChainMetadata) -> Self {
		Self {
			metadata,
			multicall_override: None,
		}
	}

	/// Returns a copy of this config with the multicall override set.
	pub fn with_multicall_override(mut self, address: Address) -> Self {
		self.multicall_override = Some(address);
		self
	}

	/// Produces the effective metadata: a copy of the configured metadata
	/// with the override applied when present.
	pub fn effective_metadata(&self) -> ChainMetadata {
		let mut metadata = self.metadata.clone();
		if let Some(address) = self.multicall_override {
			metadata.multicall_address = Some(address);
		}
		metadata
	}

	pub fn chain_id(&self) -> u64 {
		self.metadata.chain_id
	}
}

/// Chains configuration mapping chain IDs to their configurations.
pub type ChainsConfig = HashMap<u64, ChainConfig>;

/// Helper function to deserialize chain configurations from TOML.
///
/// Chain IDs are provided as string keys in TOML (TOML tables do not
/// support numeric keys) and are converted to u64 keys and stamped onto
/// each entry's metadata.
///
/// # Errors
///
/// Returns a deserialization error if a chain ID key cannot be parsed as
/// a u64 or the underlying chain configuration is invalid.
pub fn deserialize_chains<'de, D>(deserializer: D) -> Result<ChainsConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, ChainConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, mut value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain_id '{}': {}", key, e)))?;
		value.metadata.chain_id = chain_id;
		result.insert(chain_id, value);
	}

	Ok(result)
}
