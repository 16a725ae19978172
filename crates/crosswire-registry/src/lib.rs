//! Immutable registry of per-chain connections.
//!
//! A [`ChainRegistry`] owns one [`Connection`] per chain ID and never
//! changes after construction. Extension goes through [`ChainRegistry::with_connection`]
//! and [`ChainRegistry::with_config`], which build a new registry and
//! leave the original untouched, so clients holding the old value keep a
//! stable view of the world.

use std::collections::HashMap;
use std::sync::Arc;

use crosswire_connection::{Connection, HttpConnection};
use crosswire_types::{ChainConfig, ChainsConfig, Fault};

/// Lookup table from chain ID to connection.
///
/// Chain IDs are reported in insertion order, both from [`ChainRegistry::chain_ids`]
/// and in the `available_chain_ids` list carried by unsupported-chain
/// faults.
#[derive(Clone)]
pub struct ChainRegistry {
	connections: HashMap<u64, Arc<dyn Connection>>,
	chain_order: Vec<u64>,
}

impl ChainRegistry {
	/// Builds a registry from pre-constructed connections.
	///
	/// # Errors
	///
	/// Returns [`Fault::DuplicateChain`] when two connections claim the
	/// same chain ID.
	pub fn from_connections(
		connections: impl IntoIterator<Item = Arc<dyn Connection>>,
	) -> Result<Self, Fault> {
		let mut registry = Self {
			connections: HashMap::new(),
			chain_order: Vec::new(),
		};
		for connection in connections {
			registry.insert(connection)?;
		}
		Ok(registry)
	}

	/// Builds a registry of HTTP connections from chain configurations,
	/// in ascending chain-ID order.
	pub fn from_configs(configs: &ChainsConfig) -> Result<Self, Fault> {
		let mut ordered: Vec<&ChainConfig> = configs.values().collect();
		ordered.sort_by_key(|config| config.chain_id());

		let mut connections: Vec<Arc<dyn Connection>> = Vec::with_capacity(ordered.len());
		for config in ordered {
			connections.push(Arc::new(HttpConnection::from_config(config)?));
		}
		Self::from_connections(connections)
	}

	/// Returns a new registry with one more connection; `self` is not
	/// modified.
	pub fn with_connection(&self, connection: Arc<dyn Connection>) -> Result<Self, Fault> {
		let mut extended = self.clone();
		extended.insert(connection)?;
		Ok(extended)
	}

	/// Returns a new registry with an HTTP connection built from the
	/// given configuration; `self` is not modified.
	pub fn with_config(&self, config: &ChainConfig) -> Result<Self, Fault> {
		self.with_connection(Arc::new(HttpConnection::from_config(config)?))
	}

	pub fn has_chain(&self, chain_id: u64) -> bool {
		self.connections.contains_key(&chain_id)
	}

	/// Chain IDs in registration order.
	pub fn chain_ids(&self) -> Vec<u64> {
		self.chain_order.clone()
	}

	pub fn len(&self) -> usize {
		self.chain_order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chain_order.is_empty()
	}

	/// Looks up the connection serving `chain_id`.
	///
	/// # Errors
	///
	/// Returns [`Fault::UnsupportedChain`] naming the requested chain and
	/// every registered chain ID.
	pub fn connection(&self, chain_id: u64) -> Result<Arc<dyn Connection>, Fault> {
		self.connections
			.get(&chain_id)
			.cloned()
			.ok_or_else(|| Fault::UnsupportedChain {
				chain_id,
				available_chain_ids: self.chain_order.clone(),
			})
	}

	fn insert(&mut self, connection: Arc<dyn Connection>) -> Result<(), Fault> {
		let chain_id = connection.chain_id();
		if self.connections.contains_key(&chain_id) {
			return Err(Fault::DuplicateChain { chain_id });
		}
		tracing::debug!(chain_id, "registered chain connection");
		self.chain_order.push(chain_id);
		self.connections.insert(chain_id, connection);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crosswire_connection::MockConnection;

	fn mock(chain_id: u64) -> Arc<dyn Connection> {
		Arc::new(MockConnection::new(chain_id))
	}

	#[test]
	fn reports_chain_ids_in_registration_order() {
		let registry =
			ChainRegistry::from_connections([mock(10), mock(1), mock(8453)]).unwrap();
		assert_eq!(registry.chain_ids(), vec![10, 1, 8453]);
		assert!(registry.has_chain(1));
		assert!(!registry.has_chain(137));
	}

	#[test]
	fn rejects_duplicate_chain_ids() {
		let result = ChainRegistry::from_connections([mock(1), mock(1)]);
		assert!(matches!(result, Err(Fault::DuplicateChain { chain_id: 1 })));
	}

	#[test]
	fn unknown_chain_lookup_lists_available_chains() {
		let registry = ChainRegistry::from_connections([mock(1), mock(10)]).unwrap();
		let fault = registry
			.connection(137)
			.err()
			.expect("lookup of an unregistered chain must fail");
		match fault {
			Fault::UnsupportedChain {
				chain_id,
				available_chain_ids,
			} => {
				assert_eq!(chain_id, 137);
				assert_eq!(available_chain_ids, vec![1, 10]);
			}
			other => panic!("expected unsupported-chain fault, got {other:?}"),
		}
	}

	#[test]
	fn extension_leaves_the_original_untouched() {
		let original = ChainRegistry::from_connections([mock(1)]).unwrap();
		let extended = original.with_connection(mock(10)).unwrap();

		assert_eq!(original.chain_ids(), vec![1]);
		assert_eq!(extended.chain_ids(), vec![1, 10]);
		assert!(original.connection(10).is_err());
		assert!(extended.connection(10).is_ok());
	}

	#[test]
	fn extension_with_existing_chain_is_rejected() {
		let registry = ChainRegistry::from_connections([mock(1)]).unwrap();
		assert!(matches!(
			registry.with_connection(mock(1)),
			Err(Fault::DuplicateChain { chain_id: 1 })
		));
	}
}
