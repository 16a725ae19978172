//! Multichain ERC-20 and ERC-721 token clients.
//!
//! A token definition records a symbol and its deployment address on
//! each chain; the matching client wraps a [`MultichainContract`] with
//! the standard token ABI and exposes typed reads and writes. Balance
//! and owner lookups fan out across every deployment and keep failures
//! confined to the chain that produced them.
//!
//! [`MultichainContract`]: crosswire_multichain::MultichainContract

pub mod erc20;
pub mod erc721;

pub use erc20::{CrossChainBalances, Erc20Client, Erc20Definition, Erc20DefinitionBuilder};
pub use erc721::{CrossChainOwners, Erc721Client, Erc721Definition, Erc721DefinitionBuilder};
