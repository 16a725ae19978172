//! Common types module for the crosswire multichain client.
//!
//! This module defines the core data types and structures shared across
//! the crosswire workspace. It provides a centralized location for the
//! fault hierarchy, call/batch value types, chain configuration, and the
//! write-pipeline transaction artifacts.

/// ABI function resolution and call-data encode/decode helpers.
pub mod abi;
/// Call, outcome, and batch-result value types for contract reads.
pub mod call;
/// Chain metadata and TOML-friendly chain configuration.
pub mod chains;
/// The structured fault hierarchy with cause-chain walking.
pub mod fault;
/// Decoded revert representations produced by the decoder chain.
pub mod revert;
/// Write-pipeline transaction artifacts and receipt types.
pub mod transaction;
/// String formatting utilities.
pub mod utils;

// Re-export all types for convenient access
pub use call::*;
pub use chains::*;
pub use fault::*;
pub use revert::*;
pub use transaction::*;
pub use utils::{with_0x_prefix, without_0x_prefix};
