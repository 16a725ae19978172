//! Decoder for application-specific errors declared in a contract ABI.

use std::sync::Arc;

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::{Error, JsonAbi};
use crosswire_types::utils::format_sol_value;
use crosswire_types::{RevertFault, RevertKind};

use crate::RevertDecoder;

/// Matches revert data against every error declared in a contract's
/// ABI, by selector.
pub struct AbiErrorDecoder {
	abi: Arc<JsonAbi>,
}

impl AbiErrorDecoder {
	pub fn new(abi: Arc<JsonAbi>) -> Self {
		Self { abi }
	}
}

impl RevertDecoder for AbiErrorDecoder {
	fn decode(&self, data: &[u8]) -> Option<RevertFault> {
		if data.len() < 4 {
			return None;
		}
		for error in self.abi.errors() {
			if error.selector().as_slice() != &data[..4] {
				continue;
			}
			let Some(args) = decode_args(error, &data[4..]) else {
				continue;
			};
			return Some(RevertFault::new(
				data.to_vec(),
				RevertKind::Custom {
					name: error.name.clone(),
					description: format!("{}{}", error.name, format_sol_value(&args)),
				},
			));
		}
		None
	}
}

fn decode_args(error: &Error, data: &[u8]) -> Option<DynSolValue> {
	let types = error
		.inputs
		.iter()
		.map(|param| param.resolve())
		.collect::<Result<Vec<DynSolType>, _>>()
		.ok()?;
	DynSolType::Tuple(types).abi_decode_params(data).ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::U256;

	fn pool_abi() -> Arc<JsonAbi> {
		Arc::new(
			JsonAbi::parse(["error InsufficientLiquidity(uint256 available, uint256 requested)"])
				.unwrap(),
		)
	}

	#[test]
	fn decodes_declared_custom_error() {
		let abi = pool_abi();
		let error = abi.errors().next().unwrap();
		let mut data = error.selector().to_vec();
		data.extend(
			DynSolValue::Tuple(vec![
				DynSolValue::Uint(U256::from(5u64), 256),
				DynSolValue::Uint(U256::from(10u64), 256),
			])
			.abi_encode_params(),
		);

		let fault = AbiErrorDecoder::new(abi.clone()).decode(&data).unwrap();
		match fault.kind {
			RevertKind::Custom { name, description } => {
				assert_eq!(name, "InsufficientLiquidity");
				assert_eq!(description, "InsufficientLiquidity(5, 10)");
			}
			other => panic!("expected custom error, got {other:?}"),
		}
	}

	#[test]
	fn ignores_undeclared_selectors() {
		let decoder = AbiErrorDecoder::new(pool_abi());
		assert!(decoder.decode(&[0xde, 0xad, 0xbe, 0xef]).is_none());
	}
}
