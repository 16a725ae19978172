//! ABI function resolution, call-data encoding, and return decoding.
//!
//! Shared by the transport layer and the contract clients so both sides
//! agree on overload resolution and on how single-value returns are
//! unwrapped.

use crate::call::ContractCall;
use crate::fault::Fault;
use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Bytes;

/// Finds the ABI function matching the call's name and argument count.
pub fn resolve_function<'a>(abi: &'a JsonAbi, call: &ContractCall) -> Result<&'a Function, Fault> {
	let overloads = abi.function(&call.function).ok_or_else(|| Fault::Decode {
		message: format!("function '{}' not found in ABI", call.function),
	})?;
	overloads
		.iter()
		.find(|function| function.inputs.len() == call.args.len())
		.ok_or_else(|| Fault::Decode {
			message: format!(
				"no overload of '{}' takes {} argument(s)",
				call.function,
				call.args.len()
			),
		})
}

/// Encodes the call's arguments as selector-prefixed call data.
pub fn encode_call_data(function: &Function, call: &ContractCall) -> Result<Bytes, Fault> {
	function
		.abi_encode_input(&call.args)
		.map(Bytes::from)
		.map_err(|e| Fault::Decode {
			message: format!("failed to encode '{}' arguments: {}", call.function, e),
		})
}

/// Decodes return data, collapsing single-value returns out of the
/// enclosing tuple.
pub fn decode_output(function: &Function, data: &[u8]) -> Result<DynSolValue, Fault> {
	let mut values = function.abi_decode_output(data).map_err(|e| Fault::Decode {
		message: format!("failed to decode '{}' return data: {}", function.name, e),
	})?;
	Ok(match values.len() {
		1 => values.remove(0),
		_ => DynSolValue::Tuple(values),
	})
}
