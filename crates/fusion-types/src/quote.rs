//! Sponsored quote types.
//!
//! A quote is owned by exactly one in-flight transfer and is discarded after
//! execution or rejection. The raw relay payload is carried untouched so the
//! relay can execute exactly what it quoted.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// Function selector of ERC-20 `approve(address,uint256)`.
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Read-only view of one operation the sponsor intends to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
	pub call_data: Bytes,
	pub target: Address,
}

impl UserOperation {
	/// Returns the leading 4-byte function selector, if the call data has one.
	pub fn selector(&self) -> Option<[u8; 4]> {
		self.call_data
			.get(..4)
			.and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
	}

	/// Returns true when the call data starts with the `approve` selector.
	pub fn is_approve_call(&self) -> bool {
		self.selector() == Some(APPROVE_SELECTOR)
	}
}

/// Sponsored execution quote returned by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	pub sponsorship_requested: bool,
	pub operations: Vec<UserOperation>,
	/// Provider payload exactly as returned by the relay.
	pub payload: serde_json::Value,
}

impl Quote {
	/// Returns the operations whose call data starts with the `approve` selector.
	pub fn approval_operations(&self) -> impl Iterator<Item = &UserOperation> {
		self.operations.iter().filter(|op| op.is_approve_call())
	}
}
