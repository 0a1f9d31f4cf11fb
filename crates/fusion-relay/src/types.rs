//! Request and response types exchanged with the relay.

use crate::RelayError;
use alloy_primitives::{Address, Bytes, U256};
use fusion_types::{Quote, UserOperation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Multichain execution account bound to the connected signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionAccount {
	/// Address of the wallet that owns the account.
	pub signer: Address,
	pub chain_id: u64,
	pub rpc_url: String,
	/// Protocol version of the sponsor's execution environment.
	pub version: String,
}

/// One call the super-transaction performs on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposableInstruction {
	pub chain_id: u64,
	pub to: Address,
	pub call_data: Bytes,
	#[serde(default)]
	pub value: U256,
}

/// Token pull that funds the super-transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
	pub chain_id: u64,
	pub token_address: Address,
	pub amount: U256,
}

/// Body of a quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
	pub account: ExecutionAccount,
	pub sponsorship: bool,
	pub trigger: Trigger,
	pub instructions: Vec<ComposableInstruction>,
}

/// What the relay returns after accepting a signed quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
	/// Super-transaction hash; empty when the relay returned none.
	#[serde(default)]
	pub hash: String,
}

/// Settlement state reported by the relay explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
	Pending,
	Success,
	Failed,
}

impl ReceiptStatus {
	/// Maps the relay's `transactionStatus` string.
	pub fn from_relay(status: &str) -> Self {
		match status.to_ascii_uppercase().as_str() {
			"SUCCESS" | "MINED_SUCCESS" | "COMPLETED" => ReceiptStatus::Success,
			"FAILED" | "MINED_FAIL" | "REVERTED" => ReceiptStatus::Failed,
			_ => ReceiptStatus::Pending,
		}
	}
}

/// Final receipt of a settled super-transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupertransactionReceipt {
	pub hash: String,
	pub status: ReceiptStatus,
	/// Raw explorer response.
	pub raw: Value,
}

/// Builds a [`Quote`] from the relay's quote response.
///
/// Operations are read from `quote.userOps[].userOp`; an operation without
/// call data is kept with empty call data so it still counts as inspected.
pub fn parse_quote(payload: Value, sponsorship_requested: bool) -> Result<Quote, RelayError> {
	let user_ops = payload
		.pointer("/quote/userOps")
		.and_then(Value::as_array)
		.ok_or_else(|| RelayError::InvalidResponse("quote has no userOps".into()))?;

	let mut operations = Vec::with_capacity(user_ops.len());
	for (index, entry) in user_ops.iter().enumerate() {
		let op = entry.get("userOp").unwrap_or(entry);

		let call_data = match op.get("callData").and_then(Value::as_str) {
			Some(raw) => raw.parse::<Bytes>().map_err(|e| {
				RelayError::InvalidResponse(format!("userOp {} has invalid callData: {}", index, e))
			})?,
			None => Bytes::new(),
		};
		let target = match op.get("sender").and_then(Value::as_str) {
			Some(raw) => raw.parse::<Address>().map_err(|e| {
				RelayError::InvalidResponse(format!("userOp {} has invalid sender: {}", index, e))
			})?,
			None => Address::ZERO,
		};

		operations.push(UserOperation { call_data, target });
	}

	Ok(Quote {
		sponsorship_requested,
		operations,
		payload,
	})
}

/// Pulls a human-readable message out of a relay error body.
pub(crate) fn error_message(body: &str) -> String {
	serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|value| {
			["message", "error", "errors"]
				.iter()
				.find_map(|key| value.get(key).map(render_error_field))
		})
		.unwrap_or_else(|| body.trim().to_string())
}

fn render_error_field(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Array(items) => items
			.iter()
			.map(render_error_field)
			.collect::<Vec<_>>()
			.join("; "),
		Value::Object(map) => map
			.get("message")
			.map(render_error_field)
			.unwrap_or_else(|| value.to_string()),
		other => other.to_string(),
	}
}
