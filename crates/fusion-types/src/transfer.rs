//! Transfer request types.
//!
//! A [`TransferRequest`] is built from user input and is immutable once it is
//! handed to the engine. The [`TransferForm`] is the mutable input state a
//! session owns between attempts.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
	#[error("Please fill in all fields (missing: {})", .0.join(", "))]
	MissingFields(Vec<&'static str>),
	#[error("Invalid {field} address: {value}")]
	InvalidAddress { field: &'static str, value: String },
}

/// A transfer as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
	pub token_address: String,
	pub recipient_address: String,
	/// Human-entered decimal amount, e.g. "1.5".
	pub amount: String,
	pub token_decimals: u8,
}

/// A request whose fields are present and whose addresses parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
	pub token: Address,
	pub recipient: Address,
	pub amount: String,
	pub decimals: u8,
}

impl TransferRequest {
	/// Checks that every field is present and that both addresses parse.
	///
	/// The amount is only checked for presence here; its numeric form is
	/// validated when it is converted to minor units.
	pub fn validate(&self) -> Result<ValidatedTransfer, InputError> {
		let mut missing = Vec::new();
		if self.recipient_address.trim().is_empty() {
			missing.push("recipient");
		}
		if self.token_address.trim().is_empty() {
			missing.push("token address");
		}
		if self.amount.trim().is_empty() {
			missing.push("amount");
		}
		if !missing.is_empty() {
			return Err(InputError::MissingFields(missing));
		}

		let token = parse_address("token", &self.token_address)?;
		let recipient = parse_address("recipient", &self.recipient_address)?;

		Ok(ValidatedTransfer {
			token,
			recipient,
			amount: self.amount.trim().to_string(),
			decimals: self.token_decimals,
		})
	}
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, InputError> {
	value
		.trim()
		.parse::<Address>()
		.map_err(|_| InputError::InvalidAddress {
			field,
			value: value.to_string(),
		})
}

/// Input fields owned by a transfer session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferForm {
	pub recipient_address: String,
	pub token_address: String,
	pub amount: String,
	pub decimals: u8,
}

impl TransferForm {
	pub fn new(token_address: impl Into<String>, decimals: u8) -> Self {
		Self {
			token_address: token_address.into(),
			decimals,
			..Default::default()
		}
	}

	/// Snapshots the form into an immutable request.
	pub fn to_request(&self) -> TransferRequest {
		TransferRequest {
			token_address: self.token_address.clone(),
			recipient_address: self.recipient_address.clone(),
			amount: self.amount.clone(),
			token_decimals: self.decimals,
		}
	}

	/// Clears the per-transfer fields; token and decimals are kept.
	pub fn reset_after_success(&mut self) {
		self.recipient_address.clear();
		self.amount.clear();
	}
}
