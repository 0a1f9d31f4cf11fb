//! Conversion between human-entered decimal amounts and token minor units.

use alloy_primitives::U256;
use thiserror::Error;

/// Errors raised while converting a decimal amount to minor units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
	#[error("Amount is empty")]
	Empty,
	#[error("Invalid amount '{0}': expected a positive decimal number")]
	Malformed(String),
	#[error("Amount '{amount}' has more than {decimals} decimal places")]
	TooPrecise { amount: String, decimals: u8 },
	#[error("Amount '{0}' does not fit in 256 bits")]
	Overflow(String),
}

/// Parses a decimal string such as "1.5" into minor units.
///
/// Excess precision is rejected rather than rounded so that the amount the
/// user typed is exactly the amount quoted.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
	let amount = amount.trim();
	if amount.is_empty() {
		return Err(UnitsError::Empty);
	}

	let (integer_part, fraction_part) = amount.split_once('.').unwrap_or((amount, ""));
	let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if (integer_part.is_empty() && fraction_part.is_empty())
		|| !all_digits(integer_part)
		|| !all_digits(fraction_part)
	{
		return Err(UnitsError::Malformed(amount.to_string()));
	}

	if fraction_part.len() > decimals as usize {
		return Err(UnitsError::TooPrecise {
			amount: amount.to_string(),
			decimals,
		});
	}

	let digits = format!(
		"{}{:0<width$}",
		integer_part,
		fraction_part,
		width = decimals as usize
	);
	let digits = digits.trim_start_matches('0');
	if digits.is_empty() {
		return Ok(U256::ZERO);
	}

	U256::from_str_radix(digits, 10).map_err(|_| UnitsError::Overflow(amount.to_string()))
}

/// Formats minor units for display, trimming trailing fractional zeros.
///
/// Produces strings like "1.5" or "1000".
pub fn format_units(amount: U256, decimals: u8) -> String {
	let raw = amount.to_string();
	if decimals == 0 {
		return raw;
	}

	let decimal_places = decimals as usize;
	let (integer_part, decimal_part) = if raw.len() <= decimal_places {
		("0".to_string(), format!("{:0>width$}", raw, width = decimal_places))
	} else {
		let split_pos = raw.len() - decimal_places;
		(raw[..split_pos].to_string(), raw[split_pos..].to_string())
	};

	let decimal_trimmed = decimal_part.trim_end_matches('0');
	if decimal_trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, decimal_trimmed)
	}
}
