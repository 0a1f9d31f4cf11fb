//! Token metadata and balance lookup with display fallbacks.

use crate::ChainReader;
use alloy_primitives::{Address, U256};
use fusion_types::format_units;
use serde::{Deserialize, Serialize};

/// Placeholder used for a name or symbol the token did not report.
pub const UNKNOWN: &str = "Unknown";
pub const DEFAULT_DECIMALS: u8 = 18;

/// Display information about a token and the connected account's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
	pub address: Address,
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	/// Balance in minor units; zero when it could not be read.
	pub balance: U256,
	/// False when the decimals call failed and the default was assumed.
	pub decimals_verified: bool,
}

impl TokenInfo {
	/// Reads all token fields concurrently, substituting fallbacks for failed calls.
	///
	/// A token that answers none of the calls still yields a usable value:
	/// name and symbol "Unknown", 18 decimals and a zero balance.
	pub async fn fetch(reader: &dyn ChainReader, token: Address, owner: Address) -> Self {
		let (name, symbol, decimals, balance) = tokio::join!(
			reader.name(token),
			reader.symbol(token),
			reader.decimals(token),
			reader.balance_of(token, owner),
		);

		let decimals_verified = decimals.is_ok();
		let info = Self {
			address: token,
			name: name.unwrap_or_else(|e| {
				tracing::debug!(token = %token, error = %e, "Falling back to unknown token name");
				UNKNOWN.to_string()
			}),
			symbol: symbol.unwrap_or_else(|_| UNKNOWN.to_string()),
			decimals: decimals.unwrap_or(DEFAULT_DECIMALS),
			balance: balance.unwrap_or_else(|e| {
				tracing::warn!(token = %token, error = %e, "Failed to read token balance");
				U256::ZERO
			}),
			decimals_verified,
		};

		tracing::info!(
			token = %token,
			symbol = %info.symbol,
			decimals = info.decimals,
			balance = %info.formatted_balance(),
			"Loaded token info"
		);
		info
	}

	/// Balance in human units, e.g. "102".
	pub fn formatted_balance(&self) -> String {
		format_units(self.balance, self.decimals)
	}

	/// Symbol for messages, or "tokens" when the token reported none.
	pub fn display_symbol(&self) -> &str {
		if self.symbol.trim().is_empty() {
			"tokens"
		} else {
			&self.symbol
		}
	}
}
