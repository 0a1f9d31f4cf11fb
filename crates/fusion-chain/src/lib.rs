//! Chain read access for the fusion transfer system.
//!
//! Everything the transfer flow needs from the node is a read-only contract
//! call against the token: permit metadata for the capability probe, and
//! name/symbol/decimals/balance for display. Writes go through the wallet
//! channel, never through this crate.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use thiserror::Error;

pub mod token;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use token::TokenInfo;

/// Errors that can occur while reading chain state.
#[derive(Debug, Error)]
pub enum ChainError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The node answered the call with an error (revert, missing method, ...).
	#[error("Call to {method} failed: {message}")]
	Call { method: &'static str, message: String },
	/// The call succeeded but its return data could not be decoded.
	#[error("Invalid response from {method}: {message}")]
	InvalidResponse { method: &'static str, message: String },
}

/// Read-only access to an ERC-20 token contract.
#[async_trait]
pub trait ChainReader: Send + Sync {
	/// Reads `DOMAIN_SEPARATOR()`.
	async fn domain_separator(&self, token: Address) -> Result<B256, ChainError>;

	/// Reads `nonces(owner)`.
	async fn nonces(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

	async fn name(&self, token: Address) -> Result<String, ChainError>;

	async fn symbol(&self, token: Address) -> Result<String, ChainError>;

	async fn decimals(&self, token: Address) -> Result<u8, ChainError>;

	async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError>;
}
