//! Sponsor relay module for the fusion transfer system.
//!
//! The relay is the off-chain service that prices a sponsored execution,
//! collects the user's signature through the wallet channel, submits the
//! resulting super-transaction and reports its settlement. The transfer flow
//! treats it as opaque: it only sees quotes, an execution hash and a receipt.

use async_trait::async_trait;
use fusion_types::{Quote, SecretString};
use fusion_wallet::{RequestChannel, WalletError};
use std::sync::Arc;
use thiserror::Error;

pub mod types;

/// Re-export implementations
pub mod implementations {
	pub mod mee;
}

pub use types::{
	ComposableInstruction, ExecutionAccount, ExecutionResult, QuoteRequest, ReceiptStatus,
	SupertransactionReceipt, Trigger,
};

/// Errors that can occur while talking to the relay.
#[derive(Debug, Error)]
pub enum RelayError {
	/// The relay could not be reached.
	#[error("Transport error: {0}")]
	Transport(String),
	/// The relay answered with an error status.
	#[error("Relay rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	/// A wallet request issued during execution failed.
	#[error(transparent)]
	Wallet(#[from] WalletError),
	/// The relay answered with a body we could not interpret.
	#[error("Invalid relay response: {0}")]
	InvalidResponse(String),
	/// The super-transaction settled unsuccessfully.
	#[error("Execution failed: {0}")]
	ExecutionFailed(String),
	/// The relay's own receipt wait ceiling was reached.
	#[error("Timed out after {0}s waiting for receipt")]
	Timeout(u64),
}

/// Trait defining the interface of a connected relay client.
#[async_trait]
pub trait RelayInterface: Send + Sync {
	/// Requests a quote for the given trigger and instructions.
	async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, RelayError>;

	/// Executes a quote, issuing every wallet request through `channel`.
	///
	/// Returns the relay's identifier for the submitted super-transaction.
	async fn execute(
		&self,
		quote: &Quote,
		channel: &RequestChannel,
	) -> Result<ExecutionResult, RelayError>;

	/// Suspends until the relay reports settlement of `hash`.
	async fn wait_for_receipt(&self, hash: &str) -> Result<SupertransactionReceipt, RelayError>;
}

/// Creates relay clients bound to an execution account.
#[async_trait]
pub trait RelayConnector: Send + Sync {
	async fn connect(
		&self,
		account: &ExecutionAccount,
		api_key: &SecretString,
	) -> Result<Arc<dyn RelayInterface>, RelayError>;
}
