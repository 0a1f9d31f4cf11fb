//! Wallet module for the fusion transfer system.
//!
//! The wallet is modelled the way browser wallets expose themselves: an
//! address plus an EIP-1193 style request channel accepting `{method, params}`.
//! Every interaction the relay needs (typed-data signatures, transaction
//! submission) goes through the [`RequestChannel`], which is what allows the
//! approval guard to interpose on it for the duration of one execution.

use alloy_primitives::Address;
use async_trait::async_trait;
use fusion_types::USER_REJECTED_CODE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

mod channel;
pub mod discovery;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use channel::{ChannelOverride, HandlerRef, RequestChannel};
pub use discovery::{identify, DetectedWallet, InjectedProvider};

/// JSON-RPC method names the fusion flow uses.
pub mod methods {
	pub const ETH_ACCOUNTS: &str = "eth_accounts";
	pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
	pub const ETH_CHAIN_ID: &str = "eth_chainId";
	pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
	pub const ETH_SIGN_TYPED_DATA_V4: &str = "eth_signTypedData_v4";
	pub const PERSONAL_SIGN: &str = "personal_sign";
}

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
	/// The user declined the request (EIP-1193 code 4001).
	#[error("User rejected the request: {0}")]
	UserRejected(String),
	/// The approval guard refused to forward the request.
	#[error("Approval transaction blocked: {0}")]
	GuardTripped(String),
	/// Another override is already installed on the channel.
	#[error("Wallet request channel is already guarded")]
	ChannelBusy,
	#[error("Unsupported method: {0}")]
	UnsupportedMethod(String),
	#[error("Invalid params: {0}")]
	InvalidParams(String),
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// JSON-RPC error returned by the wallet or its node.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	#[error("Transport error: {0}")]
	Transport(String),
}

impl WalletError {
	/// Builds an error from a JSON-RPC error object, recognising user rejection.
	pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
		let message = message.into();
		if code == USER_REJECTED_CODE {
			WalletError::UserRejected(message)
		} else {
			WalletError::Rpc { code, message }
		}
	}
}

/// A request sent over the wallet channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRequest {
	pub method: String,
	#[serde(default)]
	pub params: Vec<Value>,
}

impl WalletRequest {
	pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
		Self {
			method: method.into(),
			params,
		}
	}

	pub fn accounts() -> Self {
		Self::new(methods::ETH_ACCOUNTS, vec![])
	}

	pub fn chain_id() -> Self {
		Self::new(methods::ETH_CHAIN_ID, vec![])
	}

	/// `eth_sendTransaction` with a single transaction object.
	pub fn send_transaction(tx: Value) -> Self {
		Self::new(methods::ETH_SEND_TRANSACTION, vec![tx])
	}

	/// `eth_signTypedData_v4`; the typed data travels as a JSON string.
	pub fn sign_typed_data(from: Address, typed_data: &Value) -> Self {
		Self::new(
			methods::ETH_SIGN_TYPED_DATA_V4,
			vec![
				Value::String(from.to_checksum(None)),
				Value::String(typed_data.to_string()),
			],
		)
	}

	/// Returns the first param as a transaction object, if this is a send.
	pub fn transaction(&self) -> Option<&serde_json::Map<String, Value>> {
		if self.method != methods::ETH_SEND_TRANSACTION {
			return None;
		}
		self.params.first().and_then(Value::as_object)
	}
}

/// Trait implemented by anything that can answer wallet requests.
///
/// Implementations are the "provider" end of the channel: a local signer, a
/// remote signer, or an interceptor wrapping another handler.
#[async_trait]
pub trait RequestHandler: Send + Sync {
	/// Handles one request and returns its JSON result.
	async fn request(&self, request: WalletRequest) -> Result<Value, WalletError>;

	/// Describes the provider for wallet detection.
	fn provider_info(&self) -> InjectedProvider {
		InjectedProvider::default()
	}
}

/// A connected wallet: its address, chain and shared request channel.
#[derive(Clone)]
pub struct Wallet {
	address: Address,
	chain_id: u64,
	kind: DetectedWallet,
	channel: Arc<RequestChannel>,
}

impl Wallet {
	/// Connects to the handler behind `channel` by asking for its accounts and chain.
	pub async fn connect(channel: Arc<RequestChannel>) -> Result<Self, WalletError> {
		let accounts = channel.request(WalletRequest::accounts()).await?;
		let address = accounts
			.as_array()
			.and_then(|list| list.first())
			.and_then(Value::as_str)
			.ok_or_else(|| WalletError::InvalidParams("wallet returned no accounts".into()))?
			.parse::<Address>()
			.map_err(|e| WalletError::InvalidParams(format!("invalid account address: {}", e)))?;

		let chain_hex = channel.request(WalletRequest::chain_id()).await?;
		let chain_id = chain_hex
			.as_str()
			.and_then(|s| u64::from_str_radix(fusion_types::without_0x_prefix(s), 16).ok())
			.ok_or_else(|| WalletError::InvalidParams(format!("invalid chain id: {}", chain_hex)))?;

		let kind = identify(&channel.current().provider_info());
		tracing::info!(
			address = %address,
			chain_id = chain_id,
			wallet = %kind.name,
			"Connected wallet"
		);

		Ok(Self {
			address,
			chain_id,
			kind,
			channel,
		})
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	pub fn kind(&self) -> &DetectedWallet {
		&self.kind
	}

	pub fn channel(&self) -> &Arc<RequestChannel> {
		&self.channel
	}
}
