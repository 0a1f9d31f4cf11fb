//! Local private-key wallet.
//!
//! Answers the subset of wallet requests the transfer flow issues using an
//! in-process signer. Transactions are signed locally and broadcast through
//! an Alloy provider when an RPC endpoint is configured.

use crate::{methods, InjectedProvider, RequestHandler, WalletError, WalletRequest};
use alloy_dyn_abi::TypedData;
use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport_http::Http;
use async_trait::async_trait;
use fusion_types::{with_0x_prefix, without_0x_prefix, SecretString};
use serde_json::Value;
use std::sync::Arc;

/// Wallet backed by a local private key.
pub struct LocalSigner {
	signer: PrivateKeySigner,
	chain_id: u64,
	provider: Option<Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>>,
}

impl LocalSigner {
	/// Creates a signer for `chain_id` from a hex private key.
	pub fn new(private_key: &SecretString, chain_id: u64) -> Result<Self, WalletError> {
		let signer = private_key
			.with_exposed(|key| key.trim().parse::<PrivateKeySigner>())
			.map_err(|e| WalletError::InvalidParams(format!("Invalid private key: {}", e)))?
			.with_chain_id(Some(chain_id));

		Ok(Self {
			signer,
			chain_id,
			provider: None,
		})
	}

	/// Attaches an RPC endpoint used to broadcast `eth_sendTransaction`.
	pub fn with_rpc(mut self, rpc_url: &str) -> Result<Self, WalletError> {
		let url = rpc_url
			.parse()
			.map_err(|e| WalletError::Transport(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(EthereumWallet::from(self.signer.clone()))
			.on_http(url);

		self.provider = Some(Arc::new(provider));
		Ok(self)
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	fn ensure_own_address(&self, value: Option<&Value>) -> Result<(), WalletError> {
		let requested = value
			.and_then(Value::as_str)
			.ok_or_else(|| WalletError::InvalidParams("missing signer address".into()))?
			.parse::<Address>()
			.map_err(|e| WalletError::InvalidParams(format!("invalid signer address: {}", e)))?;

		if requested != self.address() {
			return Err(WalletError::InvalidParams(format!(
				"address {} is not managed by this wallet",
				requested
			)));
		}
		Ok(())
	}

	async fn sign_typed_data(&self, params: &[Value]) -> Result<Value, WalletError> {
		self.ensure_own_address(params.first())?;

		let typed_data: TypedData = match params.get(1) {
			Some(Value::String(raw)) => serde_json::from_str(raw),
			Some(object @ Value::Object(_)) => serde_json::from_value(object.clone()),
			_ => return Err(WalletError::InvalidParams("missing typed data".into())),
		}
		.map_err(|e| WalletError::InvalidParams(format!("invalid typed data: {}", e)))?;

		let hash = typed_data
			.eip712_signing_hash()
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;

		tracing::debug!(
			primary_type = %typed_data.primary_type,
			hash = %hash,
			"Signing typed data"
		);

		let signature = self
			.signer
			.sign_hash(&hash)
			.await
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;

		Ok(Value::String(with_0x_prefix(&hex::encode(
			signature.as_bytes(),
		))))
	}

	async fn personal_sign(&self, params: &[Value]) -> Result<Value, WalletError> {
		let message = params
			.first()
			.and_then(Value::as_str)
			.ok_or_else(|| WalletError::InvalidParams("missing message".into()))?;
		self.ensure_own_address(params.get(1))?;

		let bytes = match message.strip_prefix("0x") {
			Some(_) => hex::decode(without_0x_prefix(message))
				.map_err(|e| WalletError::InvalidParams(format!("invalid message hex: {}", e)))?,
			None => message.as_bytes().to_vec(),
		};

		let signature = self
			.signer
			.sign_message(&bytes)
			.await
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;

		Ok(Value::String(with_0x_prefix(&hex::encode(
			signature.as_bytes(),
		))))
	}

	async fn send_transaction(&self, params: &[Value]) -> Result<Value, WalletError> {
		let provider = self
			.provider
			.as_ref()
			.ok_or_else(|| WalletError::Transport("no RPC endpoint configured".into()))?;

		let raw = params
			.first()
			.cloned()
			.ok_or_else(|| WalletError::InvalidParams("missing transaction".into()))?;
		let mut tx: TransactionRequest = serde_json::from_value(raw)
			.map_err(|e| WalletError::InvalidParams(format!("invalid transaction: {}", e)))?;
		tx.from = Some(self.address());

		let pending = provider
			.send_transaction(tx)
			.await
			.map_err(|e| WalletError::Transport(e.to_string()))?;
		let tx_hash = *pending.tx_hash();

		tracing::info!(tx_hash = %tx_hash, "Submitted wallet transaction");
		Ok(Value::String(tx_hash.to_string()))
	}
}

#[async_trait]
impl RequestHandler for LocalSigner {
	async fn request(&self, request: WalletRequest) -> Result<Value, WalletError> {
		match request.method.as_str() {
			methods::ETH_ACCOUNTS | methods::ETH_REQUEST_ACCOUNTS => Ok(Value::Array(vec![
				Value::String(self.address().to_checksum(None)),
			])),
			methods::ETH_CHAIN_ID => Ok(Value::String(format!("0x{:x}", self.chain_id))),
			methods::ETH_SIGN_TYPED_DATA_V4 => self.sign_typed_data(&request.params).await,
			methods::PERSONAL_SIGN => self.personal_sign(&request.params).await,
			methods::ETH_SEND_TRANSACTION => self.send_transaction(&request.params).await,
			other => Err(WalletError::UnsupportedMethod(other.to_string())),
		}
	}

	fn provider_info(&self) -> InjectedProvider {
		InjectedProvider::new("Local Signer")
	}
}
