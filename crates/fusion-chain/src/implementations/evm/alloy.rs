//! Alloy-based chain reader.
//!
//! Token reads are plain `eth_call`s against an HTTP provider. Call data is
//! encoded and return data decoded with the `IERC20Permit` bindings.

use crate::{ChainError, ChainReader};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use alloy_transport_http::Http;
use async_trait::async_trait;
use fusion_types::contracts::IERC20Permit;
use std::sync::Arc;

/// EVM chain reader backed by an Alloy HTTP provider.
pub struct AlloyChainReader {
	chain_id: u64,
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
}

impl AlloyChainReader {
	/// Creates a reader for `chain_id` talking to `rpc_url`.
	pub fn new(chain_id: u64, rpc_url: &str) -> Result<Self, ChainError> {
		let url = rpc_url.parse().map_err(|e| {
			ChainError::Network(format!("Invalid RPC URL for chain {}: {}", chain_id, e))
		})?;

		let provider = ProviderBuilder::new().on_http(url);

		Ok(Self {
			chain_id,
			provider: Arc::new(provider),
		})
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	/// Executes a read-only call and decodes its return value.
	async fn call<C: SolCall + Send>(
		&self,
		method: &'static str,
		token: Address,
		call: C,
	) -> Result<C::Return, ChainError> {
		let request = TransactionRequest::default()
			.to(token)
			.input(call.abi_encode().into());

		let output = self.provider.call(&request).await.map_err(|e| {
			tracing::warn!(
				chain_id = self.chain_id,
				token = %token,
				method = method,
				error = %e,
				"Token call failed"
			);
			ChainError::Call {
				method,
				message: e.to_string(),
			}
		})?;

		C::abi_decode_returns(&output, true).map_err(|e| ChainError::InvalidResponse {
			method,
			message: e.to_string(),
		})
	}
}

#[async_trait]
impl ChainReader for AlloyChainReader {
	async fn domain_separator(&self, token: Address) -> Result<B256, ChainError> {
		let ret = self
			.call("DOMAIN_SEPARATOR", token, IERC20Permit::DOMAIN_SEPARATORCall {})
			.await?;
		Ok(ret._0)
	}

	async fn nonces(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
		let ret = self
			.call("nonces", token, IERC20Permit::noncesCall { owner })
			.await?;
		Ok(ret._0)
	}

	async fn name(&self, token: Address) -> Result<String, ChainError> {
		let ret = self.call("name", token, IERC20Permit::nameCall {}).await?;
		Ok(ret._0)
	}

	async fn symbol(&self, token: Address) -> Result<String, ChainError> {
		let ret = self.call("symbol", token, IERC20Permit::symbolCall {}).await?;
		Ok(ret._0)
	}

	async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
		let ret = self
			.call("decimals", token, IERC20Permit::decimalsCall {})
			.await?;
		Ok(ret._0)
	}

	async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
		let ret = self
			.call(
				"balanceOf",
				token,
				IERC20Permit::balanceOfCall { account: owner },
			)
			.await?;
		Ok(ret._0)
	}
}
