//! HTTP client for a modular execution environment (MEE) sponsor node.
//!
//! Endpoints used:
//! - `POST {base}/v1/quote` prices a sponsored execution.
//! - `POST {base}/v1/exec` submits a signed quote.
//! - `GET {base}/v1/explorer/{hash}` reports settlement.
//!
//! Every call carries the project API key in the `X-API-Key` header.

use crate::types::{error_message, parse_quote};
use crate::{
	ExecutionAccount, ExecutionResult, QuoteRequest, ReceiptStatus, RelayConnector, RelayError,
	RelayInterface, SupertransactionReceipt,
};
use async_trait::async_trait;
use fusion_types::{truncate_id, Quote, SecretString};
use fusion_wallet::{RequestChannel, WalletRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const API_KEY_HEADER: &str = "X-API-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds [`MeeRelay`] clients for a sponsor node.
pub struct MeeConnector {
	base_url: String,
	poll_interval: Duration,
	max_wait: Duration,
}

impl MeeConnector {
	pub fn new(base_url: impl Into<String>, poll_interval: Duration, max_wait: Duration) -> Self {
		Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			poll_interval,
			max_wait,
		}
	}
}

#[async_trait]
impl RelayConnector for MeeConnector {
	async fn connect(
		&self,
		account: &ExecutionAccount,
		api_key: &SecretString,
	) -> Result<Arc<dyn RelayInterface>, RelayError> {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| RelayError::Transport(format!("Failed to build HTTP client: {}", e)))?;

		tracing::debug!(
			base_url = %self.base_url,
			chain_id = account.chain_id,
			version = %account.version,
			"Created relay client"
		);

		Ok(Arc::new(MeeRelay {
			client,
			base_url: self.base_url.clone(),
			api_key: api_key.clone(),
			account: account.clone(),
			poll_interval: self.poll_interval,
			max_wait: self.max_wait,
		}))
	}
}

/// Relay client bound to one execution account.
pub struct MeeRelay {
	client: reqwest::Client,
	base_url: String,
	api_key: SecretString,
	account: ExecutionAccount,
	poll_interval: Duration,
	max_wait: Duration,
}

impl MeeRelay {
	fn url(&self, path: &str) -> String {
		format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
	}

	async fn post(&self, path: &str, body: &Value) -> Result<Value, RelayError> {
		let response = self
			.api_key
			.with_exposed(|key| {
				self.client
					.post(self.url(path))
					.header(API_KEY_HEADER, key)
					.json(body)
			})
			.send()
			.await
			.map_err(|e| RelayError::Transport(e.to_string()))?;
		Self::read_json(response).await
	}

	async fn get(&self, path: &str) -> Result<Value, RelayError> {
		let response = self
			.api_key
			.with_exposed(|key| self.client.get(self.url(path)).header(API_KEY_HEADER, key))
			.send()
			.await
			.map_err(|e| RelayError::Transport(e.to_string()))?;
		Self::read_json(response).await
	}

	async fn read_json(response: reqwest::Response) -> Result<Value, RelayError> {
		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| RelayError::Transport(e.to_string()))?;

		if !status.is_success() {
			return Err(RelayError::Rejected {
				status: status.as_u16(),
				message: error_message(&body),
			});
		}

		serde_json::from_str(&body).map_err(|e| RelayError::InvalidResponse(e.to_string()))
	}

	/// Collects everything the wallet must provide before submission.
	///
	/// When the quote's trigger is an on-chain token approval, the approval
	/// transaction is sent first; the quote's typed data is then signed.
	pub async fn authorize(
		&self,
		quote: &Quote,
		channel: &RequestChannel,
	) -> Result<String, RelayError> {
		let payload = &quote.payload;
		let onchain_trigger = payload
			.pointer("/trigger/type")
			.and_then(Value::as_str)
			.is_some_and(|kind| kind.eq_ignore_ascii_case("onchain"));

		if onchain_trigger {
			let tx = payload
				.pointer("/trigger/tx")
				.cloned()
				.ok_or_else(|| RelayError::InvalidResponse("onchain trigger without tx".into()))?;
			let mut tx = match tx {
				Value::Object(map) => map,
				_ => return Err(RelayError::InvalidResponse("trigger tx is not an object".into())),
			};
			tx.insert(
				"from".to_string(),
				Value::String(self.account.signer.to_checksum(None)),
			);

			tracing::info!("Sending on-chain trigger transaction");
			channel
				.request(WalletRequest::send_transaction(Value::Object(tx)))
				.await?;
		}

		let typed_data = payload
			.get("typedData")
			.ok_or_else(|| RelayError::InvalidResponse("quote has no typedData".into()))?;

		let signature = channel
			.request(WalletRequest::sign_typed_data(self.account.signer, typed_data))
			.await?;

		signature
			.as_str()
			.map(str::to_string)
			.ok_or_else(|| RelayError::InvalidResponse("wallet returned a non-string signature".into()))
	}
}

#[async_trait]
impl RelayInterface for MeeRelay {
	#[instrument(skip_all, fields(chain_id = request.trigger.chain_id))]
	async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, RelayError> {
		let body =
			serde_json::to_value(request).map_err(|e| RelayError::InvalidResponse(e.to_string()))?;
		let payload = self.post("quote", &body).await?;
		let quote = parse_quote(payload, request.sponsorship)?;

		tracing::info!(operations = quote.operations.len(), "Received quote");
		Ok(quote)
	}

	#[instrument(skip_all)]
	async fn execute(
		&self,
		quote: &Quote,
		channel: &RequestChannel,
	) -> Result<ExecutionResult, RelayError> {
		let signature = self.authorize(quote, channel).await?;

		let response = self
			.post(
				"exec",
				&json!({
					"quote": quote.payload,
					"signature": signature,
				}),
			)
			.await?;

		let hash = ["hash", "transactionHash"]
			.iter()
			.find_map(|key| response.get(key).and_then(Value::as_str))
			.unwrap_or_default()
			.to_string();

		tracing::info!(hash = %truncate_id(&hash), "Submitted super-transaction");
		Ok(ExecutionResult { hash })
	}

	#[instrument(skip_all, fields(hash = %truncate_id(hash)))]
	async fn wait_for_receipt(&self, hash: &str) -> Result<SupertransactionReceipt, RelayError> {
		let start_time = tokio::time::Instant::now();

		loop {
			if start_time.elapsed() > self.max_wait {
				tracing::warn!(
					waited_secs = self.max_wait.as_secs(),
					"Receipt wait ceiling reached"
				);
				return Err(RelayError::Timeout(self.max_wait.as_secs()));
			}

			match self.get(&format!("explorer/{}", hash)).await {
				Ok(raw) => {
					let status = raw
						.get("transactionStatus")
						.and_then(Value::as_str)
						.map(ReceiptStatus::from_relay)
						.unwrap_or(ReceiptStatus::Pending);

					match status {
						ReceiptStatus::Success => {
							tracing::info!("Super-transaction confirmed");
							return Ok(SupertransactionReceipt {
								hash: hash.to_string(),
								status,
								raw,
							});
						}
						ReceiptStatus::Failed => {
							let message = raw
								.get("message")
								.and_then(Value::as_str)
								.unwrap_or("super-transaction reverted")
								.to_string();
							return Err(RelayError::ExecutionFailed(message));
						}
						ReceiptStatus::Pending => {
							tracing::debug!(
								elapsed_secs = start_time.elapsed().as_secs(),
								"Waiting for settlement"
							);
						}
					}
				}
				Err(RelayError::Rejected { status: 404, .. }) => {
					tracing::debug!("Super-transaction not indexed yet");
				}
				Err(RelayError::Transport(e)) => {
					tracing::warn!(error = %e, "Checking receipt status failed");
				}
				Err(e) => return Err(e),
			}

			tokio::time::sleep(self.poll_interval).await;
		}
	}
}
