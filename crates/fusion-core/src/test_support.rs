//! In-crate fakes for the wallet, chain reader and relay.

use crate::engine::TransferEngine;
use alloy_primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;
use fusion_chain::{ChainError, ChainReader};
use fusion_config::Config;
use fusion_relay::{
	ExecutionAccount, ExecutionResult, QuoteRequest, ReceiptStatus, RelayConnector, RelayError,
	RelayInterface, SupertransactionReceipt,
};
use fusion_types::{Quote, SecretString, UserOperation};
use fusion_wallet::{methods, RequestChannel, RequestHandler, Wallet, WalletError, WalletRequest};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const TOKEN: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
pub const OWNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const RECIPIENT: Address = address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512");
pub const TX_HASH: &str = "0x9a8b7c6d5e4f30211203f4e5d6c7b8a99a8b7c6d5e4f30211203f4e5d6c7b8a9";

/// Chain reader whose answers are fixed up front; `None` makes the call fail.
#[derive(Default)]
pub struct FakeChainReader {
	pub domain_separator: Option<B256>,
	pub nonce: Option<u64>,
	pub name: Option<String>,
	pub symbol: Option<String>,
	pub decimals: Option<u8>,
	pub balance: Option<U256>,
	pub(crate) calls: Mutex<Vec<&'static str>>,
}

impl FakeChainReader {
	/// A well-behaved ERC-2612 token.
	pub fn permit_token() -> Self {
		Self {
			domain_separator: Some(B256::repeat_byte(0xab)),
			nonce: Some(0),
			name: Some("Fusion Token".into()),
			symbol: Some("FSN".into()),
			decimals: Some(18),
			balance: Some(U256::from(100_000_000_000_000_000_000u128)),
			..Default::default()
		}
	}

	pub fn calls(&self) -> Vec<&'static str> {
		self.calls.lock().unwrap().clone()
	}

	fn answer<T: Clone>(&self, method: &'static str, value: &Option<T>) -> Result<T, ChainError> {
		self.calls.lock().unwrap().push(method);
		value.clone().ok_or_else(|| ChainError::Call {
			method,
			message: "RPC error -32603: Internal JSON-RPC error".into(),
		})
	}
}

#[async_trait]
impl ChainReader for FakeChainReader {
	async fn domain_separator(&self, _token: Address) -> Result<B256, ChainError> {
		self.answer("DOMAIN_SEPARATOR", &self.domain_separator)
	}

	async fn nonces(&self, _token: Address, _owner: Address) -> Result<U256, ChainError> {
		self.answer("nonces", &self.nonce).map(U256::from)
	}

	async fn name(&self, _token: Address) -> Result<String, ChainError> {
		self.answer("name", &self.name)
	}

	async fn symbol(&self, _token: Address) -> Result<String, ChainError> {
		self.answer("symbol", &self.symbol)
	}

	async fn decimals(&self, _token: Address) -> Result<u8, ChainError> {
		self.answer("decimals", &self.decimals)
	}

	async fn balance_of(&self, _token: Address, _owner: Address) -> Result<U256, ChainError> {
		self.answer("balanceOf", &self.balance)
	}
}

/// Wallet that records every request and signs with a placeholder.
#[derive(Clone, Default)]
pub struct FakeWallet {
	requests: Arc<Mutex<Vec<WalletRequest>>>,
	reject_signatures: Arc<AtomicBool>,
}

impl FakeWallet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_reject_signatures(&self, reject: bool) {
		self.reject_signatures.store(reject, Ordering::SeqCst);
	}

	pub fn requests(&self) -> Vec<WalletRequest> {
		self.requests.lock().unwrap().clone()
	}

	/// Requests that would have prompted the user.
	pub fn prompts(&self) -> Vec<WalletRequest> {
		self.requests()
			.into_iter()
			.filter(|r| {
				r.method == methods::ETH_SIGN_TYPED_DATA_V4
					|| r.method == methods::ETH_SEND_TRANSACTION
					|| r.method == methods::PERSONAL_SIGN
			})
			.collect()
	}
}

#[async_trait]
impl RequestHandler for FakeWallet {
	async fn request(&self, request: WalletRequest) -> Result<Value, WalletError> {
		self.requests.lock().unwrap().push(request.clone());
		match request.method.as_str() {
			methods::ETH_ACCOUNTS | methods::ETH_REQUEST_ACCOUNTS => {
				Ok(json!([OWNER.to_checksum(None)]))
			}
			methods::ETH_CHAIN_ID => Ok(json!("0x89")),
			methods::ETH_SIGN_TYPED_DATA_V4 | methods::PERSONAL_SIGN => {
				if self.reject_signatures.load(Ordering::SeqCst) {
					Err(WalletError::from_rpc(4001, "User rejected the request."))
				} else {
					Ok(json!("0xsigned"))
				}
			}
			methods::ETH_SEND_TRANSACTION => Ok(json!(TX_HASH)),
			other => Err(WalletError::UnsupportedMethod(other.to_string())),
		}
	}
}

#[derive(Debug, Clone)]
pub enum QuoteScript {
	Operations(Vec<UserOperation>),
	Reject { status: u16, message: String },
	Unreachable(String),
}

#[derive(Debug, Clone)]
pub enum ExecuteScript {
	/// Requests a typed-data signature, then returns `hash`.
	Sign { hash: String },
	/// Sends an `approve` transaction to the token first, then signs.
	ApproveThenSign { hash: String },
}

#[derive(Debug, Clone)]
pub enum ReceiptScript {
	Confirm,
	Pending,
	Fail(String),
	RelayTimeout,
}

#[derive(Debug, Clone)]
pub struct RelayScript {
	pub quote: QuoteScript,
	pub execute: ExecuteScript,
	pub receipt: ReceiptScript,
}

impl Default for RelayScript {
	fn default() -> Self {
		Self {
			quote: QuoteScript::Operations(vec![transfer_op()]),
			execute: ExecuteScript::Sign {
				hash: TX_HASH.to_string(),
			},
			receipt: ReceiptScript::Confirm,
		}
	}
}

pub fn transfer_op() -> UserOperation {
	UserOperation {
		call_data: Bytes::from_static(&[0xa9, 0x05, 0x9c, 0xbb, 0x00, 0x01]),
		target: OWNER,
	}
}

pub fn approve_op() -> UserOperation {
	UserOperation {
		call_data: Bytes::from_static(&[0x09, 0x5e, 0xa7, 0xb3, 0x00, 0x01]),
		target: OWNER,
	}
}

#[derive(Debug, Clone, Default)]
pub struct RelayLog {
	pub connects: usize,
	pub quotes: Vec<QuoteRequest>,
	pub executes: usize,
	pub receipts: Vec<String>,
}

pub struct FakeConnector {
	script: RelayScript,
	log: Arc<Mutex<RelayLog>>,
}

impl FakeConnector {
	pub fn new(script: RelayScript) -> Self {
		Self {
			script,
			log: Arc::new(Mutex::new(RelayLog::default())),
		}
	}

	pub fn log(&self) -> RelayLog {
		self.log.lock().unwrap().clone()
	}
}

#[async_trait]
impl RelayConnector for FakeConnector {
	async fn connect(
		&self,
		_account: &ExecutionAccount,
		_api_key: &SecretString,
	) -> Result<Arc<dyn RelayInterface>, RelayError> {
		self.log.lock().unwrap().connects += 1;
		Ok(Arc::new(FakeRelay {
			script: self.script.clone(),
			log: Arc::clone(&self.log),
		}))
	}
}

struct FakeRelay {
	script: RelayScript,
	log: Arc<Mutex<RelayLog>>,
}

#[async_trait]
impl RelayInterface for FakeRelay {
	async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, RelayError> {
		self.log.lock().unwrap().quotes.push(request.clone());
		match &self.script.quote {
			QuoteScript::Operations(operations) => Ok(Quote {
				sponsorship_requested: request.sponsorship,
				operations: operations.clone(),
				payload: json!({ "quote": { "userOps": [] } }),
			}),
			QuoteScript::Reject { status, message } => Err(RelayError::Rejected {
				status: *status,
				message: message.clone(),
			}),
			QuoteScript::Unreachable(message) => Err(RelayError::Transport(message.clone())),
		}
	}

	async fn execute(
		&self,
		_quote: &Quote,
		channel: &RequestChannel,
	) -> Result<ExecutionResult, RelayError> {
		self.log.lock().unwrap().executes += 1;
		let hash = match &self.script.execute {
			ExecuteScript::Sign { hash } => hash.clone(),
			ExecuteScript::ApproveThenSign { hash } => {
				channel
					.request(WalletRequest::send_transaction(json!({
						"from": OWNER.to_checksum(None),
						"to": TOKEN.to_string().to_lowercase(),
						"data": "0x095ea7b30000000000000000000000000000000000000000000000000000000000000001",
					})))
					.await?;
				hash.clone()
			}
		};

		channel
			.request(WalletRequest::sign_typed_data(OWNER, &json!({ "primaryType": "Permit" })))
			.await?;
		Ok(ExecutionResult { hash })
	}

	async fn wait_for_receipt(&self, hash: &str) -> Result<SupertransactionReceipt, RelayError> {
		self.log.lock().unwrap().receipts.push(hash.to_string());
		match &self.script.receipt {
			ReceiptScript::Confirm => Ok(SupertransactionReceipt {
				hash: hash.to_string(),
				status: ReceiptStatus::Success,
				raw: Value::Null,
			}),
			ReceiptScript::Pending => std::future::pending().await,
			ReceiptScript::Fail(message) => Err(RelayError::ExecutionFailed(message.clone())),
			ReceiptScript::RelayTimeout => Err(RelayError::Timeout(600)),
		}
	}
}

/// Config used by engine tests, optionally without an API key.
fn config(api_key: Option<&str>, receipt_timeout: Option<u64>) -> Config {
	let api_key = api_key
		.map(|key| format!("api_key = \"{}\"\n", key))
		.unwrap_or_default();
	let transfer = receipt_timeout
		.map(|secs| format!("[transfer]\nreceipt_timeout_seconds = {}\n", secs))
		.unwrap_or_default();

	format!(
		r#"
[network]
chain_id = 137
name = "Polygon"
rpc_url = "https://polygon-rpc.com"

[relay]
{api_key}project_id = "project-1"

[token]
address = "{token}"
decimals = 18
symbol = "FSN"
name = "Fusion Token"

[wallet]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

{transfer}"#,
		api_key = api_key,
		token = TOKEN.to_checksum(None),
		transfer = transfer,
	)
	.parse()
	.unwrap()
}

pub struct Harness {
	pub engine: Arc<TransferEngine>,
	pub wallet: FakeWallet,
	pub reader: Arc<FakeChainReader>,
	pub connector: Arc<FakeConnector>,
	pub channel: Arc<RequestChannel>,
}

pub struct HarnessBuilder {
	api_key: Option<String>,
	receipt_timeout: Option<u64>,
	reader: FakeChainReader,
	script: RelayScript,
}

impl Default for HarnessBuilder {
	fn default() -> Self {
		Self {
			api_key: Some("mee_test_key".into()),
			receipt_timeout: None,
			reader: FakeChainReader::permit_token(),
			script: RelayScript::default(),
		}
	}
}

impl HarnessBuilder {
	pub fn without_api_key(mut self) -> Self {
		self.api_key = None;
		self
	}

	pub fn receipt_timeout(mut self, secs: u64) -> Self {
		self.receipt_timeout = Some(secs);
		self
	}

	pub fn reader(mut self, reader: FakeChainReader) -> Self {
		self.reader = reader;
		self
	}

	pub fn script(mut self, script: RelayScript) -> Self {
		self.script = script;
		self
	}

	pub async fn build(self) -> Harness {
		let config = config(self.api_key.as_deref(), self.receipt_timeout);
		let wallet = FakeWallet::new();
		let channel = Arc::new(RequestChannel::new(Box::new(wallet.clone())));
		let connected = Wallet::connect(Arc::clone(&channel)).await.unwrap();
		let reader = Arc::new(self.reader);
		let connector = Arc::new(FakeConnector::new(self.script));

		let engine = TransferEngine::new(&config, connected, reader.clone(), connector.clone());

		Harness {
			engine: Arc::new(engine),
			wallet,
			reader,
			connector,
			channel,
		}
	}
}
