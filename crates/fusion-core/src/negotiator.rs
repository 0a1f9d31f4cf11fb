//! Sponsored quote negotiation.
//!
//! Negotiation is split into the steps the transfer state machine reports
//! individually. [`QuoteNegotiator::negotiate_with`] runs them back to back and
//! announces each state before its step starts.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use fusion_relay::{
	ComposableInstruction, ExecutionAccount, QuoteRequest, RelayConnector, RelayError,
	RelayInterface, Trigger,
};
use fusion_types::contracts::IERC20Permit;
use crate::state::StateError;
use fusion_types::{
	parse_units, CapabilityMethod, PermitCapability, Quote, SecretString, TransferState, UnitsError,
	ValidatedTransfer,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur while negotiating a quote.
#[derive(Debug, Error)]
pub enum NegotiationError {
	#[error("Sponsor API key is not configured. Please check your configuration.")]
	MissingApiKey,
	#[error("Invalid amount: {0}")]
	InvalidAmount(#[from] UnitsError),
	#[error(transparent)]
	Relay(#[from] RelayError),
	/// The step hook refused to move on.
	#[error(transparent)]
	Step(#[from] StateError),
}

/// Chain and credential settings the negotiator binds accounts to.
#[derive(Debug, Clone)]
pub struct NegotiatorConfig {
	pub chain_id: u64,
	pub rpc_url: String,
	pub version: String,
	pub api_key: Option<SecretString>,
}

/// A quote together with the client that produced it.
pub struct Negotiated {
	pub client: Arc<dyn RelayInterface>,
	pub account: ExecutionAccount,
	pub quote: Quote,
	/// Transfer amount in minor units.
	pub amount: U256,
}

pub struct QuoteNegotiator {
	config: NegotiatorConfig,
	connector: Arc<dyn RelayConnector>,
}

impl QuoteNegotiator {
	pub fn new(config: NegotiatorConfig, connector: Arc<dyn RelayConnector>) -> Self {
		Self { config, connector }
	}

	/// Returns the sponsor API key, failing when it is absent.
	pub fn api_key(&self) -> Result<&SecretString, NegotiationError> {
		self.config
			.api_key
			.as_ref()
			.filter(|key| !key.is_blank())
			.ok_or(NegotiationError::MissingApiKey)
	}

	/// Binds a multichain execution account to `signer` on the configured chain.
	pub fn build_account(&self, signer: Address) -> ExecutionAccount {
		ExecutionAccount {
			signer,
			chain_id: self.config.chain_id,
			rpc_url: self.config.rpc_url.clone(),
			version: self.config.version.clone(),
		}
	}

	pub async fn connect(
		&self,
		account: &ExecutionAccount,
		api_key: &SecretString,
	) -> Result<Arc<dyn RelayInterface>, NegotiationError> {
		Ok(self.connector.connect(account, api_key).await?)
	}

	/// Encodes `transfer(recipient, amount)` against the token.
	///
	/// Returns the instruction and the amount in minor units.
	pub fn build_instruction(
		&self,
		transfer: &ValidatedTransfer,
	) -> Result<(ComposableInstruction, U256), NegotiationError> {
		let amount = parse_units(&transfer.amount, transfer.decimals)?;
		let call = IERC20Permit::transferCall {
			to: transfer.recipient,
			value: amount,
		};

		let instruction = ComposableInstruction {
			chain_id: self.config.chain_id,
			to: transfer.token,
			call_data: call.abi_encode().into(),
			value: U256::ZERO,
		};
		Ok((instruction, amount))
	}

	pub fn build_trigger(&self, token: Address, amount: U256) -> Trigger {
		Trigger {
			chain_id: self.config.chain_id,
			token_address: token,
			amount,
		}
	}

	/// Requests a sponsored quote for one instruction.
	pub async fn request_quote(
		&self,
		client: &dyn RelayInterface,
		account: &ExecutionAccount,
		trigger: Trigger,
		instruction: ComposableInstruction,
	) -> Result<Quote, NegotiationError> {
		let request = QuoteRequest {
			account: account.clone(),
			sponsorship: true,
			trigger,
			instructions: vec![instruction],
		};
		Ok(client.get_quote(&request).await?)
	}

	/// Runs every negotiation step for `transfer` on behalf of `signer`.
	pub async fn negotiate(
		&self,
		transfer: &ValidatedTransfer,
		signer: Address,
		capability: &PermitCapability,
	) -> Result<Negotiated, NegotiationError> {
		self.negotiate_with(transfer, signer, capability, |_| Ok(()))
			.await
	}

	/// Like [`negotiate`](Self::negotiate), calling `on_step` with the state
	/// each step belongs to before running it. An error from `on_step` aborts.
	#[instrument(skip_all, fields(token = %transfer.token, method = %capability.method))]
	pub async fn negotiate_with<F>(
		&self,
		transfer: &ValidatedTransfer,
		signer: Address,
		capability: &PermitCapability,
		mut on_step: F,
	) -> Result<Negotiated, NegotiationError>
	where
		F: FnMut(TransferState) -> Result<(), StateError> + Send,
	{
		on_step(TransferState::NegotiatingAccount)?;
		let api_key = self.api_key()?;
		let account = self.build_account(signer);

		on_step(TransferState::InitializingClient)?;
		let client = self.connect(&account, api_key).await?;

		on_step(TransferState::BuildingInstruction)?;
		let (instruction, amount) = self.build_instruction(transfer)?;
		let trigger = self.build_trigger(transfer.token, amount);

		on_step(TransferState::RequestingQuote)?;
		let quote = self
			.request_quote(client.as_ref(), &account, trigger, instruction)
			.await?;

		if capability.method == CapabilityMethod::AssumedBySdk {
			tracing::debug!(
				operations = quote.operations.len(),
				"Permit support unconfirmed, relying on quote inspection"
			);
		}

		Ok(Negotiated {
			client,
			account,
			quote,
			amount,
		})
	}
}
