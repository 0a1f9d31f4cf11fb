//! Transfer engine.
//!
//! Owns the session state (the transfer form and the last token info) and
//! runs transfer attempts through the state machine: validate, probe,
//! negotiate, inspect, execute under the approval guard, then wait for the
//! receipt. At most one attempt runs at a time.

use crate::guard::{self, ApprovalGuard, Inspection};
use crate::negotiator::{Negotiated, NegotiationError, NegotiatorConfig, QuoteNegotiator};
use crate::prober::CapabilityProber;
use crate::state::{StateError, TransferStateMachine};
use crate::waiter::{ReceiptWaiter, WaitError};
use alloy_primitives::{Address, U256};
use fusion_chain::{ChainReader, TokenInfo};
use fusion_config::{Config, ExplorerConfig};
use fusion_relay::{RelayConnector, RelayError};
use fusion_types::{
	format_units, truncate_id, BlockReason, PermitCapability, TransferErrorKind, TransferEvent,
	TransferForm, TransferOutcome, TransferRequest, TransferState, ValidatedTransfer,
};
use fusion_wallet::Wallet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::instrument;

pub mod event_bus;
pub mod messages;

use event_bus::EventBus;
use messages::MessageContext;

/// A transfer that settled.
struct Settled {
	tx_hash: String,
	amount: U256,
	transfer: ValidatedTransfer,
}

impl From<StateError> for TransferOutcome {
	fn from(err: StateError) -> Self {
		TransferOutcome::failed(TransferErrorKind::Service, err.to_string())
	}
}

/// Marks the engine busy for as long as it is held.
struct InFlightSlot<'a>(&'a AtomicBool);

impl<'a> InFlightSlot<'a> {
	fn acquire(flag: &'a AtomicBool) -> Option<Self> {
		flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| Self(flag))
	}
}

impl Drop for InFlightSlot<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

pub struct TransferEngine {
	wallet: Wallet,
	reader: Arc<dyn ChainReader>,
	prober: CapabilityProber,
	negotiator: QuoteNegotiator,
	waiter: ReceiptWaiter,
	event_bus: EventBus,
	explorer: ExplorerConfig,
	context: MessageContext,
	default_symbol: String,
	form: RwLock<TransferForm>,
	token_info: RwLock<Option<TokenInfo>>,
	in_flight: AtomicBool,
}

impl TransferEngine {
	pub fn new(
		config: &Config,
		wallet: Wallet,
		reader: Arc<dyn ChainReader>,
		connector: Arc<dyn RelayConnector>,
	) -> Self {
		let negotiator = QuoteNegotiator::new(
			NegotiatorConfig {
				chain_id: config.network.chain_id,
				rpc_url: config.network.rpc_url.clone(),
				version: config.relay.version.clone(),
				api_key: config.relay.api_key.clone(),
			},
			connector,
		);

		Self {
			prober: CapabilityProber::new(Arc::clone(&reader)),
			negotiator,
			waiter: ReceiptWaiter::new(
				config
					.transfer
					.receipt_timeout_seconds
					.map(Duration::from_secs),
			),
			event_bus: EventBus::default(),
			explorer: config.explorer.clone(),
			context: MessageContext {
				chain_name: config.network.name.clone(),
				chain_id: config.network.chain_id,
				api_key_configured: config
					.relay
					.api_key
					.as_ref()
					.is_some_and(|key| !key.is_blank()),
				project_id: config.relay.project_id.clone(),
				version: config.relay.version.clone(),
			},
			default_symbol: config.token.symbol.clone(),
			form: RwLock::new(TransferForm::new(
				config.token.address.clone(),
				config.token.decimals,
			)),
			token_info: RwLock::new(None),
			in_flight: AtomicBool::new(false),
			wallet,
			reader,
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
		self.event_bus.subscribe()
	}

	pub fn wallet(&self) -> &Wallet {
		&self.wallet
	}

	pub fn is_busy(&self) -> bool {
		self.in_flight.load(Ordering::Acquire)
	}

	pub async fn form(&self) -> TransferForm {
		self.form.read().await.clone()
	}

	/// Applies `update` to the session form.
	pub async fn update_form<F>(&self, update: F)
	where
		F: FnOnce(&mut TransferForm),
	{
		update(&mut *self.form.write().await);
	}

	pub async fn token_info(&self) -> Option<TokenInfo> {
		self.token_info.read().await.clone()
	}

	/// Probes `token` for permit support on behalf of the connected wallet.
	pub async fn probe(&self, token: Address) -> PermitCapability {
		self.prober.probe(token, self.wallet.address()).await
	}

	/// Re-reads the form's token and the wallet's balance of it.
	///
	/// On-chain decimals replace the form's decimals when the token reports
	/// different ones.
	pub async fn refresh_token_info(&self) -> Option<TokenInfo> {
		let token_address = self.form.read().await.token_address.clone();
		let token = match token_address.trim().parse::<Address>() {
			Ok(token) => token,
			Err(_) => {
				tracing::debug!(token = %token_address, "Skipping token info for invalid address");
				return None;
			}
		};

		let info = TokenInfo::fetch(self.reader.as_ref(), token, self.wallet.address()).await;

		{
			let mut form = self.form.write().await;
			if info.decimals_verified && info.decimals != form.decimals {
				tracing::info!(
					from = form.decimals,
					to = info.decimals,
					"Adopting on-chain token decimals"
				);
				form.decimals = info.decimals;
			}
		}

		self.event_bus
			.publish(TransferEvent::BalanceUpdated {
				token: token.to_string(),
				symbol: info.symbol.clone(),
				balance: info.formatted_balance(),
			})
			.ok();
		*self.token_info.write().await = Some(info.clone());
		Some(info)
	}

	/// Transfers using the current contents of the session form.
	pub async fn submit(&self) -> TransferOutcome {
		let request = self.form.read().await.to_request();
		self.transfer(request).await
	}

	/// Runs one transfer attempt to its terminal outcome.
	///
	/// Fails with `Busy` without touching any state when another attempt is
	/// in flight.
	#[instrument(skip_all, fields(token = %truncate_id(&request.token_address)))]
	pub async fn transfer(&self, request: TransferRequest) -> TransferOutcome {
		let Some(_slot) = InFlightSlot::acquire(&self.in_flight) else {
			tracing::warn!("Rejected transfer while another is in flight");
			return TransferOutcome::failed(
				TransferErrorKind::Busy,
				"Another transfer is already in progress",
			);
		};

		let mut machine = TransferStateMachine::new(self.event_bus.clone());
		match self.run(&mut machine, &request).await {
			Ok(settled) => {
				let info = self.refresh_token_info().await;
				let symbol = info
					.as_ref()
					.map(|info| info.display_symbol().to_string())
					.unwrap_or_else(|| self.fallback_symbol());
				let message = messages::success(
					&format_units(settled.amount, settled.transfer.decimals),
					&symbol,
					&settled.transfer.recipient.to_string(),
				);
				self.form.write().await.reset_after_success();

				tracing::info!(tx_hash = %truncate_id(&settled.tx_hash), "Transfer confirmed");
				machine.finish(
					TransferOutcome::Success {
						tx_hash: settled.tx_hash,
					},
					message,
				)
			}
			Err(outcome) => {
				let message = outcome.message().to_string();
				match outcome.error_kind() {
					Some(TransferErrorKind::Validation) | Some(TransferErrorKind::UserRejected) => {
						tracing::info!(kind = ?outcome.error_kind(), "Transfer not completed")
					}
					kind => tracing::warn!(kind = ?kind, message = %message, "Transfer failed"),
				}
				machine.finish(outcome, message)
			}
		}
	}

	fn fallback_symbol(&self) -> String {
		if self.default_symbol.trim().is_empty() {
			"tokens".to_string()
		} else {
			self.default_symbol.clone()
		}
	}

	fn negotiation_failure(&self, err: NegotiationError) -> TransferOutcome {
		match err {
			NegotiationError::MissingApiKey => {
				TransferOutcome::failed(TransferErrorKind::Configuration, err.to_string())
			}
			NegotiationError::InvalidAmount(e) => {
				TransferOutcome::failed(TransferErrorKind::Validation, e.to_string())
			}
			NegotiationError::Relay(e) => messages::classify_relay(e, &self.context),
			NegotiationError::Step(e) => e.into(),
		}
	}

	async fn run(
		&self,
		machine: &mut TransferStateMachine,
		request: &TransferRequest,
	) -> Result<Settled, TransferOutcome> {
		let owner = self.wallet.address();

		machine.advance(TransferState::ValidatingInput)?;
		let transfer = request
			.validate()
			.map_err(|e| TransferOutcome::failed(TransferErrorKind::Validation, e.to_string()))?;

		machine.advance(TransferState::ProbingCapability)?;
		let capability = self.prober.probe(transfer.token, owner).await;
		self.event_bus
			.publish(TransferEvent::CapabilityProbed {
				token: transfer.token.to_string(),
				capability,
			})
			.ok();

		let Negotiated {
			client,
			quote,
			amount,
			..
		} = self
			.negotiator
			.negotiate_with(&transfer, owner, &capability, |state| machine.advance(state))
			.await
			.map_err(|e| self.negotiation_failure(e))?;

		machine.advance(TransferState::InspectingApprovals)?;
		if let Inspection::ApprovalDetected { operations } = guard::inspect(&quote) {
			tracing::warn!(
				operations = operations,
				method = %capability.method,
				"Quote contains an approval call"
			);
			return Err(TransferOutcome::Blocked {
				reason: BlockReason::ApprovalRequired,
				message: messages::approval_required(&transfer.token.to_string()),
			});
		}

		machine.advance(TransferState::AwaitingSignature)?;
		let execution = {
			let armed = ApprovalGuard::arm(self.wallet.channel(), transfer.token)
				.map_err(|e| TransferOutcome::failed(TransferErrorKind::Busy, e.to_string()))?;
			let result = client.execute(&quote, self.wallet.channel()).await;
			if armed.tripped() {
				tracing::error!(
					token = %transfer.token,
					"Approval attempted after a clean quote inspection"
				);
				return Err(TransferOutcome::Blocked {
					reason: BlockReason::GuardTripped,
					message: messages::guard_tripped(),
				});
			}
			result
		}
		.map_err(|e| messages::classify_relay(e, &self.context))?;

		let tx_hash = execution.hash.trim().to_string();
		if tx_hash.is_empty() {
			return Err(TransferOutcome::failed(
				TransferErrorKind::MissingReceiptIdentifier,
				messages::missing_receipt_identifier(&self.explorer.address_url(&owner.to_string())),
			));
		}

		let explorer_url = self.explorer.tx_url(&tx_hash);
		machine.advance(TransferState::Submitted)?;
		self.event_bus
			.publish(TransferEvent::Submitted {
				tx_hash: tx_hash.clone(),
				explorer_url: explorer_url.clone(),
			})
			.ok();

		match self.waiter.wait(client.as_ref(), &tx_hash).await {
			Ok(_) => {}
			Err(WaitError::Timeout(_)) | Err(WaitError::Relay(RelayError::Timeout(_))) => {
				return Err(TransferOutcome::failed(
					TransferErrorKind::ConfirmationTimeout,
					messages::confirmation_timeout(&tx_hash, &explorer_url),
				));
			}
			Err(WaitError::Relay(e)) => return Err(messages::classify_relay(e, &self.context)),
		}

		Ok(Settled {
			tx_hash,
			amount,
			transfer,
		})
	}
}

#[cfg(test)]
mod tests;
