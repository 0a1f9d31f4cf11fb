//! User-facing messages and failure classification.
//!
//! Relay and wallet errors are mapped onto the transfer error taxonomy here,
//! and service failures get a hint about which precondition most likely
//! failed.

use fusion_relay::RelayError;
use fusion_types::{short_address, BlockReason, TransferErrorKind, TransferOutcome};
use fusion_wallet::WalletError;

/// Facts about the deployment used to make messages actionable.
#[derive(Debug, Clone)]
pub struct MessageContext {
	pub chain_name: String,
	pub chain_id: u64,
	pub api_key_configured: bool,
	/// Sponsor dashboard project, if configured.
	pub project_id: Option<String>,
	pub version: String,
}

impl MessageContext {
	fn project(&self) -> String {
		match self.project_id.as_deref().map(str::trim) {
			Some(id) if !id.is_empty() => format!("the sponsor project {}", id),
			_ => "the sponsor project".to_string(),
		}
	}
}

pub fn approval_required(token: &str) -> String {
	format!(
		"Token {} requires an approval transaction. It may not fully support ERC-2612 permit, \
		 or the relay chose an on-chain approval. A small amount of the native gas token is \
		 needed for the approval.",
		short_address(token)
	)
}

pub fn guard_tripped() -> String {
	"Blocked: the relay tried to send an approval transaction instead of using a permit \
	 signature. The transaction was not forwarded to the wallet, so no gas was spent. \
	 Check that the token is recognised by the sponsor, try a different RPC endpoint, \
	 or contact the sponsor's support."
		.to_string()
}

pub fn missing_receipt_identifier(explorer_url: &str) -> String {
	format!(
		"Transaction hash not received from the relay. The transfer may still land; \
		 check the explorer: {}",
		explorer_url
	)
}

pub fn confirmation_timeout(tx_hash: &str, explorer_url: &str) -> String {
	format!(
		"Timed out waiting for confirmation of {}. The transfer may still land; \
		 check the explorer: {}",
		short_address(tx_hash),
		explorer_url
	)
}

pub fn success(amount: &str, symbol: &str, recipient: &str) -> String {
	format!(
		"Transfer successful! {} {} sent to {}",
		amount,
		symbol,
		short_address(recipient)
	)
}

/// Adds guidance for the precondition a raw error message points at.
pub fn enrich(kind: TransferErrorKind, raw: &str, ctx: &MessageContext) -> String {
	let lower = raw.to_lowercase();

	if lower.contains("sponsorship") || lower.contains("gas tank") {
		return format!(
			"Sponsorship error: {}. Ensure the sponsor gas tank is funded, sponsorship is \
			 enabled for {}, and the project is configured for {}.",
			raw,
			ctx.project(),
			ctx.chain_name
		);
	}

	if lower.contains("api key") || lower.contains("authentication") {
		return format!(
			"API key issue: {}. Please check the sponsor API key configuration.",
			raw
		);
	}

	if lower.contains("not supported by the mee node") {
		return format!(
			"Chain support error: {}. {} (chain id {}) should be supported. Ensure \
			 {} is set up and enabled for {}, the API key is correct \
			 (currently {}), and the execution version {} is supported.",
			raw,
			ctx.chain_name,
			ctx.chain_id,
			ctx.project(),
			ctx.chain_name,
			if ctx.api_key_configured { "set" } else { "missing" },
			ctx.version
		);
	}

	if lower.contains("internal json-rpc error") || lower.contains("rpc error") {
		return format!(
			"RPC error: {}. Ensure the wallet is connected to {} (chain id {}) and try \
			 the transfer again.",
			raw, ctx.chain_name, ctx.chain_id
		);
	}

	if kind == TransferErrorKind::Network
		|| lower.contains("failed to fetch")
		|| lower.contains("err_name_not_resolved")
	{
		return format!(
			"Network error: unable to reach the sponsor service ({}). Check your connection \
			 and try again.",
			raw
		);
	}

	raw.to_string()
}

/// Maps a relay failure that occurred before submission onto an outcome.
pub fn classify_relay(err: RelayError, ctx: &MessageContext) -> TransferOutcome {
	match err {
		RelayError::Wallet(WalletError::UserRejected(reason)) => TransferOutcome::Rejected {
			reason: format!("Request rejected in wallet: {}", reason),
		},
		RelayError::Wallet(WalletError::GuardTripped(_)) => TransferOutcome::Blocked {
			reason: BlockReason::GuardTripped,
			message: guard_tripped(),
		},
		RelayError::Wallet(WalletError::Transport(message)) | RelayError::Transport(message) => {
			TransferOutcome::failed(
				TransferErrorKind::Network,
				enrich(TransferErrorKind::Network, &message, ctx),
			)
		}
		other => {
			let raw = other.to_string();
			TransferOutcome::failed(
				TransferErrorKind::Service,
				enrich(TransferErrorKind::Service, &raw, ctx),
			)
		}
	}
}
