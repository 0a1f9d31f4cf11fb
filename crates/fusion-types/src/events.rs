//! Event types for transfer progress reporting.
//!
//! Events flow through the engine's event bus so that a display layer can
//! render status lines, explorer links and refreshed balances without being
//! coupled to the orchestration code.

use crate::{PermitCapability, TransferOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of one transfer attempt.
///
/// Non-terminal states are declared in the order the flow visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransferState {
	Idle,
	ValidatingInput,
	ProbingCapability,
	NegotiatingAccount,
	InitializingClient,
	BuildingInstruction,
	RequestingQuote,
	InspectingApprovals,
	AwaitingSignature,
	Submitted,
	Confirmed,
	Failed,
	Blocked,
	Rejected,
}

impl TransferState {
	/// Returns the state that follows this one on the happy path.
	pub fn next(&self) -> Option<TransferState> {
		use TransferState::*;
		match self {
			Idle => Some(ValidatingInput),
			ValidatingInput => Some(ProbingCapability),
			ProbingCapability => Some(NegotiatingAccount),
			NegotiatingAccount => Some(InitializingClient),
			InitializingClient => Some(BuildingInstruction),
			BuildingInstruction => Some(RequestingQuote),
			RequestingQuote => Some(InspectingApprovals),
			InspectingApprovals => Some(AwaitingSignature),
			AwaitingSignature => Some(Submitted),
			Submitted => Some(Confirmed),
			Confirmed | Failed | Blocked | Rejected => None,
		}
	}

	/// Returns true for states an attempt can never leave.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			TransferState::Confirmed
				| TransferState::Failed
				| TransferState::Blocked
				| TransferState::Rejected
		)
	}

	/// Loading message shown while the attempt sits in this state.
	pub fn loading_message(&self) -> &'static str {
		use TransferState::*;
		match self {
			Idle => "Ready",
			ValidatingInput => "Validating transfer details...",
			ProbingCapability => "Verifying token permit support...",
			NegotiatingAccount => "Creating companion account...",
			InitializingClient => "Initializing sponsor client...",
			BuildingInstruction => "Building transfer instruction...",
			RequestingQuote => "Getting sponsored quote...",
			InspectingApprovals => "Checking quote for approval calls...",
			AwaitingSignature => {
				"Using permit signature - the wallet should ask for a SIGNATURE only, not an approval transaction"
			}
			Submitted => "Transaction submitted! Waiting for confirmation...",
			Confirmed => "Transfer confirmed",
			Failed => "Transfer failed",
			Blocked => "Transfer blocked",
			Rejected => "Transfer rejected",
		}
	}
}

impl fmt::Display for TransferState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// Coarse status understood by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
	Idle,
	Loading,
	Success,
	Error,
}

impl From<TransferState> for DisplayStatus {
	fn from(state: TransferState) -> Self {
		match state {
			TransferState::Idle => DisplayStatus::Idle,
			TransferState::Confirmed => DisplayStatus::Success,
			TransferState::Failed | TransferState::Blocked | TransferState::Rejected => {
				DisplayStatus::Error
			}
			_ => DisplayStatus::Loading,
		}
	}
}

/// Events published while a transfer is orchestrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransferEvent {
	/// The attempt moved to a new state.
	StateChanged {
		state: TransferState,
		status: DisplayStatus,
		message: String,
	},
	/// The token was probed for permit support.
	CapabilityProbed {
		token: String,
		capability: PermitCapability,
	},
	/// The relay accepted the execution and returned an identifier.
	Submitted {
		tx_hash: String,
		explorer_url: String,
	},
	/// The owner's token balance was re-read.
	BalanceUpdated {
		token: String,
		symbol: String,
		balance: String,
	},
	/// The attempt reached a terminal outcome.
	Completed { outcome: TransferOutcome },
}
