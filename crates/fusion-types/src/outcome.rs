//! Terminal outcomes of a transfer attempt.
//!
//! Exactly one outcome is produced per attempt. Nothing in the fusion flow is
//! retried implicitly; a retry is the caller submitting a new attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure taxonomy for transfer attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferErrorKind {
	/// Missing or malformed user input. No network call was made.
	Validation,
	/// Missing sponsor credentials.
	Configuration,
	/// The quote contains an on-chain approval call.
	ApprovalRequired,
	/// The request-channel interceptor stopped an approval transaction.
	GuardTripped,
	/// The wallet declined the request.
	UserRejected,
	/// Transport-level failure reaching the relay or chain RPC.
	Network,
	/// The relay answered but denied the request.
	Service,
	/// The relay accepted the execution without returning an identifier.
	MissingReceiptIdentifier,
	/// Settlement was not observed in time.
	ConfirmationTimeout,
	/// Another attempt is already in flight.
	Busy,
}

impl fmt::Display for TransferErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			TransferErrorKind::Validation => "ValidationError",
			TransferErrorKind::Configuration => "ConfigurationError",
			TransferErrorKind::ApprovalRequired => "ApprovalRequired",
			TransferErrorKind::GuardTripped => "GuardTripped",
			TransferErrorKind::UserRejected => "UserRejected",
			TransferErrorKind::Network => "NetworkError",
			TransferErrorKind::Service => "ServiceError",
			TransferErrorKind::MissingReceiptIdentifier => "MissingReceiptIdentifier",
			TransferErrorKind::ConfirmationTimeout => "ConfirmationTimeout",
			TransferErrorKind::Busy => "Busy",
		};
		write!(f, "{}", name)
	}
}

/// Why an attempt was blocked before (or while) the wallet was asked to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
	ApprovalRequired,
	GuardTripped,
}

impl From<BlockReason> for TransferErrorKind {
	fn from(reason: BlockReason) -> Self {
		match reason {
			BlockReason::ApprovalRequired => TransferErrorKind::ApprovalRequired,
			BlockReason::GuardTripped => TransferErrorKind::GuardTripped,
		}
	}
}

/// Terminal result of one transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferOutcome {
	Success { tx_hash: String },
	Rejected { reason: String },
	Blocked { reason: BlockReason, message: String },
	Failed { kind: TransferErrorKind, message: String },
}

impl TransferOutcome {
	pub fn failed(kind: TransferErrorKind, message: impl Into<String>) -> Self {
		TransferOutcome::Failed {
			kind,
			message: message.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, TransferOutcome::Success { .. })
	}

	/// Returns the error kind for every non-success outcome.
	pub fn error_kind(&self) -> Option<TransferErrorKind> {
		match self {
			TransferOutcome::Success { .. } => None,
			TransferOutcome::Rejected { .. } => Some(TransferErrorKind::UserRejected),
			TransferOutcome::Blocked { reason, .. } => Some((*reason).into()),
			TransferOutcome::Failed { kind, .. } => Some(*kind),
		}
	}

	/// Human-readable message for the display layer.
	pub fn message(&self) -> &str {
		match self {
			TransferOutcome::Success { tx_hash } => tx_hash,
			TransferOutcome::Rejected { reason } => reason,
			TransferOutcome::Blocked { message, .. } => message,
			TransferOutcome::Failed { message, .. } => message,
		}
	}
}
