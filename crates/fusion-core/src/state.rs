//! Transfer state machine.
//!
//! Tracks one attempt through the ordered lifecycle
//! `Idle -> ValidatingInput -> ... -> Submitted -> Confirmed`. Any
//! non-terminal state may move to `Failed`, `Blocked` or `Rejected`; nothing
//! moves backwards and terminal states are final. Every transition is
//! published on the event bus.

use crate::engine::event_bus::EventBus;
use fusion_types::{DisplayStatus, TransferEvent, TransferOutcome, TransferState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition {
		from: TransferState,
		to: TransferState,
	},
}

pub struct TransferStateMachine {
	state: TransferState,
	event_bus: EventBus,
}

impl TransferStateMachine {
	pub fn new(event_bus: EventBus) -> Self {
		Self {
			state: TransferState::Idle,
			event_bus,
		}
	}

	pub fn state(&self) -> TransferState {
		self.state
	}

	/// Moves to `next` with its default loading message.
	pub fn advance(&mut self, next: TransferState) -> Result<(), StateError> {
		self.advance_with(next, next.loading_message())
	}

	/// Moves to `next`, publishing `message` for the display layer.
	pub fn advance_with(
		&mut self,
		next: TransferState,
		message: impl Into<String>,
	) -> Result<(), StateError> {
		if !Self::is_valid_transition(self.state, next) {
			return Err(StateError::InvalidTransition {
				from: self.state,
				to: next,
			});
		}

		tracing::debug!(from = %self.state, to = %next, "Transfer state changed");
		self.state = next;
		self.event_bus
			.publish(TransferEvent::StateChanged {
				state: next,
				status: DisplayStatus::from(next),
				message: message.into(),
			})
			.ok();
		Ok(())
	}

	/// Records the attempt's outcome, entering the matching terminal state.
	///
	/// Returns the outcome so callers can finish with `return machine.finish(..)`.
	pub fn finish(&mut self, outcome: TransferOutcome, message: String) -> TransferOutcome {
		let terminal = match &outcome {
			TransferOutcome::Success { .. } => TransferState::Confirmed,
			TransferOutcome::Rejected { .. } => TransferState::Rejected,
			TransferOutcome::Blocked { .. } => TransferState::Blocked,
			TransferOutcome::Failed { .. } => TransferState::Failed,
		};

		if let Err(e) = self.advance_with(terminal, message) {
			tracing::error!(error = %e, "Outcome recorded out of order");
		}
		self.event_bus
			.publish(TransferEvent::Completed {
				outcome: outcome.clone(),
			})
			.ok();
		outcome
	}

	/// Checks if a state transition is valid.
	pub fn is_valid_transition(from: TransferState, to: TransferState) -> bool {
		if from.is_terminal() {
			return false;
		}
		match to {
			TransferState::Failed | TransferState::Blocked | TransferState::Rejected => true,
			_ => from.next() == Some(to),
		}
	}
}
