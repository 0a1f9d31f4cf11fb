//! Core orchestration for the fusion transfer system.
//!
//! This crate ties the wallet, the chain reader and the relay together. The
//! [`TransferEngine`] drives one attempt at a time through the transfer state
//! machine, using the capability prober, the quote negotiator, the approval
//! guard and the receipt waiter at the corresponding steps.

pub mod engine;
pub mod guard;
pub mod logging;
pub mod negotiator;
pub mod prober;
pub mod state;
pub mod waiter;

#[cfg(test)]
mod test_support;

pub use engine::event_bus::EventBus;
pub use engine::TransferEngine;
pub use guard::{ApprovalGuard, ArmedGuard, Inspection};
pub use logging::ProbeNoiseFilter;
pub use negotiator::{NegotiationError, NegotiatorConfig, QuoteNegotiator};
pub use prober::{CapabilityProber, PROBE_SPAN};
pub use state::TransferStateMachine;
pub use waiter::ReceiptWaiter;
