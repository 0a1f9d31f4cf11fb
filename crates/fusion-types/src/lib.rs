//! Common types module for the fusion transfer system.
//!
//! This module defines the data model shared by every fusion crate: transfer
//! requests, permit capabilities, sponsored quotes, terminal outcomes and the
//! progress events emitted while a transfer is orchestrated.

/// Permit capability reported by the prober.
pub mod capability;
/// Solidity interfaces used to encode and decode token calls.
pub mod contracts;
/// Progress events and transfer states.
pub mod events;
/// Terminal outcomes and the error taxonomy.
pub mod outcome;
/// Sponsored quotes and their user operations.
pub mod quote;
/// Secure string type for API keys and private keys.
pub mod secret_string;
/// Transfer requests and the session form.
pub mod transfer;
/// Utility functions for formatting and unit conversion.
pub mod utils;

pub use capability::{CapabilityMethod, PermitCapability};
pub use events::{DisplayStatus, TransferEvent, TransferState};
pub use outcome::{BlockReason, TransferErrorKind, TransferOutcome};
pub use quote::{Quote, UserOperation, APPROVE_SELECTOR};
pub use secret_string::{deserialize_optional_secret, SecretString};
pub use transfer::{InputError, TransferForm, TransferRequest, ValidatedTransfer};
pub use utils::constants::{EXECUTION_VERSION, USER_REJECTED_CODE};
pub use utils::{
	format_units, parse_units, short_address, truncate_id, with_0x_prefix, without_0x_prefix,
	UnitsError, ZERO_BYTES32,
};
