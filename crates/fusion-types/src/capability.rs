//! Permit capability types.
//!
//! A capability is derived per token and owner pair on every transfer attempt
//! and is never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How permit support was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityMethod {
	/// The token exposes a non-zero `DOMAIN_SEPARATOR`.
	DomainSeparator,
	/// The token answered a `nonces(owner)` read.
	NonceProbe,
	/// Both reads failed; the sponsor's quote decides.
	AssumedBySdk,
}

impl fmt::Display for CapabilityMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CapabilityMethod::DomainSeparator => write!(f, "domain separator"),
			CapabilityMethod::NonceProbe => write!(f, "nonce probe"),
			CapabilityMethod::AssumedBySdk => write!(f, "assumed by relay"),
		}
	}
}

/// Result of probing a token for signature-based approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitCapability {
	pub supported: bool,
	pub method: CapabilityMethod,
}

impl PermitCapability {
	pub fn new(method: CapabilityMethod) -> Self {
		Self {
			supported: true,
			method,
		}
	}

	/// Returns true when support was observed on-chain rather than assumed.
	pub fn is_verified(&self) -> bool {
		self.supported && self.method != CapabilityMethod::AssumedBySdk
	}
}
