//! Permit capability probing.
//!
//! Three read-only tiers, each tolerant of failure: the domain separator, the
//! owner's permit nonce, and finally an optimistic default that defers to the
//! quote inspection. Reads that fail here are expected for many tokens, so
//! they are logged inside the `permit_probe` span where the probe noise
//! filter can drop them.

use alloy_primitives::Address;
use fusion_chain::ChainReader;
use fusion_types::{truncate_id, CapabilityMethod, PermitCapability, ZERO_BYTES32};
use std::sync::Arc;
use tracing::instrument;

/// Name of the span wrapping every probe.
pub const PROBE_SPAN: &str = "permit_probe";

pub struct CapabilityProber {
	reader: Arc<dyn ChainReader>,
}

impl CapabilityProber {
	pub fn new(reader: Arc<dyn ChainReader>) -> Self {
		Self { reader }
	}

	/// Determines whether `token` supports signature-based approval for `owner`.
	///
	/// Never fails and has no side effects beyond the reads themselves.
	#[instrument(name = "permit_probe", skip_all, fields(token = %truncate_id(&token.to_string())))]
	pub async fn probe(&self, token: Address, owner: Address) -> PermitCapability {
		match self.reader.domain_separator(token).await {
			Ok(separator) if separator != ZERO_BYTES32 => {
				tracing::debug!(separator = %separator, "Token exposes a domain separator");
				return PermitCapability::new(CapabilityMethod::DomainSeparator);
			}
			Ok(_) => tracing::debug!("Domain separator is zero"),
			Err(e) => tracing::warn!(error = %e, "Domain separator read failed"),
		}

		match self.reader.nonces(token, owner).await {
			Ok(nonce) => {
				tracing::debug!(nonce = %nonce, "Token answers permit nonces");
				return PermitCapability::new(CapabilityMethod::NonceProbe);
			}
			Err(e) => tracing::warn!(error = %e, "Nonce read failed"),
		}

		tracing::info!("Permit support not observed on-chain, deferring to quote inspection");
		PermitCapability::new(CapabilityMethod::AssumedBySdk)
	}
}
