//! Injected wallet detection.
//!
//! Several wallets advertise themselves through boolean flags on the injected
//! provider, and some of them also set the MetaMask flag for compatibility.
//! Matchers are therefore checked in rank order and the first hit wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What an injected provider exposes about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedProvider {
	/// Display name reported by the connector, if any.
	#[serde(default)]
	pub name: String,
	/// Identity flags set to `true` on the provider object (e.g. `isRabby`).
	#[serde(default)]
	pub flags: BTreeSet<String>,
}

impl InjectedProvider {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			flags: BTreeSet::new(),
		}
	}

	pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
		self.flags.insert(flag.into());
		self
	}

	pub fn has(&self, flag: &str) -> bool {
		self.flags.contains(flag)
	}
}

/// A recognised wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedWallet {
	pub id: String,
	pub name: String,
}

struct WalletMatcher {
	id: &'static str,
	name: &'static str,
	matches: fn(&InjectedProvider) -> bool,
}

const MATCHERS: &[WalletMatcher] = &[
	WalletMatcher {
		id: "rabby",
		name: "Rabby Wallet",
		matches: |p| p.has("isRabby"),
	},
	WalletMatcher {
		id: "gate",
		name: "Gate Wallet",
		matches: |p| p.has("isGateWallet"),
	},
	WalletMatcher {
		id: "trust",
		name: "Trust Wallet",
		matches: |p| p.has("isTrust") || p.has("isTrustWallet"),
	},
	WalletMatcher {
		id: "metamask",
		name: "MetaMask",
		matches: |p| p.has("isMetaMask"),
	},
];

fn matched(provider: &InjectedProvider) -> Option<DetectedWallet> {
	MATCHERS
		.iter()
		.find(|m| (m.matches)(provider))
		.map(|m| DetectedWallet {
			id: m.id.to_string(),
			name: m.name.to_string(),
		})
}

/// Identifies a single provider, falling back to its connector name.
pub fn identify(provider: &InjectedProvider) -> DetectedWallet {
	matched(provider).unwrap_or_else(|| DetectedWallet {
		id: "injected".to_string(),
		name: connector_display_name(&provider.name),
	})
}

/// Returns the recognised wallets among `providers`, one entry per wallet.
pub fn detect_wallets(providers: &[InjectedProvider]) -> Vec<DetectedWallet> {
	let mut found: Vec<DetectedWallet> = Vec::new();
	for wallet in providers.iter().filter_map(matched) {
		if !found.iter().any(|w| w.id == wallet.id) {
			found.push(wallet);
		}
	}
	found
}

/// Maps a connector's reported name to a friendly display name.
pub fn connector_display_name(connector: &str) -> String {
	let lower = connector.to_lowercase();
	if lower.contains("rabby") {
		"Rabby Wallet".to_string()
	} else if lower.contains("gate") {
		"Gate Wallet".to_string()
	} else if lower.contains("trust") {
		"Trust Wallet".to_string()
	} else if connector.trim().is_empty() {
		"Browser Wallet".to_string()
	} else {
		connector.to_string()
	}
}
