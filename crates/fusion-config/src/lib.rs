//! Configuration module for the fusion transfer system.
//!
//! Configuration is read from a TOML file. `${VAR}` and `${VAR:-default}`
//! placeholders are resolved from the environment before parsing, so secrets
//! such as the sponsor API key and the signer key can stay out of the file.
//!
//! The sponsor API key is optional at load time: a missing key is reported as a
//! configuration error when a transfer is attempted, before any wallet
//! interaction, rather than preventing read-only commands from running.

use fusion_types::{deserialize_optional_secret, SecretString, EXECUTION_VERSION};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Target chain.
	pub network: NetworkConfig,
	/// Sponsor relay credentials and endpoints.
	pub relay: RelayConfig,
	/// Default token offered in the transfer form.
	pub token: TokenConfig,
	/// Block explorer link templates.
	#[serde(default)]
	pub explorer: ExplorerConfig,
	/// Local signer used as the connected wallet.
	pub wallet: WalletConfig,
	/// Transfer flow tuning.
	#[serde(default)]
	pub transfer: TransferConfig,
}

/// Target chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	pub chain_id: u64,
	/// Display name used in error guidance, e.g. "Polygon".
	pub name: String,
	pub rpc_url: String,
}

/// Sponsor relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
	/// API key scoping the sponsorship agreement.
	#[serde(default, deserialize_with = "deserialize_optional_secret")]
	pub api_key: Option<SecretString>,
	/// Project identifier on the sponsor dashboard.
	#[serde(default)]
	pub project_id: Option<String>,
	#[serde(default = "default_relay_url")]
	pub base_url: String,
	/// Execution environment version tag.
	#[serde(default = "default_version")]
	pub version: String,
	/// Interval between settlement status polls.
	#[serde(default = "default_poll_interval")]
	pub receipt_poll_interval_seconds: u64,
	/// Ceiling the relay client itself applies to settlement polling.
	#[serde(default = "default_receipt_max_wait")]
	pub receipt_max_wait_seconds: u64,
}

fn default_relay_url() -> String {
	"https://network.biconomy.io".to_string()
}

fn default_version() -> String {
	EXECUTION_VERSION.to_string()
}

fn default_poll_interval() -> u64 {
	3
}

fn default_receipt_max_wait() -> u64 {
	600 // 10 minutes
}

/// Default token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
	#[serde(default)]
	pub address: String,
	#[serde(default = "default_decimals")]
	pub decimals: u8,
	#[serde(default)]
	pub symbol: String,
	#[serde(default)]
	pub name: String,
}

fn default_decimals() -> u8 {
	18
}

/// Explorer link templates.
///
/// `{hash}` and `{address}` are substituted verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplorerConfig {
	#[serde(default = "default_tx_url_template")]
	pub tx_url_template: String,
	#[serde(default = "default_address_url_template")]
	pub address_url_template: String,
}

fn default_tx_url_template() -> String {
	"https://meescan.biconomy.io/details/{hash}".to_string()
}

fn default_address_url_template() -> String {
	"https://polygonscan.com/address/{address}".to_string()
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			tx_url_template: default_tx_url_template(),
			address_url_template: default_address_url_template(),
		}
	}
}

impl ExplorerConfig {
	/// Link to the super-transaction details page.
	pub fn tx_url(&self, hash: &str) -> String {
		self.tx_url_template.replace("{hash}", hash)
	}

	/// Link to an account page.
	pub fn address_url(&self, address: &str) -> String {
		self.address_url_template.replace("{address}", address)
	}
}

/// Local wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	pub private_key: SecretString,
}

/// Transfer flow configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransferConfig {
	/// Optional client-side ceiling on the settlement wait.
	/// Unset means the engine waits for as long as the relay client does.
	#[serde(default)]
	pub receipt_timeout_seconds: Option<u64>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut replacements = Vec::new();
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};
		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply in reverse so earlier offsets stay valid
	let mut result = input.to_string();
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment placeholders.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Validates values serde cannot check on its own.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation(
				"network.chain_id must be greater than 0".into(),
			));
		}
		if !self.network.rpc_url.starts_with("http://")
			&& !self.network.rpc_url.starts_with("https://")
		{
			return Err(ConfigError::Validation(format!(
				"network.rpc_url must be an http(s) URL, got '{}'",
				self.network.rpc_url
			)));
		}

		if self.relay.base_url.is_empty() {
			return Err(ConfigError::Validation(
				"relay.base_url cannot be empty".into(),
			));
		}
		if self.relay.receipt_poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"relay.receipt_poll_interval_seconds must be greater than 0".into(),
			));
		}
		if self.relay.receipt_max_wait_seconds < self.relay.receipt_poll_interval_seconds {
			return Err(ConfigError::Validation(
				"relay.receipt_max_wait_seconds must not be shorter than the poll interval".into(),
			));
		}

		// U256 holds 77 full decimal digits
		if self.token.decimals > 77 {
			return Err(ConfigError::Validation(format!(
				"token.decimals cannot exceed 77, got {}",
				self.token.decimals
			)));
		}

		if !self.explorer.tx_url_template.contains("{hash}") {
			return Err(ConfigError::Validation(
				"explorer.tx_url_template must contain {hash}".into(),
			));
		}

		if self.wallet.private_key.is_blank() {
			return Err(ConfigError::Validation(
				"wallet.private_key cannot be empty".into(),
			));
		}

		if self.transfer.receipt_timeout_seconds == Some(0) {
			return Err(ConfigError::Validation(
				"transfer.receipt_timeout_seconds must be greater than 0 when set".into(),
			));
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment placeholders and validating.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
