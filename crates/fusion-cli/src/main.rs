//! Command-line entry point for fusion transfers.
//!
//! Loads the configuration, connects the local signer as the wallet and runs
//! one command against the transfer engine: a sponsored transfer, a permit
//! capability probe, or a token info lookup.

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use fusion_chain::implementations::evm::alloy::AlloyChainReader;
use fusion_config::Config;
use fusion_core::{ProbeNoiseFilter, TransferEngine};
use fusion_relay::implementations::mee::MeeConnector;
use fusion_types::{DisplayStatus, TransferEvent};
use fusion_wallet::implementations::local::LocalSigner;
use fusion_wallet::{RequestChannel, Wallet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Command-line arguments for the fusion CLI.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Send a sponsored token transfer
	Transfer {
		/// Recipient address
		#[arg(long)]
		to: String,
		/// Amount in display units, e.g. 1.5
		#[arg(long)]
		amount: String,
		/// Token address (defaults to the configured token)
		#[arg(long)]
		token: Option<String>,
		/// Token decimals (defaults to the configured or on-chain value)
		#[arg(long)]
		decimals: Option<u8>,
	},
	/// Check whether a token supports permit signatures
	Probe {
		#[arg(long)]
		token: Option<String>,
	},
	/// Show token metadata and the wallet balance
	TokenInfo {
		#[arg(long)]
		token: Option<String>,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(
			fmt::layer()
				.with_thread_ids(true)
				.with_target(true)
				.with_filter(ProbeNoiseFilter),
		)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		chain = %config.network.name,
		chain_id = config.network.chain_id,
		"Loaded configuration"
	);

	let engine = build_engine(&config).await?;
	run(&engine, args.command).await
}

/// Wires the local signer, chain reader and relay connector into an engine.
async fn build_engine(config: &Config) -> Result<TransferEngine, Box<dyn std::error::Error>> {
	let signer = LocalSigner::new(&config.wallet.private_key, config.network.chain_id)?
		.with_rpc(&config.network.rpc_url)?;
	let channel = Arc::new(RequestChannel::new(Box::new(signer)));
	let wallet = Wallet::connect(channel).await?;

	if wallet.chain_id() != config.network.chain_id {
		return Err(format!(
			"Wallet is on chain {} but {} (chain id {}) is configured",
			wallet.chain_id(),
			config.network.name,
			config.network.chain_id
		)
		.into());
	}

	let reader = AlloyChainReader::new(config.network.chain_id, &config.network.rpc_url)?;
	let connector = MeeConnector::new(
		config.relay.base_url.clone(),
		Duration::from_secs(config.relay.receipt_poll_interval_seconds),
		Duration::from_secs(config.relay.receipt_max_wait_seconds),
	);

	Ok(TransferEngine::new(
		config,
		wallet,
		Arc::new(reader),
		Arc::new(connector),
	))
}

async fn run(engine: &TransferEngine, command: Command) -> Result<(), Box<dyn std::error::Error>> {
	match command {
		Command::Transfer {
			to,
			amount,
			token,
			decimals,
		} => {
			if let Some(token) = token {
				engine.update_form(|form| form.token_address = token).await;
			}
			engine.refresh_token_info().await;
			engine
				.update_form(|form| {
					form.recipient_address = to;
					form.amount = amount;
					if let Some(decimals) = decimals {
						form.decimals = decimals;
					}
				})
				.await;

			let printer = tokio::spawn(print_events(engine.subscribe()));
			let outcome = engine.submit().await;
			printer.await?;

			if outcome.is_success() {
				println!("Transaction: {}", outcome.message());
				Ok(())
			} else {
				Err(outcome.message().into())
			}
		}
		Command::Probe { token } => {
			let token = resolve_token(engine, token).await?;
			let capability = engine.probe(token).await;
			println!(
				"{}: permit {} ({})",
				token,
				if capability.supported { "supported" } else { "unsupported" },
				capability.method
			);
			Ok(())
		}
		Command::TokenInfo { token } => {
			if let Some(token) = token {
				engine.update_form(|form| form.token_address = token).await;
			}
			let info = engine
				.refresh_token_info()
				.await
				.ok_or("Token address is missing or invalid")?;
			println!("Token:    {} ({})", info.name, info.symbol);
			println!("Address:  {}", info.address);
			println!("Decimals: {}", info.decimals);
			println!(
				"Balance:  {} {}",
				info.formatted_balance(),
				info.display_symbol()
			);
			Ok(())
		}
	}
}

async fn resolve_token(
	engine: &TransferEngine,
	token: Option<String>,
) -> Result<Address, Box<dyn std::error::Error>> {
	let raw = match token {
		Some(token) => token,
		None => engine.form().await.token_address,
	};
	raw.trim()
		.parse::<Address>()
		.map_err(|e| format!("Invalid token address {}: {}", raw, e).into())
}

/// Prints progress until the attempt completes.
async fn print_events(mut events: broadcast::Receiver<TransferEvent>) {
	loop {
		match events.recv().await {
			Ok(TransferEvent::StateChanged {
				status, message, ..
			}) => match status {
				DisplayStatus::Idle | DisplayStatus::Loading => println!("... {}", message),
				DisplayStatus::Success => println!("ok  {}", message),
				DisplayStatus::Error => eprintln!("err {}", message),
			},
			Ok(TransferEvent::Submitted { explorer_url, .. }) => {
				println!("    explorer: {}", explorer_url)
			}
			Ok(TransferEvent::Completed { .. }) => break,
			Ok(_) => {}
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				tracing::debug!(skipped = skipped, "Event printer lagged")
			}
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	const CONFIG: &str = r#"
[network]
chain_id = 31337
name = "Anvil"
rpc_url = "http://localhost:8545"

[relay]
api_key = "mee_test_key"

[token]
address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
decimals = 18
symbol = "TOKA"

[wallet]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["fusion", "probe"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(matches!(args.command, Command::Probe { token: None }));
	}

	#[test]
	fn test_transfer_args() {
		let args = Args::try_parse_from([
			"fusion",
			"--config",
			"custom.toml",
			"transfer",
			"--to",
			"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
			"--amount",
			"1.5",
			"--decimals",
			"6",
		])
		.unwrap();

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		match args.command {
			Command::Transfer {
				to,
				amount,
				token,
				decimals,
			} => {
				assert_eq!(to, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
				assert_eq!(amount, "1.5");
				assert!(token.is_none());
				assert_eq!(decimals, Some(6));
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_transfer_requires_recipient_and_amount() {
		assert!(Args::try_parse_from(["fusion", "transfer", "--amount", "1"]).is_err());
		assert!(Args::try_parse_from(["fusion", "transfer", "--to", "0x01"]).is_err());
	}

	#[tokio::test]
	async fn test_build_engine_from_file() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("config.toml");
		std::fs::write(&config_path, CONFIG).expect("Failed to write config");

		let config = Config::from_file(&config_path)
			.await
			.expect("Failed to load config");
		let engine = build_engine(&config).await.expect("Failed to build engine");

		assert_eq!(
			engine.wallet().address().to_string(),
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
		);
		assert_eq!(engine.wallet().kind().name, "Local Signer");
		assert_eq!(
			engine.form().await.token_address,
			"0x5FbDB2315678afecb367f032d93F642f64180aa3"
		);
		assert!(!engine.is_busy());
	}

	#[tokio::test]
	async fn test_resolve_token_rejects_invalid_address() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("config.toml");
		std::fs::write(&config_path, CONFIG).expect("Failed to write config");
		let config = Config::from_file(&config_path).await.unwrap();
		let engine = build_engine(&config).await.unwrap();

		assert!(resolve_token(&engine, Some("0x1234".into())).await.is_err());
		assert_eq!(
			resolve_token(&engine, None).await.unwrap().to_string(),
			"0x5FbDB2315678afecb367f032d93F642f64180aa3"
		);
	}
}
