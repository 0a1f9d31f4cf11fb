use super::*;
use crate::test_support::{
	approve_op, ExecuteScript, FakeChainReader, HarnessBuilder, QuoteScript, ReceiptScript,
	RelayScript, RECIPIENT, TOKEN, TX_HASH,
};
use fusion_types::DisplayStatus;

fn request(recipient: &str, amount: &str) -> TransferRequest {
	TransferRequest {
		token_address: TOKEN.to_checksum(None),
		recipient_address: recipient.to_string(),
		amount: amount.to_string(),
		token_decimals: 18,
	}
}

fn drain(events: &mut broadcast::Receiver<TransferEvent>) -> Vec<TransferEvent> {
	let mut drained = Vec::new();
	while let Ok(event) = events.try_recv() {
		drained.push(event);
	}
	drained
}

fn states(events: &[TransferEvent]) -> Vec<TransferState> {
	events
		.iter()
		.filter_map(|event| match event {
			TransferEvent::StateChanged { state, .. } => Some(*state),
			_ => None,
		})
		.collect()
}

async fn fill_form(engine: &TransferEngine, amount: &str) {
	engine
		.update_form(|form| {
			form.recipient_address = RECIPIENT.to_checksum(None);
			form.amount = amount.to_string();
		})
		.await;
}

#[tokio::test]
async fn test_successful_transfer_resets_form() {
	let h = HarnessBuilder::default().build().await;
	let before = h.channel.current();
	let mut events = h.engine.subscribe();

	fill_form(&h.engine, "1.5").await;
	let outcome = h.engine.submit().await;

	assert_eq!(
		outcome,
		TransferOutcome::Success {
			tx_hash: TX_HASH.to_string()
		}
	);

	let form = h.engine.form().await;
	assert!(form.recipient_address.is_empty());
	assert!(form.amount.is_empty());
	assert_eq!(form.token_address, TOKEN.to_checksum(None));
	assert_eq!(form.decimals, 18);

	assert!(h.channel.is_current(&before));
	assert!(!h.channel.is_overridden());
	assert_eq!(h.wallet.prompts().len(), 1);
	assert_eq!(h.connector.log().receipts, vec![TX_HASH.to_string()]);

	let events = drain(&mut events);
	let mut expected = vec![TransferState::ValidatingInput];
	while let Some(next) = expected.last().and_then(|s| s.next()) {
		expected.push(next);
	}
	assert_eq!(states(&events), expected);

	assert!(events.iter().any(|event| matches!(
		event,
		TransferEvent::Submitted { explorer_url, .. }
			if explorer_url == &format!("https://meescan.biconomy.io/details/{}", TX_HASH)
	)));
	assert!(events.iter().any(|event| matches!(
		event,
		TransferEvent::StateChanged { state: TransferState::Confirmed, status: DisplayStatus::Success, message }
			if message == "Transfer successful! 1.5 FSN sent to 0xe7f1...0512"
	)));
	assert!(matches!(
		events.last(),
		Some(TransferEvent::Completed { outcome }) if outcome.is_success()
	));
}

#[tokio::test]
async fn test_empty_inputs_never_negotiate() {
	let recipient = RECIPIENT.to_checksum(None);
	let token = TOKEN.to_checksum(None);
	let cases = [
		("", recipient.as_str(), "1"),
		(token.as_str(), "", "1"),
		(token.as_str(), recipient.as_str(), ""),
		(token.as_str(), recipient.as_str(), "   "),
		("", "", ""),
	];

	for (token_address, recipient_address, amount) in cases {
		let h = HarnessBuilder::default().build().await;
		let outcome = h
			.engine
			.transfer(TransferRequest {
				token_address: token_address.to_string(),
				recipient_address: recipient_address.to_string(),
				amount: amount.to_string(),
				token_decimals: 18,
			})
			.await;

		assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Validation));
		assert!(outcome.message().starts_with("Please fill in all fields"));
		assert!(h.reader.calls().is_empty());
		assert_eq!(h.connector.log().connects, 0);
		assert!(h.wallet.prompts().is_empty());
	}
}

#[tokio::test]
async fn test_malformed_address_and_amount() {
	let h = HarnessBuilder::default().build().await;

	let outcome = h.engine.transfer(request("0x1234", "1")).await;
	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Validation));
	assert!(h.reader.calls().is_empty());

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1,5"))
		.await;
	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Validation));
	assert!(h.connector.log().quotes.is_empty());
}

#[tokio::test]
async fn test_assumed_capability_with_approval_quote_is_blocked() {
	let h = HarnessBuilder::default()
		.reader(FakeChainReader::default())
		.script(RelayScript {
			quote: QuoteScript::Operations(vec![approve_op()]),
			..RelayScript::default()
		})
		.build()
		.await;
	let mut events = h.engine.subscribe();

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;

	assert!(matches!(
		outcome,
		TransferOutcome::Blocked {
			reason: BlockReason::ApprovalRequired,
			..
		}
	));
	assert!(h.wallet.prompts().is_empty());
	assert_eq!(h.connector.log().executes, 0);
	assert_eq!(h.reader.calls(), vec!["DOMAIN_SEPARATOR", "nonces"]);

	let events = drain(&mut events);
	assert!(events.iter().any(|event| matches!(
		event,
		TransferEvent::CapabilityProbed { capability, .. }
			if capability.supported && capability.method == fusion_types::CapabilityMethod::AssumedBySdk
	)));
	assert_eq!(states(&events).last(), Some(&TransferState::Blocked));
}

#[tokio::test]
async fn test_missing_api_key_fails_before_account_construction() {
	let h = HarnessBuilder::default().without_api_key().build().await;
	let mut events = h.engine.subscribe();

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;

	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Configuration));
	assert_eq!(h.connector.log().connects, 0);
	assert!(h.wallet.prompts().is_empty());

	let states = states(&drain(&mut events));
	assert!(!states.contains(&TransferState::InitializingClient));
	assert_eq!(states.last(), Some(&TransferState::Failed));
}

#[tokio::test]
async fn test_user_rejection_restores_channel_and_allows_retry() {
	let h = HarnessBuilder::default().build().await;
	let before = h.channel.current();

	h.wallet.set_reject_signatures(true);
	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;
	assert!(matches!(outcome, TransferOutcome::Rejected { .. }));
	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::UserRejected));
	assert!(h.channel.is_current(&before));
	assert!(!h.engine.is_busy());

	h.wallet.set_reject_signatures(false);
	let retry = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;
	assert!(retry.is_success());
	assert!(h.channel.is_current(&before));
}

#[tokio::test]
async fn test_guard_trips_on_approval_during_execution() {
	let h = HarnessBuilder::default()
		.script(RelayScript {
			execute: ExecuteScript::ApproveThenSign {
				hash: TX_HASH.to_string(),
			},
			..RelayScript::default()
		})
		.build()
		.await;
	let before = h.channel.current();

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;

	assert!(matches!(
		outcome,
		TransferOutcome::Blocked {
			reason: BlockReason::GuardTripped,
			..
		}
	));
	assert!(h.wallet.prompts().is_empty());
	assert!(h.channel.is_current(&before));
	assert!(h.connector.log().receipts.is_empty());
}

#[tokio::test]
async fn test_empty_hash_is_missing_receipt_identifier() {
	let h = HarnessBuilder::default()
		.script(RelayScript {
			execute: ExecuteScript::Sign {
				hash: String::new(),
			},
			..RelayScript::default()
		})
		.build()
		.await;

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;

	assert_eq!(
		outcome.error_kind(),
		Some(TransferErrorKind::MissingReceiptIdentifier)
	);
	assert!(outcome.message().contains("https://polygonscan.com/address/"));
	assert!(h.connector.log().receipts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_receipt_ceiling_maps_to_confirmation_timeout() {
	let h = HarnessBuilder::default()
		.receipt_timeout(30)
		.script(RelayScript {
			receipt: ReceiptScript::Pending,
			..RelayScript::default()
		})
		.build()
		.await;

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;

	assert_eq!(
		outcome.error_kind(),
		Some(TransferErrorKind::ConfirmationTimeout)
	);
	assert!(outcome.message().contains("meescan.biconomy.io/details/"));
}

#[tokio::test]
async fn test_relay_wait_ceiling_and_failed_settlement() {
	let h = HarnessBuilder::default()
		.script(RelayScript {
			receipt: ReceiptScript::RelayTimeout,
			..RelayScript::default()
		})
		.build()
		.await;
	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;
	assert_eq!(
		outcome.error_kind(),
		Some(TransferErrorKind::ConfirmationTimeout)
	);

	let h = HarnessBuilder::default()
		.script(RelayScript {
			receipt: ReceiptScript::Fail("reverted".into()),
			..RelayScript::default()
		})
		.build()
		.await;
	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;
	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Service));
}

#[tokio::test]
async fn test_relay_failures_are_classified() {
	let h = HarnessBuilder::default()
		.script(RelayScript {
			quote: QuoteScript::Reject {
				status: 400,
				message: "Chain 137 is not supported by the MEE node".into(),
			},
			..RelayScript::default()
		})
		.build()
		.await;
	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;
	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Service));
	assert!(outcome.message().starts_with("Chain support error"));
	assert!(outcome.message().contains("Polygon (chain id 137)"));
	assert!(outcome.message().contains("sponsor project project-1"));

	let h = HarnessBuilder::default()
		.script(RelayScript {
			quote: QuoteScript::Unreachable("error sending request".into()),
			..RelayScript::default()
		})
		.build()
		.await;
	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;
	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Network));
	assert!(h.wallet.prompts().is_empty());
}

#[tokio::test]
async fn test_concurrent_submission_is_busy() {
	let h = HarnessBuilder::default()
		.script(RelayScript {
			receipt: ReceiptScript::Pending,
			..RelayScript::default()
		})
		.build()
		.await;
	let mut events = h.engine.subscribe();

	let engine = Arc::clone(&h.engine);
	let first = tokio::spawn(async move {
		engine
			.transfer(request(&RECIPIENT.to_checksum(None), "1"))
			.await
	});

	loop {
		if let Ok(TransferEvent::Submitted { .. }) = events.recv().await {
			break;
		}
	}
	assert!(h.engine.is_busy());
	// the guard is released once execution returns, before the receipt wait
	assert!(!h.channel.is_overridden());

	let second = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "2"))
		.await;
	assert_eq!(second.error_kind(), Some(TransferErrorKind::Busy));
	assert_eq!(h.connector.log().quotes.len(), 1);

	first.abort();
	assert!(first.await.is_err());
	assert!(!h.engine.is_busy());
}

#[tokio::test]
async fn test_token_info_adopts_onchain_decimals() {
	let h = HarnessBuilder::default()
		.reader(FakeChainReader {
			decimals: Some(6),
			..FakeChainReader::permit_token()
		})
		.build()
		.await;

	let info = h.engine.refresh_token_info().await.unwrap();
	assert_eq!(info.decimals, 6);
	assert_eq!(h.engine.form().await.decimals, 6);

	let h = HarnessBuilder::default()
		.reader(FakeChainReader::default())
		.build()
		.await;
	let info = h.engine.refresh_token_info().await.unwrap();
	assert_eq!(info.name, "Unknown");
	assert_eq!(h.engine.form().await.decimals, 18);
}

#[tokio::test]
async fn test_token_info_skips_invalid_address() {
	let h = HarnessBuilder::default().build().await;
	h.engine
		.update_form(|form| form.token_address = "not-an-address".into())
		.await;
	assert!(h.engine.refresh_token_info().await.is_none());
	assert!(h.reader.calls().is_empty());
}

/// Installs an INFO subscriber so span fields are evaluated.
fn info_logging() -> tracing::subscriber::DefaultGuard {
	use tracing_subscriber::layer::SubscriberExt;
	use tracing_subscriber::Layer;

	tracing::subscriber::set_default(
		tracing_subscriber::registry().with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::sink)
				.with_filter(tracing_subscriber::filter::LevelFilter::INFO),
		),
	)
}

#[tokio::test]
async fn test_non_ascii_token_fails_validation_with_logging_enabled() {
	let _logging = info_logging();

	let h = HarnessBuilder::default().build().await;
	let outcome = h
		.engine
		.transfer(TransferRequest {
			token_address: "aéééééééé".into(),
			recipient_address: RECIPIENT.to_checksum(None),
			amount: "1".into(),
			token_decimals: 18,
		})
		.await;

	assert_eq!(outcome.error_kind(), Some(TransferErrorKind::Validation));
	assert!(h.reader.calls().is_empty());
	assert_eq!(h.connector.log().connects, 0);
}

#[tokio::test]
async fn test_non_ascii_relay_hash_is_reported() {
	let _logging = info_logging();
	let hash = "0xé9a8b7c6d5e4f3ééé";
	let h = HarnessBuilder::default()
		.script(RelayScript {
			execute: ExecuteScript::Sign {
				hash: hash.to_string(),
			},
			receipt: ReceiptScript::RelayTimeout,
			..RelayScript::default()
		})
		.build()
		.await;

	let outcome = h
		.engine
		.transfer(request(&RECIPIENT.to_checksum(None), "1"))
		.await;

	assert_eq!(
		outcome.error_kind(),
		Some(TransferErrorKind::ConfirmationTimeout)
	);
	assert!(outcome.message().contains("0xé9a8...3ééé"));
	assert!(outcome.message().contains(hash));
}
