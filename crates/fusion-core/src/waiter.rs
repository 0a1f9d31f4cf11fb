//! Receipt waiting.

use fusion_relay::{RelayError, RelayInterface, SupertransactionReceipt};
use fusion_types::truncate_id;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum WaitError {
	#[error("No receipt after {}s", .0.as_secs())]
	Timeout(Duration),
	#[error(transparent)]
	Relay(#[from] RelayError),
}

/// Waits for the relay to report settlement of a super-transaction.
///
/// Without a ceiling the wait lasts as long as the relay's own wait does.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiptWaiter {
	ceiling: Option<Duration>,
}

impl ReceiptWaiter {
	pub fn new(ceiling: Option<Duration>) -> Self {
		Self { ceiling }
	}

	pub fn ceiling(&self) -> Option<Duration> {
		self.ceiling
	}

	#[instrument(skip_all, fields(tx_hash = %truncate_id(tx_hash)))]
	pub async fn wait(
		&self,
		client: &dyn RelayInterface,
		tx_hash: &str,
	) -> Result<SupertransactionReceipt, WaitError> {
		let receipt = match self.ceiling {
			Some(ceiling) => tokio::time::timeout(ceiling, client.wait_for_receipt(tx_hash))
				.await
				.map_err(|_| {
					tracing::warn!(ceiling_secs = ceiling.as_secs(), "Receipt wait ceiling reached");
					WaitError::Timeout(ceiling)
				})??,
			None => client.wait_for_receipt(tx_hash).await?,
		};

		tracing::info!("Receipt received");
		Ok(receipt)
	}
}
