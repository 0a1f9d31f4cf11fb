//! Event bus for transfer progress.
//!
//! A broadcast channel: every subscriber sees every event published after it
//! subscribed. Publishing with no subscribers is not an error for callers,
//! who ignore the returned result.

use fusion_types::TransferEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<TransferEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event, returning the number of subscribers that received it.
	pub fn publish(
		&self,
		event: TransferEvent,
	) -> Result<usize, broadcast::error::SendError<TransferEvent>> {
		self.sender.send(event)
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(64)
	}
}
