//! Shared wallet request channel with scoped overrides.
//!
//! The channel is the one piece of mutable state shared between the host and
//! the transfer flow. An override swaps the active handler for the lifetime of
//! a [`ChannelOverride`] value and reinstates the original handler when that
//! value is dropped, whichever way the scope is left.

use crate::{RequestHandler, WalletError, WalletRequest};
use arc_swap::ArcSwap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared reference to the active handler.
pub type HandlerRef = Arc<Box<dyn RequestHandler>>;

/// Request channel dispatching to the currently installed handler.
pub struct RequestChannel {
	handler: ArcSwap<Box<dyn RequestHandler>>,
	overridden: AtomicBool,
}

impl RequestChannel {
	pub fn new(handler: Box<dyn RequestHandler>) -> Self {
		Self {
			handler: ArcSwap::from_pointee(handler),
			overridden: AtomicBool::new(false),
		}
	}

	/// Forwards a request to the active handler.
	pub async fn request(&self, request: WalletRequest) -> Result<Value, WalletError> {
		let handler = self.handler.load_full();
		tracing::trace!(method = %request.method, "Wallet request");
		handler.request(request).await
	}

	/// Returns the active handler.
	pub fn current(&self) -> HandlerRef {
		self.handler.load_full()
	}

	/// Returns true when `handler` is the active handler (pointer identity).
	pub fn is_current(&self, handler: &HandlerRef) -> bool {
		Arc::ptr_eq(&self.handler.load_full(), handler)
	}

	/// Returns true while an override is installed.
	pub fn is_overridden(&self) -> bool {
		self.overridden.load(Ordering::Acquire)
	}

	/// Installs the handler built by `wrap` around the current one.
	///
	/// Only one override may be active at a time; a second call fails with
	/// [`WalletError::ChannelBusy`] until the first guard is dropped.
	pub fn override_with<F>(&self, wrap: F) -> Result<ChannelOverride<'_>, WalletError>
	where
		F: FnOnce(HandlerRef) -> Box<dyn RequestHandler>,
	{
		if self
			.overridden
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return Err(WalletError::ChannelBusy);
		}

		let original = self.handler.load_full();
		self.handler.store(Arc::new(wrap(Arc::clone(&original))));

		Ok(ChannelOverride {
			channel: self,
			original,
		})
	}
}

/// Scoped override of a [`RequestChannel`]; dropping it restores the original.
pub struct ChannelOverride<'a> {
	channel: &'a RequestChannel,
	original: HandlerRef,
}

impl ChannelOverride<'_> {
	/// The handler that will be reinstated on drop.
	pub fn original(&self) -> &HandlerRef {
		&self.original
	}
}

impl Drop for ChannelOverride<'_> {
	fn drop(&mut self) {
		self.channel.handler.store(Arc::clone(&self.original));
		self.channel.overridden.store(false, Ordering::Release);
		tracing::debug!("Restored wallet request channel");
	}
}
