//! Approval guard.
//!
//! Two layers keep the user from paying gas for an approval. [`inspect`] looks
//! at the quote before anything is signed. While the quote executes,
//! [`ApprovalGuard::arm`] interposes on the wallet request channel and refuses
//! any `approve` transaction sent to the token. Dropping the armed guard puts
//! the original handler back.

use alloy_primitives::Address;
use async_trait::async_trait;
use fusion_types::{without_0x_prefix, Quote, APPROVE_SELECTOR};
use fusion_wallet::{
	methods, ChannelOverride, HandlerRef, InjectedProvider, RequestChannel, RequestHandler,
	WalletError, WalletRequest,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Result of inspecting a quote for approval calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inspection {
	Clean,
	ApprovalDetected { operations: usize },
}

/// Checks every operation's leading selector against `approve`.
pub fn inspect(quote: &Quote) -> Inspection {
	match quote.approval_operations().count() {
		0 => Inspection::Clean,
		operations => Inspection::ApprovalDetected { operations },
	}
}

#[derive(Debug, Error)]
pub enum GuardError {
	#[error("An approval guard is already active on the wallet channel")]
	AlreadyArmed,
}

/// Entry point for arming the request-channel interceptor.
pub struct ApprovalGuard;

impl ApprovalGuard {
	/// Installs the interceptor for `token` on `channel`.
	pub fn arm(channel: &RequestChannel, token: Address) -> Result<ArmedGuard<'_>, GuardError> {
		let tripped = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&tripped);

		let scope = channel
			.override_with(move |inner| {
				Box::new(ApprovalInterceptor {
					inner,
					token,
					tripped: flag,
				})
			})
			.map_err(|_| GuardError::AlreadyArmed)?;

		tracing::debug!(token = %token, "Armed approval guard");
		Ok(ArmedGuard {
			_scope: scope,
			tripped,
		})
	}
}

/// An installed interceptor. The channel is restored when this is dropped.
pub struct ArmedGuard<'a> {
	_scope: ChannelOverride<'a>,
	tripped: Arc<AtomicBool>,
}

impl ArmedGuard<'_> {
	/// Returns true once an approval transaction has been refused.
	pub fn tripped(&self) -> bool {
		self.tripped.load(Ordering::Acquire)
	}
}

struct ApprovalInterceptor {
	inner: HandlerRef,
	token: Address,
	tripped: Arc<AtomicBool>,
}

impl ApprovalInterceptor {
	fn is_token_approval(&self, request: &WalletRequest) -> bool {
		let Some(tx) = request.transaction() else {
			return false;
		};

		let to_token = tx
			.get("to")
			.and_then(Value::as_str)
			.and_then(|to| to.parse::<Address>().ok())
			.is_some_and(|to| to == self.token);
		if !to_token {
			return false;
		}

		tx.get("data")
			.or_else(|| tx.get("input"))
			.and_then(Value::as_str)
			.is_some_and(|data| {
				without_0x_prefix(data)
					.get(..8)
					.is_some_and(|selector| selector.eq_ignore_ascii_case(&hex_selector()))
			})
	}
}

fn hex_selector() -> String {
	APPROVE_SELECTOR.iter().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl RequestHandler for ApprovalInterceptor {
	async fn request(&self, request: WalletRequest) -> Result<Value, WalletError> {
		if request.method == methods::ETH_SEND_TRANSACTION && self.is_token_approval(&request) {
			self.tripped.store(true, Ordering::Release);
			let data = request
				.transaction()
				.and_then(|tx| tx.get("data").or_else(|| tx.get("input")))
				.and_then(Value::as_str)
				.unwrap_or_default();
			tracing::error!(
				token = %self.token,
				data = %data.get(..74).unwrap_or(data),
				"Blocked approval transaction during sponsored execution"
			);
			return Err(WalletError::GuardTripped(
				"approval transaction blocked, a permit signature should be used instead".into(),
			));
		}

		self.inner.request(request).await
	}

	fn provider_info(&self) -> InjectedProvider {
		self.inner.provider_info()
	}
}
