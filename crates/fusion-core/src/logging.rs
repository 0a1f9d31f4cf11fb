//! Log filtering for capability probes.
//!
//! Many tokens answer `DOMAIN_SEPARATOR` or `nonces` with a generic internal
//! JSON-RPC error. Those failures are expected during a probe and would
//! otherwise flood the output with warnings, so this filter drops them when
//! they are emitted inside the probe span. The same errors anywhere else are
//! kept.

use crate::prober::PROBE_SPAN;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};
use tracing_subscriber::registry::LookupSpan;

const NOISE_MARKERS: &[&str] = &["-32603", "Internal JSON-RPC error"];

/// Per-layer filter suppressing expected RPC failures raised while probing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeNoiseFilter;

#[derive(Default)]
struct NoiseVisitor {
	noisy: bool,
}

impl Visit for NoiseVisitor {
	fn record_str(&mut self, _field: &Field, value: &str) {
		self.noisy |= is_noise(value);
	}

	fn record_debug(&mut self, _field: &Field, value: &dyn fmt::Debug) {
		if !self.noisy {
			self.noisy = is_noise(&format!("{:?}", value));
		}
	}
}

fn is_noise(text: &str) -> bool {
	NOISE_MARKERS.iter().any(|marker| text.contains(marker))
}

impl<S> Filter<S> for ProbeNoiseFilter
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
		true
	}

	fn event_enabled(&self, event: &Event<'_>, cx: &Context<'_, S>) -> bool {
		if *event.metadata().level() > Level::WARN {
			return true;
		}

		let in_probe = cx
			.event_scope(event)
			.map(|mut scope| scope.any(|span| span.name() == PROBE_SPAN))
			.unwrap_or(false);
		if !in_probe {
			return true;
		}

		let mut visitor = NoiseVisitor::default();
		event.record(&mut visitor);
		!visitor.noisy
	}
}
