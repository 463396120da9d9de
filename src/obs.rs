//! Observability for refresh attempts.
//!
//! Each attempt runs inside a `token_guardian.refresh` span carrying the `trigger` (route) and
//! the final `outcome`. With the `metrics` feature, the `token_guardian_refresh_total` counter
//! is incremented once on entry (`outcome="attempt"`) and once on completion.

// crates.io
use tracing::{Span, field::Empty};
use tracing_subscriber::EnvFilter;
// self
use crate::_prelude::*;

/// What caused a refresh attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshTrigger {
	/// Automated caller reported an expired token.
	Webhook,
	/// Operator invoked `/refresh`.
	Manual,
}
impl RefreshTrigger {
	/// Label used for span and counter fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Webhook => "webhook",
			Self::Manual => "manual",
		}
	}
}
impl Display for RefreshTrigger {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Span and counter bookkeeping for a single refresh attempt.
#[derive(Debug)]
pub struct RefreshAttempt {
	trigger: RefreshTrigger,
	span: Span,
}
impl RefreshAttempt {
	/// Opens the attempt span and counts the attempt.
	pub fn begin(trigger: RefreshTrigger) -> Self {
		let span =
			tracing::info_span!("token_guardian.refresh", trigger = trigger.as_str(), outcome = Empty);

		count(trigger, "attempt");

		Self { trigger, span }
	}

	/// Span the attempt should be instrumented with.
	pub fn span(&self) -> &Span {
		&self.span
	}

	/// Records the outcome on the span and the counter; returns the label used.
	pub fn finish(&self, success: bool) -> &'static str {
		let outcome = if success { "success" } else { "failure" };

		self.span.record("outcome", outcome);
		count(self.trigger, outcome);

		outcome
	}
}

/// Installs the global fmt subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}

#[cfg(feature = "metrics")]
fn count(trigger: RefreshTrigger, outcome: &'static str) {
	metrics::counter!(
		"token_guardian_refresh_total",
		"trigger" => trigger.as_str(),
		"outcome" => outcome
	)
	.increment(1);
}

#[cfg(not(feature = "metrics"))]
fn count(_: RefreshTrigger, _: &'static str) {}
