//! Refresh orchestration: one upstream attempt per call, mapped to a uniform payload.
//!
//! [`RefreshOrchestrator::handle_refresh`] invokes the [`UpstreamClient`] exactly once and
//! converts whatever it reports, including transport failures, into a [`RefreshResponse`].
//! Success answers 200 and failure answers 502, so callers can tell an unhealthy relay
//! apart from a failed upstream refresh while parsing a single body shape.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use time::format_description::well_known::Rfc3339;
use tracing::Instrument;
// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	obs::{RefreshAttempt, RefreshTrigger},
	upstream::{RefreshAck, UpstreamClient, UpstreamReply, truncate},
};

/// Message used when the upstream confirms without one of its own.
pub const REFRESHED_MESSAGE: &str = "Token refreshed successfully";
/// Message used when a 2xx body could not be decoded.
pub const UNPARSEABLE_MESSAGE: &str = "refreshed (response unparseable)";
/// Message used when the upstream answers 2xx with `success: false` and no message.
pub const DECLINED_MESSAGE: &str = "Upstream declined the refresh";

/// Normalized outcome of one refresh attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshResult {
	/// Whether the upstream confirmed the refresh.
	pub success: bool,
	/// Human-readable detail.
	pub message: Option<String>,
	/// Expiry of the refreshed token when the upstream reported one.
	pub expires_at: Option<String>,
	/// Wall-clock time the attempt completed.
	pub completed_at: OffsetDateTime,
}
impl RefreshResult {
	/// Maps a raw upstream outcome.
	pub fn from_upstream(
		outcome: Result<UpstreamReply, UpstreamError>,
		completed_at: OffsetDateTime,
	) -> Self {
		match outcome {
			Ok(UpstreamReply::Recognized(ack)) => Self::from_ack(ack, completed_at),
			Ok(UpstreamReply::Unrecognized(_)) => Self {
				success: true,
				message: Some(UNPARSEABLE_MESSAGE.into()),
				expires_at: None,
				completed_at,
			},
			Err(err) =>
				Self { success: false, message: Some(err.to_string()), expires_at: None, completed_at },
		}
	}

	fn from_ack(ack: RefreshAck, completed_at: OffsetDateTime) -> Self {
		if ack.success == Some(false) {
			return Self {
				success: false,
				message: Some(ack.reason().map_or_else(
					|| DECLINED_MESSAGE.into(),
					|reason| truncate(reason.to_owned()),
				)),
				expires_at: None,
				completed_at,
			};
		}

		let expires_at = ack.expires_at.or_else(|| {
			ack.expires_in_seconds.and_then(|secs| expiry_from_lifetime(completed_at, secs))
		});

		Self { success: true, message: ack.message, expires_at, completed_at }
	}

	/// 200 on success, 502 when the upstream refresh failed.
	pub fn status_code(&self) -> StatusCode {
		if self.success { StatusCode::OK } else { StatusCode::BAD_GATEWAY }
	}

	/// Caller-facing body.
	pub fn payload(&self) -> RefreshPayload {
		let message = self.message.clone().unwrap_or_else(|| {
			if self.success { REFRESHED_MESSAGE.into() } else { DECLINED_MESSAGE.into() }
		});

		RefreshPayload {
			success: self.success,
			message,
			expires_at: self.expires_at.clone(),
			timestamp: self.completed_at,
		}
	}
}

/// JSON body returned by both refresh routes, on success and on upstream failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPayload {
	/// Whether the upstream confirmed the refresh.
	pub success: bool,
	/// Human-readable detail.
	pub message: String,
	/// Token expiry, serialized as `null` when unknown.
	pub expires_at: Option<String>,
	/// Completion time in RFC 3339, UTC.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

/// Status code plus payload produced by the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// JSON body.
	pub payload: RefreshPayload,
}
impl From<RefreshResult> for RefreshResponse {
	fn from(result: RefreshResult) -> Self {
		Self { status: result.status_code(), payload: result.payload() }
	}
}
impl IntoResponse for RefreshResponse {
	fn into_response(self) -> Response {
		(self.status, Json(self.payload)).into_response()
	}
}

/// Coordinates a single refresh attempt against the upstream.
#[derive(Clone)]
pub struct RefreshOrchestrator {
	upstream: Arc<dyn UpstreamClient>,
}
impl RefreshOrchestrator {
	/// Creates an orchestrator over the provided upstream transport.
	pub fn new(upstream: Arc<dyn UpstreamClient>) -> Self {
		Self { upstream }
	}

	/// Runs one attempt and renders its outcome.
	pub async fn handle_refresh(&self, trigger: RefreshTrigger) -> RefreshResponse {
		let attempt = RefreshAttempt::begin(trigger);
		let span = attempt.span().clone();

		async move {
			tracing::info!("Token refresh triggered.");

			let outcome = self.upstream.trigger_refresh().await;

			if let Err(err) = &outcome {
				log_upstream_failure(err);
			}

			let result = RefreshResult::from_upstream(outcome, OffsetDateTime::now_utc());

			attempt.finish(result.success);

			if result.success {
				tracing::info!(expires_at = result.expires_at.as_deref(), "Token refresh succeeded.");
			}

			RefreshResponse::from(result)
		}
		.instrument(span)
		.await
	}
}
impl Debug for RefreshOrchestrator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RefreshOrchestrator(..)")
	}
}

fn log_upstream_failure(err: &UpstreamError) {
	match err {
		UpstreamError::Transport { kind, source } => {
			tracing::error!(kind = kind.as_str(), error = %source, "Upstream refresh call failed.");
		},
		UpstreamError::Application { status, message } => {
			tracing::error!(status, message = message.as_str(), "Upstream rejected the refresh.");
		},
	}
}

fn expiry_from_lifetime(completed_at: OffsetDateTime, secs: i64) -> Option<String> {
	if secs <= 0 {
		return None;
	}

	completed_at.checked_add(time::Duration::seconds(secs))?.format(&Rfc3339).ok()
}
