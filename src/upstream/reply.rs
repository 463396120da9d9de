//! Loose decoding of upstream response bodies.

// crates.io
use reqwest::StatusCode;
use serde::{Deserializer, de::DeserializeOwned};
use serde_json::Value;
// self
use crate::_prelude::*;

const ERROR_TEXT_MAX_CHARS: usize = 512;
const ERROR_TEXT_KEYS: [&str; 3] = ["message", "error", "detail"];

/// Fields the upstream reports after a refresh; every field is optional.
///
/// Only `success` is strict. Any other field with an unexpected type decodes as absent, so
/// one odd field cannot hide an explicit decline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RefreshAck {
	/// Explicit success indicator. Absent means the 2xx status is authoritative.
	#[serde(default)]
	pub success: Option<bool>,
	/// Human-readable status text.
	#[serde(default, deserialize_with = "lenient")]
	pub message: Option<String>,
	/// Error text, as sent by frameworks that report failures under `error`.
	#[serde(default, deserialize_with = "lenient")]
	pub error: Option<String>,
	/// Error text, as sent by frameworks that report failures under `detail`.
	#[serde(default, deserialize_with = "lenient")]
	pub detail: Option<String>,
	/// Expiry of the refreshed token, passed through verbatim.
	#[serde(default, deserialize_with = "lenient")]
	pub expires_at: Option<String>,
	/// Remaining lifetime of the refreshed token in whole seconds; fractional values truncate.
	#[serde(default, deserialize_with = "lenient_seconds")]
	pub expires_in_seconds: Option<i64>,
}
impl RefreshAck {
	/// First non-blank of `message`, `error`, and `detail`.
	pub fn reason(&self) -> Option<&str> {
		[&self.message, &self.error, &self.detail]
			.into_iter()
			.flatten()
			.map(|text| text.trim())
			.find(|text| !text.is_empty())
	}
}

/// Body of a 2xx upstream response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamReply {
	/// Body decoded as a [`RefreshAck`].
	Recognized(RefreshAck),
	/// Body that is not a JSON object of the expected shape, kept as lossy UTF-8.
	Unrecognized(String),
}
impl UpstreamReply {
	/// Decodes a body without ever failing.
	pub fn decode(body: &[u8]) -> Self {
		let de = &mut serde_json::Deserializer::from_slice(body);
		let decoded: Result<RefreshAck, _> = serde_path_to_error::deserialize(de);

		match decoded {
			Ok(ack) => Self::Recognized(ack),
			Err(e) => {
				tracing::debug!(path = %e.path(), error = %e.inner(), "Upstream reply is unrecognized.");

				Self::Unrecognized(String::from_utf8_lossy(body).into_owned())
			},
		}
	}
}

/// Extracts the most useful error text from a non-2xx body.
///
/// Prefers a string `message`, `error`, or `detail` field of a JSON object, then the trimmed
/// raw body, then the canonical reason phrase of `status`.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
	let from_json = serde_json::from_slice::<Value>(body).ok().and_then(|value| {
		ERROR_TEXT_KEYS
			.into_iter()
			.find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_owned))
	});
	let text = from_json.unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_owned());

	if text.is_empty() {
		return status.canonical_reason().unwrap_or("Unknown status").to_owned();
	}

	truncate(text)
}

/// Bounds upstream-supplied text before it is echoed to callers.
pub fn truncate(text: String) -> String {
	match text.char_indices().nth(ERROR_TEXT_MAX_CHARS) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text,
	}
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let value = Value::deserialize(deserializer)?;

	Ok(serde_json::from_value(value).ok())
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;

	// Float-to-int `as` saturates, so only non-finite values need rejecting.
	Ok(value
		.as_i64()
		.or_else(|| value.as_f64().filter(|secs| secs.is_finite()).map(|secs| secs as i64)))
}
