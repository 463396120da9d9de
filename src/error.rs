//! Relay-level error types and their HTTP rendering.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem raised while wiring the relay.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Listener could not be bound or the server loop failed.
	#[error("I/O error occurred while serving.")]
	Io(#[from] std::io::Error),

	/// Required settings are absent, so refresh routes stay disabled.
	#[error("Refresh is disabled; missing configuration: {}.", .missing.join(", "))]
	ConfigurationMissing {
		/// Environment variable names of the absent settings.
		missing: Vec<&'static str>,
	},
	/// Presented credential is absent or does not match.
	#[error("Authentication failed.")]
	AuthenticationRejected,
}
impl Error {
	/// HTTP status used when this error terminates a request.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::ConfigurationMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
			Self::AuthenticationRejected => StatusCode::UNAUTHORIZED,
		}
	}

	/// Stable machine-readable label for the error body.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Config(_) | Self::Io(_) => "internal_error",
			Self::ConfigurationMissing { .. } => "configuration_missing",
			Self::AuthenticationRejected => "unauthorized",
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error: self.label(),
			message: self.to_string(),
			missing: match &self {
				Self::ConfigurationMissing { missing } => Some(missing.clone()),
				_ => None,
			},
		};

		(self.status_code(), Json(body)).into_response()
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: &'static str,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	missing: Option<Vec<&'static str>>,
}

/// Configuration and wiring failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Upstream base URL cannot be joined with the refresh path.
	#[error("Upstream URL is invalid.")]
	InvalidUpstreamUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures of a single upstream refresh attempt.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Upstream could not be reached or did not answer in time.
	#[error("Upstream request failed ({kind}).")]
	Transport {
		/// Classified failure kind.
		kind: TransportFailureKind,
		/// Transport-specific error.
		#[source]
		source: BoxError,
	},
	/// Upstream answered with a non-success status.
	#[error("HTTP {status}: {message}")]
	Application {
		/// HTTP status code returned by the upstream.
		status: u16,
		/// Upstream-supplied error text, or the status reason when the body was empty.
		message: String,
	},
}
impl UpstreamError {
	/// Classifies and wraps a reqwest failure.
	pub fn transport(err: ReqwestError) -> Self {
		let kind = TransportFailureKind::classify(&err);

		Self::Transport { kind, source: Box::new(err) }
	}
}

/// Coarse transport failure classes surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportFailureKind {
	/// The bounded request timeout elapsed.
	Timeout,
	/// Connection refused, DNS failure, or TLS handshake failure.
	ConnectionError,
	/// Anything else the client reported.
	Unknown,
}
impl TransportFailureKind {
	/// Derives the failure class from a reqwest error.
	pub fn classify(err: &ReqwestError) -> Self {
		if err.is_timeout() {
			Self::Timeout
		} else if err.is_connect() {
			Self::ConnectionError
		} else {
			Self::Unknown
		}
	}

	/// Returns a stable label suitable for messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Timeout => "timeout",
			Self::ConnectionError => "connection_error",
			Self::Unknown => "unknown",
		}
	}
}
impl Display for TransportFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
