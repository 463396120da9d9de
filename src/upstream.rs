//! Outbound call to the upstream admin refresh endpoint.
//!
//! [`UpstreamClient`] is the relay's only dependency on an HTTP stack. The production
//! implementation, [`ReqwestUpstreamClient`], performs exactly one bounded POST per call and
//! reports the raw outcome; mapping it to a caller-facing result is left to
//! [`crate::refresh`].

pub mod reply;

pub use reply::*;

// crates.io
use reqwest::{
	header::{HeaderName, HeaderValue},
	redirect::Policy,
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
	error::{ConfigError, UpstreamError},
};

/// Path appended to the upstream base URL.
pub const REFRESH_PATH: &str = "/admin/token/refresh";

/// Future returned by [`UpstreamClient::trigger_refresh`].
pub type UpstreamFuture<'a> =
	Pin<Box<dyn Future<Output = Result<UpstreamReply, UpstreamError>> + 'a + Send>>;

/// Transport that asks the upstream to refresh its token.
pub trait UpstreamClient
where
	Self: 'static + Send + Sync,
{
	/// Sends one refresh request.
	///
	/// Resolves to the decoded 2xx body, or to an [`UpstreamError`] for non-2xx statuses and
	/// transport failures. Implementations must not retry.
	fn trigger_refresh(&self) -> UpstreamFuture<'_>;
}

/// reqwest-backed [`UpstreamClient`].
///
/// Redirects are not followed so the admin credential is only ever sent to the configured
/// host.
#[derive(Clone)]
pub struct ReqwestUpstreamClient {
	client: ReqwestClient,
	endpoint: Url,
	admin_header: HeaderValue,
}
impl ReqwestUpstreamClient {
	/// Builds a client whose every request is bounded by `timeout`.
	pub fn new(base: &Url, admin_token: &Credential, timeout: Duration) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Self::with_client(client, base, admin_token)
	}

	/// Wraps an existing reqwest client; the caller owns its timeout and redirect policy.
	pub fn with_client(client: ReqwestClient, base: &Url, admin_token: &Credential) -> Result<Self> {
		let endpoint = refresh_endpoint(base)?;
		let mut admin_header = HeaderValue::from_str(admin_token.expose())
			.map_err(ConfigError::http_client_build)?;

		admin_header.set_sensitive(true);

		Ok(Self { client, endpoint, admin_header })
	}

	/// Fully qualified refresh endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
impl UpstreamClient for ReqwestUpstreamClient {
	fn trigger_refresh(&self) -> UpstreamFuture<'_> {
		Box::pin(async move {
			let response = self
				.client
				.post(self.endpoint.clone())
				.header(HeaderName::from_static(CredentialKind::Admin.header()), self.admin_header.clone())
				.send()
				.await
				.map_err(UpstreamError::transport)?;
			let status = response.status();
			let body = response.bytes().await.map_err(UpstreamError::transport)?;

			tracing::info!(status = status.as_u16(), "Upstream refresh endpoint responded.");

			if status.is_success() {
				Ok(UpstreamReply::decode(&body))
			} else {
				Err(UpstreamError::Application {
					status: status.as_u16(),
					message: error_message(status, &body),
				})
			}
		})
	}
}
impl Debug for ReqwestUpstreamClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestUpstreamClient")
			.field("endpoint", &self.endpoint.as_str())
			.field("admin_header", &"<redacted>")
			.finish()
	}
}

fn refresh_endpoint(base: &Url) -> Result<Url, ConfigError> {
	let joined = format!("{}{REFRESH_PATH}", base.as_str().trim_end_matches('/'));

	Url::parse(&joined).map_err(|source| ConfigError::InvalidUpstreamUrl { source })
}
