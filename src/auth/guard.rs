//! Route-level credential check.

// crates.io
use axum::http::HeaderMap;
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialKind},
};

/// Validates inbound credentials against the configured webhook and admin secrets.
///
/// A kind whose secret is not configured rejects every request, so a partially configured
/// relay never falls open.
#[derive(Clone, Debug, Default)]
pub struct AuthGuard {
	webhook: Option<Credential>,
	admin: Option<Credential>,
}
impl AuthGuard {
	/// Creates a guard from the two independent secrets.
	pub fn new(webhook: Option<Credential>, admin: Option<Credential>) -> Self {
		Self { webhook, admin }
	}

	/// Authorizes a request carrying `headers` for the given credential kind.
	pub fn authorize(&self, kind: CredentialKind, headers: &HeaderMap) -> Result<()> {
		let presented = headers.get(kind.header()).and_then(|value| value.to_str().ok());

		if self.check(kind, presented) {
			Ok(())
		} else {
			tracing::warn!(credential = kind.as_str(), "Rejected request with invalid credential.");

			Err(Error::AuthenticationRejected)
		}
	}

	fn check(&self, kind: CredentialKind, presented: Option<&str>) -> bool {
		let expected = match kind {
			CredentialKind::Webhook => self.webhook.as_ref(),
			CredentialKind::Admin => self.admin.as_ref(),
		};

		match (expected, presented) {
			(Some(expected), Some(presented)) if !presented.is_empty() =>
				expected.matches(presented),
			_ => false,
		}
	}
}
