//! Redacted shared-secret wrapper.

// crates.io
use subtle::ConstantTimeEq;
// self
use crate::_prelude::*;

/// Shared secret that keeps its value out of logs and compares in constant time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);
impl Credential {
	/// Wraps a secret, rejecting empty or whitespace-only values.
	pub fn new(value: impl Into<String>) -> Option<Self> {
		let value = value.into();

		if value.trim().is_empty() { None } else { Some(Self(value)) }
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Checks a presented value against the secret without short-circuiting on content.
	pub fn matches(&self, presented: &str) -> bool {
		self.0.as_bytes().ct_eq(presented.as_bytes()).into()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Credential classes accepted by the relay, each bound to its own header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
	/// Secret presented by the automated caller reporting token expiry.
	Webhook,
	/// Secret presented on manual refresh requests.
	Admin,
}
impl CredentialKind {
	/// Header that carries the credential.
	pub const fn header(self) -> &'static str {
		match self {
			Self::Webhook => "x-guardian-secret",
			Self::Admin => "x-admin-token",
		}
	}

	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Webhook => "webhook",
			Self::Admin => "admin",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
