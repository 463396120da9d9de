//! Process configuration resolved once at startup.

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{_prelude::*, auth::Credential};

/// Upstream base URL.
pub const UPSTREAM_URL_VAR: &str = "WITHINGS_MCP_URL";
/// Admin credential, accepted on `/refresh` and forwarded upstream.
pub const ADMIN_TOKEN_VAR: &str = "ADMIN_API_TOKEN";
/// Webhook credential accepted on `/webhook/refresh-needed`.
pub const WEBHOOK_SECRET_VAR: &str = "GUARDIAN_SECRET";
/// Listen port.
pub const PORT_VAR: &str = "PORT";
/// Upstream request timeout in seconds.
pub const UPSTREAM_TIMEOUT_VAR: &str = "UPSTREAM_TIMEOUT_SECS";

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable relay configuration.
///
/// Missing values never fail construction; they leave the relay in a degraded mode where
/// refresh routes answer 503 (see [`Config::status`]).
#[derive(Clone, Debug)]
pub struct Config {
	/// Base URL of the upstream service exposing `/admin/token/refresh`.
	pub upstream_url: Option<Url>,
	/// Admin credential.
	pub admin_token: Option<Credential>,
	/// Webhook credential.
	pub webhook_secret: Option<Credential>,
	/// TCP port the HTTP surface binds to.
	pub port: u16,
	/// Upper bound for a single upstream call.
	pub upstream_timeout: Duration,
}
impl Config {
	/// Reads configuration from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads configuration through `lookup`, which returns the raw value of a variable.
	///
	/// Values are trimmed, so secrets mounted from files may keep their trailing newline.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let upstream_url = non_blank(UPSTREAM_URL_VAR).and_then(|raw| parse_upstream_url(&raw));

		Self {
			upstream_url,
			admin_token: non_blank(ADMIN_TOKEN_VAR)
				.and_then(|raw| parse_credential(ADMIN_TOKEN_VAR, &raw)),
			webhook_secret: non_blank(WEBHOOK_SECRET_VAR)
				.and_then(|raw| parse_credential(WEBHOOK_SECRET_VAR, &raw)),
			port: non_blank(PORT_VAR)
				.and_then(|raw| raw.trim().parse().ok())
				.unwrap_or(DEFAULT_PORT),
			upstream_timeout: non_blank(UPSTREAM_TIMEOUT_VAR)
				.and_then(|raw| raw.trim().parse::<u64>().ok())
				.filter(|secs| *secs > 0)
				.map(Duration::from_secs)
				.unwrap_or(DEFAULT_UPSTREAM_TIMEOUT),
		}
	}

	/// Presence summary of the required settings.
	pub fn status(&self) -> ConfigStatus {
		ConfigStatus {
			upstream_url_configured: self.upstream_url.is_some(),
			admin_token_configured: self.admin_token.is_some(),
			webhook_secret_configured: self.webhook_secret.is_some(),
		}
	}
}

/// Redacted view of which required settings are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigStatus {
	/// `WITHINGS_MCP_URL` parsed successfully.
	pub upstream_url_configured: bool,
	/// `ADMIN_API_TOKEN` is set.
	pub admin_token_configured: bool,
	/// `GUARDIAN_SECRET` is set.
	pub webhook_secret_configured: bool,
}
impl ConfigStatus {
	/// Whether refresh routes may run.
	pub fn is_complete(&self) -> bool {
		self.missing().is_empty()
	}

	/// Names of the required variables that are absent.
	pub fn missing(&self) -> Vec<&'static str> {
		[
			(self.upstream_url_configured, UPSTREAM_URL_VAR),
			(self.admin_token_configured, ADMIN_TOKEN_VAR),
			(self.webhook_secret_configured, WEBHOOK_SECRET_VAR),
		]
		.into_iter()
		.filter_map(|(present, name)| (!present).then_some(name))
		.collect()
	}
}

// Both credentials travel in HTTP headers, so a value no header can carry never matches.
fn parse_credential(var: &'static str, raw: &str) -> Option<Credential> {
	let value = raw.trim();

	if HeaderValue::from_str(value).is_err() {
		tracing::warn!(var, "Ignoring credential that is not a valid header value.");

		return None;
	}

	Credential::new(value)
}

fn parse_upstream_url(raw: &str) -> Option<Url> {
	match Url::parse(raw.trim()) {
		Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
		Ok(url) => {
			tracing::warn!(scheme = url.scheme(), "Ignoring upstream URL with unsupported scheme.");

			None
		},
		Err(e) => {
			tracing::warn!(error = %e, "Ignoring unparseable upstream URL.");

			None
		},
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn config(vars: &[(&str, &str)]) -> Config {
		let vars: HashMap<String, String> =
			vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();

		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn defaults_when_no_env_vars() {
		let config = config(&[]);

		assert!(config.upstream_url.is_none());
		assert!(config.admin_token.is_none());
		assert!(config.webhook_secret.is_none());
		assert_eq!(config.port, 8081);
		assert_eq!(config.upstream_timeout, Duration::from_secs(30));
		assert_eq!(
			config.status().missing(),
			vec!["WITHINGS_MCP_URL", "ADMIN_API_TOKEN", "GUARDIAN_SECRET"]
		);
	}

	#[test]
	fn reads_all_env_vars() {
		let config = config(&[
			("WITHINGS_MCP_URL", "https://upstream.example.com"),
			("ADMIN_API_TOKEN", "admin"),
			("GUARDIAN_SECRET", "hook"),
			("PORT", "9090"),
			("UPSTREAM_TIMEOUT_SECS", "12"),
		]);

		assert_eq!(
			config.upstream_url.as_ref().map(Url::as_str),
			Some("https://upstream.example.com/")
		);
		assert_eq!(config.admin_token.as_ref().map(Credential::expose), Some("admin"));
		assert_eq!(config.webhook_secret.as_ref().map(Credential::expose), Some("hook"));
		assert_eq!(config.port, 9090);
		assert_eq!(config.upstream_timeout, Duration::from_secs(12));
		assert!(config.status().is_complete());
	}

	#[test]
	fn blank_and_invalid_values_count_as_missing() {
		let config = config(&[
			("WITHINGS_MCP_URL", "not a url"),
			("ADMIN_API_TOKEN", "  "),
			("GUARDIAN_SECRET", ""),
		]);
		let status = config.status();

		assert!(!status.upstream_url_configured);
		assert!(!status.admin_token_configured);
		assert!(!status.webhook_secret_configured);
		assert!(!status.is_complete());
	}

	#[test]
	fn non_http_upstream_is_rejected() {
		let config = config(&[("WITHINGS_MCP_URL", "ftp://upstream.example.com")]);

		assert!(config.upstream_url.is_none());
	}

	#[test]
	fn invalid_numbers_fall_back_to_defaults() {
		let config = config(&[("PORT", "not-a-number"), ("UPSTREAM_TIMEOUT_SECS", "0")]);

		assert_eq!(config.port, 8081);
		assert_eq!(config.upstream_timeout, Duration::from_secs(30));
	}

	#[test]
	fn credentials_are_trimmed() {
		let config = config(&[
			("WITHINGS_MCP_URL", "https://upstream.example.com\n"),
			("ADMIN_API_TOKEN", "admin\n"),
			("GUARDIAN_SECRET", "  hook\r\n"),
		]);

		assert_eq!(config.admin_token.as_ref().map(Credential::expose), Some("admin"));
		assert_eq!(config.webhook_secret.as_ref().map(Credential::expose), Some("hook"));
		assert!(config.status().is_complete());
	}

	#[test]
	fn credentials_that_cannot_be_headers_count_as_missing() {
		let config = config(&[
			("WITHINGS_MCP_URL", "https://upstream.example.com"),
			("ADMIN_API_TOKEN", "ad\nmin"),
			("GUARDIAN_SECRET", "hook\u{7f}"),
		]);

		assert!(config.admin_token.is_none());
		assert!(config.webhook_secret.is_none());
		assert_eq!(config.status().missing(), vec!["ADMIN_API_TOKEN", "GUARDIAN_SECRET"]);
	}

	#[test]
	fn missing_webhook_secret_only() {
		let config = config(&[
			("WITHINGS_MCP_URL", "https://upstream.example.com"),
			("ADMIN_API_TOKEN", "admin"),
		]);

		assert_eq!(config.status().missing(), vec!["GUARDIAN_SECRET"]);
	}
}
