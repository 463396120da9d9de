//! Helpers shared by the relay integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use tokio::net::TcpListener;
// self
use token_guardian::{
	config::Config,
	error::UpstreamError,
	server::{self, AppState},
	upstream::{RefreshAck, UpstreamClient, UpstreamFuture, UpstreamReply},
};

pub const ADMIN_TOKEN: &str = "admin-secret";
pub const WEBHOOK_SECRET: &str = "hook-secret";

/// Builds a config from env-var style pairs.
pub fn config(vars: &[(&str, &str)]) -> Config {
	let vars: HashMap<String, String> =
		vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();

	Config::from_lookup(|key| vars.get(key).cloned())
}

/// Fully configured relay pointing at `upstream_url`.
pub fn complete_config(upstream_url: &str) -> Config {
	config(&[
		("WITHINGS_MCP_URL", upstream_url),
		("ADMIN_API_TOKEN", ADMIN_TOKEN),
		("GUARDIAN_SECRET", WEBHOOK_SECRET),
	])
}

/// Serves `state` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_relay(state: AppState) -> String {
	let listener =
		TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind an ephemeral port.");
	let addr = listener.local_addr().expect("Bound listener should expose its address.");

	tokio::spawn(async move {
		server::serve_on(listener, state).await.expect("Relay server failed.");
	});

	format!("http://{addr}")
}

/// Starts the production wiring for `config`.
pub async fn spawn_relay_with_config(config: &Config) -> String {
	spawn_relay(AppState::from_config(config)).await
}

/// Upstream fake that counts invocations and always confirms the refresh.
#[derive(Default)]
pub struct CountingUpstream {
	calls: AtomicUsize,
}
impl CountingUpstream {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl UpstreamClient for CountingUpstream {
	fn trigger_refresh(&self) -> UpstreamFuture<'_> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async {
			Ok::<_, UpstreamError>(UpstreamReply::Recognized(RefreshAck {
				success: Some(true),
				..RefreshAck::default()
			}))
		})
	}
}

/// Relay backed by a [`CountingUpstream`].
pub async fn spawn_counting_relay(config: &Config) -> (String, Arc<CountingUpstream>) {
	let upstream = Arc::new(CountingUpstream::default());
	let state = AppState::with_upstream(config, upstream.clone());

	(spawn_relay(state).await, upstream)
}
