//! HTTP surface: liveness, health, and the two refresh routes.
//!
//! | Route | Credential header |
//! |---|---|
//! | `GET /` | none |
//! | `GET /health` | none |
//! | `POST /webhook/refresh-needed` | `X-Guardian-Secret` |
//! | `POST /refresh` | `X-Admin-Token` |
//!
//! Refresh routes check configuration first (503 when incomplete), then the credential
//! (401), and only then reach the [`RefreshOrchestrator`]. Unsupported methods on these
//! paths answer 405.

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::HeaderMap,
	routing::{get, post},
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	auth::{AuthGuard, CredentialKind},
	config::{Config, ConfigStatus},
	obs::RefreshTrigger,
	refresh::{RefreshOrchestrator, RefreshResponse},
	upstream::{ReqwestUpstreamClient, UpstreamClient},
};

/// Service name reported by the liveness route.
pub const SERVICE_NAME: &str = "token-guardian";

/// Shared, read-only state handed to every request.
#[derive(Clone, Debug)]
pub struct AppState(Arc<AppStateInner>);
impl AppState {
	/// Wires the production reqwest upstream when configuration is complete.
	///
	/// Never fails: incomplete configuration, or an upstream client that cannot be built from
	/// it, leaves the state in degraded mode.
	pub fn from_config(config: &Config) -> Self {
		let mut status = config.status();
		let upstream = match (&config.upstream_url, &config.admin_token) {
			(Some(url), Some(token)) if status.is_complete() =>
				match ReqwestUpstreamClient::new(url, token, config.upstream_timeout) {
					Ok(client) => Some(Arc::new(client) as Arc<dyn UpstreamClient>),
					Err(e) => {
						tracing::warn!(
							error = %e,
							"Upstream client could not be built from the admin token."
						);

						status.admin_token_configured = false;

						None
					},
				},
			_ => None,
		};

		Self::build(config, status, upstream)
	}

	/// Uses a caller-provided upstream transport; still degraded when configuration is
	/// incomplete.
	pub fn with_upstream(config: &Config, upstream: Arc<dyn UpstreamClient>) -> Self {
		Self::build(config, config.status(), Some(upstream))
	}

	/// Whether refresh routes are enabled.
	pub fn refresh_enabled(&self) -> bool {
		self.0.orchestrator.is_some()
	}

	fn build(
		config: &Config,
		status: ConfigStatus,
		upstream: Option<Arc<dyn UpstreamClient>>,
	) -> Self {
		let orchestrator =
			upstream.filter(|_| status.is_complete()).map(RefreshOrchestrator::new);
		let guard = AuthGuard::new(config.webhook_secret.clone(), config.admin_token.clone());

		if orchestrator.is_none() {
			tracing::warn!(
				missing = ?status.missing(),
				"Refresh routes disabled until configuration is complete."
			);
		}

		Self(Arc::new(AppStateInner { status, guard, orchestrator }))
	}

	async fn refresh(
		&self,
		kind: CredentialKind,
		trigger: RefreshTrigger,
		headers: &HeaderMap,
	) -> Result<RefreshResponse> {
		let Some(orchestrator) = &self.0.orchestrator else {
			return Err(Error::ConfigurationMissing { missing: self.0.status.missing() });
		};

		self.0.guard.authorize(kind, headers)?;

		Ok(orchestrator.handle_refresh(trigger).await)
	}
}

#[derive(Debug)]
struct AppStateInner {
	status: ConfigStatus,
	guard: AuthGuard,
	orchestrator: Option<RefreshOrchestrator>,
}

/// Builds the relay router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/webhook/refresh-needed", post(webhook_refresh))
		.route("/refresh", post(manual_refresh))
		.with_state(state)
}

/// Binds `0.0.0.0:{port}` and serves until the listener fails.
pub async fn serve(config: Config) -> Result<()> {
	let state = AppState::from_config(&config);
	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(
		addr = %addr,
		refresh_enabled = state.refresh_enabled(),
		"Token guardian listening."
	);

	serve_on(listener, state).await
}

/// Serves the relay on an already bound listener.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
	axum::serve(listener, router(state)).await?;

	Ok(())
}

#[derive(Debug, Serialize)]
struct RootBody {
	status: &'static str,
	service: &'static str,
	version: &'static str,
	#[serde(with = "time::serde::rfc3339")]
	timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	refresh_enabled: bool,
	config: ConfigStatus,
	#[serde(with = "time::serde::rfc3339")]
	timestamp: OffsetDateTime,
}

async fn root() -> Json<RootBody> {
	Json(RootBody {
		status: "ok",
		service: SERVICE_NAME,
		version: env!("CARGO_PKG_VERSION"),
		timestamp: OffsetDateTime::now_utc(),
	})
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
	Json(HealthBody {
		status: "ok",
		refresh_enabled: state.refresh_enabled(),
		config: state.0.status,
		timestamp: OffsetDateTime::now_utc(),
	})
}

async fn webhook_refresh(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<RefreshResponse> {
	state.refresh(CredentialKind::Webhook, RefreshTrigger::Webhook, &headers).await
}

async fn manual_refresh(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<RefreshResponse> {
	state.refresh(CredentialKind::Admin, RefreshTrigger::Manual, &headers).await
}
