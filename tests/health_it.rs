mod common;

// crates.io
use reqwest::{Client, StatusCode};
use serde_json::Value;
// self
use common::*;

async fn get_json(url: String) -> (StatusCode, Value) {
	let response = Client::new().get(url).send().await.expect("Relay request should complete.");
	let status = response.status();

	(status, response.json().await.expect("Relay body should be JSON."))
}

#[tokio::test]
async fn root_reports_liveness() {
	let relay = spawn_relay_with_config(&config(&[])).await;
	let (status, body) = get_json(format!("{relay}/")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
	assert_eq!(body["service"], "token-guardian");
}

#[tokio::test]
async fn health_reports_complete_configuration() {
	let relay = spawn_relay_with_config(&complete_config("https://upstream.example.com")).await;
	let (status, body) = get_json(format!("{relay}/health")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
	assert_eq!(body["refresh_enabled"], true);
	assert_eq!(
		body["config"],
		serde_json::json!({
			"upstream_url_configured": true,
			"admin_token_configured": true,
			"webhook_secret_configured": true,
		})
	);

	let rendered = body.to_string();

	assert!(!rendered.contains(ADMIN_TOKEN));
	assert!(!rendered.contains(WEBHOOK_SECRET));
	assert!(!rendered.contains("upstream.example.com"));
}

#[tokio::test]
async fn missing_webhook_secret_degrades_refresh_routes() {
	let config = config(&[
		("WITHINGS_MCP_URL", "https://upstream.example.com"),
		("ADMIN_API_TOKEN", ADMIN_TOKEN),
	]);
	let (relay, upstream) = spawn_counting_relay(&config).await;
	let (status, body) = get_json(format!("{relay}/health")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["refresh_enabled"], false);
	assert_eq!(body["config"]["webhook_secret_configured"], false);
	assert_eq!(body["config"]["admin_token_configured"], true);
	assert_eq!(body["config"]["upstream_url_configured"], true);

	let client = Client::new();
	let response = client
		.post(format!("{relay}/webhook/refresh-needed"))
		.header("X-Guardian-Secret", "anything")
		.send()
		.await
		.expect("Relay request should complete.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let body: Value = response.json().await.expect("Degraded body should be JSON.");

	assert_eq!(body["error"], "configuration_missing");
	assert_eq!(body["missing"], serde_json::json!(["GUARDIAN_SECRET"]));

	let response = client
		.post(format!("{relay}/refresh"))
		.header("X-Admin-Token", ADMIN_TOKEN)
		.send()
		.await
		.expect("Relay request should complete.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn unconfigured_relay_checks_configuration_before_credentials() {
	let (relay, upstream) = spawn_counting_relay(&config(&[])).await;
	let response = Client::new()
		.post(format!("{relay}/refresh"))
		.send()
		.await
		.expect("Relay request should complete.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let body: Value = response.json().await.expect("Degraded body should be JSON.");

	assert_eq!(
		body["missing"],
		serde_json::json!(["WITHINGS_MCP_URL", "ADMIN_API_TOKEN", "GUARDIAN_SECRET"])
	);
	assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn counting_upstream_is_invoked_once_per_authorized_request() {
	let (relay, upstream) =
		spawn_counting_relay(&complete_config("https://upstream.example.com")).await;
	let client = Client::new();

	for _ in 0..3 {
		let response = client
			.post(format!("{relay}/webhook/refresh-needed"))
			.header("X-Guardian-Secret", WEBHOOK_SECRET)
			.send()
			.await
			.expect("Relay request should complete.");

		assert_eq!(response.status(), StatusCode::OK);
	}

	let response = client
		.post(format!("{relay}/refresh"))
		.header("X-Admin-Token", "wrong")
		.send()
		.await
		.expect("Relay request should complete.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(upstream.calls(), 3);
}
