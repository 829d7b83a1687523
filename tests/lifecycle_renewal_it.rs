//! Session-renewal tests against a mock renewal endpoint.

#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use portal_gateway::{
	config::GatewayConfig,
	error::RenewalError,
	host::{Clock, Navigator, PageLocation, SystemClock},
	http::{GatewayTransport, ReqwestTransport},
	lifecycle::TokenLifecycle,
	origin::{Origin, OriginResolver},
	session::AccessToken,
	store::{MemoryStore, SessionStore},
};

/// Navigator double pinned to a fixed page location.
struct StaticPage {
	location: PageLocation,
}
impl Navigator for StaticPage {
	fn location(&self) -> PageLocation {
		self.location.clone()
	}

	fn notify_session_expired(&self, _: &str) {}

	fn navigate(&self, _: &str) {}
}

fn jwt_expiring_in(lifetime: Duration) -> String {
	let expires_at = OffsetDateTime::now_utc() + lifetime;
	let claims = format!(r#"{{"sub":"u1","exp":{}}}"#, expires_at.unix_timestamp());

	format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims))
}

/// Builds a lifecycle manager whose resolver is pinned to the mock server.
async fn lifecycle_at(server: &MockServer) -> (Arc<TokenLifecycle>, SessionStore) {
	let url = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let config = GatewayConfig::standard().expect("Standard configuration should build.");
	let session = SessionStore::new(Arc::new(MemoryStore::default()));
	let transport: Arc<dyn GatewayTransport> = Arc::new(ReqwestTransport::default());
	let clock: Arc<dyn Clock> = Arc::new(SystemClock);
	let location = PageLocation::new(
		url.scheme(),
		url.host_str().expect("Mock server URL should carry a host.").to_owned(),
		url.port(),
	);
	let resolver = Arc::new(OriginResolver::new(
		transport.clone(),
		session.clone(),
		Arc::new(StaticPage { location }),
		clock.clone(),
		config.clone(),
	));

	resolver
		.set_override(Origin::Absolute(url))
		.await
		.expect("Origin override should persist.");

	let lifecycle =
		Arc::new(TokenLifecycle::new(transport, session.clone(), resolver, clock, config));

	(lifecycle, session)
}

#[tokio::test]
async fn renewal_persists_the_fresh_token() {
	let server = MockServer::start_async().await;
	let stale = AccessToken::new(jwt_expiring_in(Duration::seconds(90)));
	let renewed = jwt_expiring_in(Duration::hours(2));
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/user/refresh")
				.header("authorization", format!("Bearer {}", stale.expose()));
			then.status(200).json_body(json!({ "token": renewed }));
		})
		.await;
	let (lifecycle, session) = lifecycle_at(&server).await;

	session.set_access_token(&stale).await.expect("Token seed should persist.");
	lifecycle.renew().await.expect("Renewal should succeed.");
	renewal.assert_async().await;

	let stored = session
		.access_token()
		.await
		.expect("Token fetch should succeed.")
		.expect("Renewed token should be stored.");

	assert_eq!(stored.expose(), renewed);
}

#[tokio::test]
async fn renewal_without_a_session_skips_the_endpoint() {
	let server = MockServer::start_async().await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/user/refresh");
			then.status(200).json_body(json!({ "token": "t" }));
		})
		.await;
	let (lifecycle, _session) = lifecycle_at(&server).await;
	let error = lifecycle.renew().await.expect_err("Signed-out renewal should fail.");

	assert!(matches!(error, RenewalError::NoSession));
	renewal.assert_calls_async(0).await;
}

#[tokio::test]
async fn missing_token_payload_leaves_the_session_unchanged() {
	let server = MockServer::start_async().await;
	let stale = AccessToken::new(jwt_expiring_in(Duration::seconds(90)));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/user/refresh");
			then.status(200).json_body(json!({ "user": "ada" }));
		})
		.await;

	let (lifecycle, session) = lifecycle_at(&server).await;

	session.set_access_token(&stale).await.expect("Token seed should persist.");

	let error = lifecycle.renew().await.expect_err("Tokenless reply should fail.");

	assert!(matches!(error, RenewalError::MissingToken));
	assert_eq!(
		session.access_token().await.expect("Token fetch should succeed."),
		Some(stale)
	);
}

#[tokio::test]
async fn endpoint_failure_reports_the_status() {
	let server = MockServer::start_async().await;
	let stale = AccessToken::new(jwt_expiring_in(Duration::seconds(90)));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/user/refresh");
			then.status(503);
		})
		.await;

	let (lifecycle, session) = lifecycle_at(&server).await;

	session.set_access_token(&stale).await.expect("Token seed should persist.");

	let error = lifecycle.renew().await.expect_err("Unavailable endpoint should fail.");

	assert!(matches!(error, RenewalError::Endpoint { status: 503 }));
	assert_eq!(
		session.access_token().await.expect("Token fetch should succeed."),
		Some(stale)
	);
}

#[tokio::test]
async fn concurrent_renewals_share_one_attempt() {
	let server = MockServer::start_async().await;
	let stale = AccessToken::new(jwt_expiring_in(Duration::seconds(90)));
	let renewed = jwt_expiring_in(Duration::hours(2));
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/user/refresh")
				.header("authorization", format!("Bearer {}", stale.expose()));
			then.status(200).json_body(json!({ "token": renewed }));
		})
		.await;
	let (lifecycle, session) = lifecycle_at(&server).await;

	session.set_access_token(&stale).await.expect("Token seed should persist.");

	let (first, second, third) =
		tokio::join!(lifecycle.renew_shared(), lifecycle.renew_shared(), lifecycle.renew_shared());

	for outcome in [first, second, third] {
		assert!(outcome.succeeded(), "Every caller should share the single attempt's success.");
	}

	renewal.assert_calls_async(1).await;

	let stored = session
		.access_token()
		.await
		.expect("Token fetch should succeed.")
		.expect("Renewed token should be stored.");

	assert_eq!(stored.expose(), renewed);
}
