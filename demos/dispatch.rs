//! Demonstrates end-to-end request dispatch against a mock backend.
//!
//! 1. Seed a signed-in session in the gateway's store.
//! 2. Pin the backend origin to the mock server with a manual override.
//! 3. Send one protected and one public request; the gateway attaches the bearer
//!    credential only where the discovered public surface requires it.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use portal_gateway::{
	config::GatewayConfig,
	gateway::Gateway,
	host::{Navigator, PageLocation},
	origin::Origin,
	session::{AccessToken, SessionIdentity},
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/extensions/public");
			then.status(200).json_body(json!([
				{ "name": "blog", "routes": [{ "path": "/blog", "public": true }] },
			]));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/dashboard/widgets").header_exists("authorization");
			then.status(200).json_body(json!({ "widgets": ["revenue", "traffic"] }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/blog/posts");
			then.status(200).json_body(json!({ "posts": [{ "title": "Hello" }] }));
		})
		.await;

	let gateway = Gateway::new(
		Arc::new(MemoryStore::default()),
		Arc::new(DemoPage),
		GatewayConfig::standard()?,
	);

	gateway.set_origin_override(Origin::Absolute(Url::parse(&server.base_url())?)).await?;
	gateway
		.session()
		.save_session(
			&AccessToken::new("demo-session-token"),
			&SessionIdentity::new("admin", "ada", 7),
		)
		.await?;

	let widgets = gateway.get("/api/dashboard/widgets").await?;

	println!("Dashboard widgets ({}): {}", widgets.status, widgets.text());

	let posts = gateway.get("/api/blog/posts").await?;

	println!("Public blog posts ({}): {}", posts.status, posts.text());
	println!("Dispatching against: {}.", gateway.refresh_origin().await);

	Ok(())
}

/// Hosting-page stand-in that prints the side effects a browser shell would perform.
struct DemoPage;
impl Navigator for DemoPage {
	fn location(&self) -> PageLocation {
		PageLocation::new("http", "localhost", Some(3_000))
	}

	fn notify_session_expired(&self, message: &str) {
		println!("Session notice: {message}");
	}

	fn navigate(&self, path: &str) {
		println!("Navigating to {path}.");
	}
}
