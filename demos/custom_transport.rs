//! Demonstrates plugging a host-provided transport into the gateway.
//!
//! 1. Implement [`GatewayTransport`] over whatever HTTP stack the host already embeds.
//! 2. Hand it to [`Gateway::with_transport`] together with the other host capabilities.
//! 3. Only connection-level failures map to [`TransportError`]; an HTTP response of any
//!    status counts as a successful execution.

// std
use std::{io::Error as IoError, sync::Arc};
// crates.io
use color_eyre::Result;
// self
use portal_gateway::{
	config::GatewayConfig,
	error::TransportError,
	gateway::Gateway,
	host::{Navigator, PageLocation, SystemClock},
	http::{GatewayTransport, TransportFuture, WireRequest, WireResponse},
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let healthy = Gateway::with_transport(
		Arc::new(MemoryStore::default()),
		Arc::new(DemoPage),
		Arc::new(SystemClock),
		GatewayConfig::standard()?,
		Arc::new(CannedTransport::healthy()),
	);
	let response = healthy.get("/api/status").await?;

	println!("Canned transport answered {}: {}", response.status, response.text());

	let offline = Gateway::with_transport(
		Arc::new(MemoryStore::default()),
		Arc::new(DemoPage),
		Arc::new(SystemClock),
		GatewayConfig::standard()?,
		Arc::new(CannedTransport::offline()),
	);

	match offline.get("/api/status").await {
		Ok(_) => println!("Offline transport unexpectedly produced a response."),
		Err(e) => println!("Offline transport surfaced through the pipeline: {e}"),
	}

	Ok(())
}

/// Transport double backed by a tiny routing table, with an offline failure mode.
struct CannedTransport {
	healthy: bool,
}
impl CannedTransport {
	fn healthy() -> Self {
		Self { healthy: true }
	}

	fn offline() -> Self {
		Self { healthy: false }
	}
}
impl GatewayTransport for CannedTransport {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		let healthy = self.healthy;

		Box::pin(async move {
			if !healthy {
				return Err(TransportError::network(IoError::other("backend unreachable")));
			}

			let (status, body) = match request.url.path() {
				"/runtime-config.json" | "/frontend-config" => (404, String::new()),
				"/api/extensions/public" => (200, "[]".to_owned()),
				path => (200, format!(r#"{{"path":"{path}","status":"ok"}}"#)),
			};

			Ok(WireResponse { status, body: body.into_bytes() })
		})
	}
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
