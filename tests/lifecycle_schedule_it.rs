//! Renewal-timer scheduling tests on a paused runtime clock.
//!
//! The transport double answers inline, so the only time that passes is what the tests
//! advance explicitly; timer math is asserted to the second.

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, macros};
// self
use portal_gateway::{
	config::GatewayConfig,
	error::TransportError,
	gateway::Gateway,
	host::{ActivityKind, ActivityObserver, ActivitySignal, Clock, Navigator, PageLocation},
	http::{GatewayTransport, TransportFuture, WireRequest, WireResponse},
	session::AccessToken,
	store::MemoryStore,
};

/// Transport double that scripts responses by request path and records every call.
struct RouterTransport {
	respond: Box<dyn Fn(&WireRequest) -> Result<WireResponse, TransportError> + Send + Sync>,
	calls: Mutex<Vec<WireRequest>>,
}
impl RouterTransport {
	fn new<F>(respond: F) -> Arc<Self>
	where
		F: Fn(&WireRequest) -> Result<WireResponse, TransportError> + Send + Sync + 'static,
	{
		Arc::new(Self { respond: Box::new(respond), calls: Mutex::new(Vec::new()) })
	}

	fn renewals(&self) -> Vec<WireRequest> {
		self.calls
			.lock()
			.iter()
			.filter(|call| call.url.path() == "/api/user/refresh")
			.cloned()
			.collect()
	}
}
impl GatewayTransport for RouterTransport {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		self.calls.lock().push(request.clone());

		let outcome = (self.respond)(&request);

		Box::pin(async move { outcome })
	}
}

/// Navigator double for a local development page.
struct StillPage;
impl Navigator for StillPage {
	fn location(&self) -> PageLocation {
		PageLocation::new("http", "localhost", Some(3_000))
	}

	fn notify_session_expired(&self, _: &str) {}

	fn navigate(&self, _: &str) {}
}

struct FixedClock(OffsetDateTime);
impl Clock for FixedClock {
	fn now(&self) -> OffsetDateTime {
		self.0
	}
}

/// Activity-signal double delivering events on demand.
#[derive(Default)]
struct ManualSignal {
	observer: Mutex<Option<Arc<dyn ActivityObserver>>>,
}
impl ManualSignal {
	fn deliver(&self, kind: ActivityKind) {
		let observer =
			self.observer.lock().clone().expect("An observer should be subscribed first.");

		observer.on_activity(kind);
	}
}
impl ActivitySignal for ManualSignal {
	fn subscribe(&self, observer: Arc<dyn ActivityObserver>) {
		*self.observer.lock() = Some(observer);
	}
}

fn test_now() -> OffsetDateTime {
	macros::datetime!(2026-08-01 10:00 UTC)
}

fn jwt(expires_at: OffsetDateTime) -> String {
	let claims = format!(r#"{{"sub":"u1","exp":{}}}"#, expires_at.unix_timestamp());

	format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims))
}

fn gateway_over(transport: Arc<RouterTransport>) -> Gateway {
	let config = GatewayConfig::standard().expect("Standard configuration should build.");

	Gateway::with_transport(
		Arc::new(MemoryStore::default()),
		Arc::new(StillPage),
		Arc::new(FixedClock(test_now())),
		config,
		transport,
	)
}

fn renewing_transport(renewed: String) -> Arc<RouterTransport> {
	RouterTransport::new(move |request| match request.url.path() {
		"/runtime-config.json" | "/frontend-config" =>
			Ok(WireResponse { status: 404, body: Vec::new() }),
		"/api/user/refresh" => Ok(WireResponse {
			status: 200,
			body: format!(r#"{{"token":"{renewed}"}}"#).into_bytes(),
		}),
		other => panic!("Unexpected request path: {other}."),
	})
}

/// Lets spawned timer tasks run to completion between clock advances.
async fn drain() {
	for _ in 0..32 {
		tokio::task::yield_now().await;
	}
}

async fn advance(seconds: u64) {
	// Freshly spawned timer tasks must register their sleeps before the clock moves.
	drain().await;
	tokio::time::advance(StdDuration::from_secs(seconds)).await;
	drain().await;
}

#[tokio::test(start_paused = true)]
async fn proactive_renewal_fires_inside_the_expiry_lead() {
	let renewed = jwt(test_now() + Duration::seconds(1_200));
	let transport = renewing_transport(renewed.clone());
	let gateway = gateway_over(transport.clone());
	let token = AccessToken::new(jwt(test_now() + Duration::seconds(600)));

	gateway.session().set_access_token(&token).await.expect("Token seed should persist.");
	gateway.lifecycle().schedule_renewal().await;

	// 600 s to expiry minus the 120 s lead puts the timer at 480 s.
	advance(479).await;

	assert_eq!(transport.renewals().len(), 0);

	advance(2).await;

	let renewals = transport.renewals();

	assert_eq!(renewals.len(), 1);
	assert_eq!(renewals[0].bearer, Some(token));

	let stored = gateway
		.session()
		.access_token()
		.await
		.expect("Token fetch should succeed.")
		.expect("Renewed token should be stored.");

	assert_eq!(stored.expose(), renewed);
}

#[tokio::test(start_paused = true)]
async fn near_expiry_renewal_waits_for_the_floor() {
	let transport = renewing_transport(jwt(test_now() + Duration::seconds(1_200)));
	let gateway = gateway_over(transport.clone());
	let token = AccessToken::new(jwt(test_now() + Duration::seconds(90)));

	gateway.session().set_access_token(&token).await.expect("Token seed should persist.");
	gateway.lifecycle().schedule_renewal().await;

	// Inside the lead already, so the 10 s floor applies instead of firing immediately.
	advance(9).await;

	assert_eq!(transport.renewals().len(), 0);

	advance(2).await;

	assert_eq!(transport.renewals().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn opaque_tokens_never_arm_the_timer() {
	let transport = renewing_transport(jwt(test_now() + Duration::seconds(1_200)));
	let gateway = gateway_over(transport.clone());

	gateway
		.session()
		.set_access_token(&AccessToken::new("opaque-session-token"))
		.await
		.expect("Token seed should persist.");
	gateway.lifecycle().schedule_renewal().await;
	advance(7_200).await;

	assert_eq!(transport.renewals().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_renewal_never_fires() {
	let transport = renewing_transport(jwt(test_now() + Duration::seconds(1_200)));
	let gateway = gateway_over(transport.clone());
	let token = AccessToken::new(jwt(test_now() + Duration::seconds(600)));

	gateway.session().set_access_token(&token).await.expect("Token seed should persist.");
	gateway.lifecycle().schedule_renewal().await;
	advance(100).await;
	gateway.lifecycle().cancel_renewal();
	advance(1_000).await;

	assert_eq!(transport.renewals().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn activity_reschedules_the_pending_renewal() {
	let transport = renewing_transport(jwt(test_now() + Duration::seconds(1_200)));
	let gateway = gateway_over(transport.clone());
	let signal = ManualSignal::default();
	let token = AccessToken::new(jwt(test_now() + Duration::seconds(600)));

	gateway.attach_activity(&signal);
	gateway.session().set_access_token(&token).await.expect("Token seed should persist.");
	gateway.lifecycle().schedule_renewal().await;

	// One second before the 480 s timer fires, activity re-arms it from scratch.
	advance(479).await;
	signal.deliver(ActivityKind::Click);
	drain().await;
	advance(2).await;

	assert_eq!(transport.renewals().len(), 0);

	// The rescheduled timer runs its full delay from the activity instant.
	advance(480).await;

	assert_eq!(transport.renewals().len(), 1);
}
