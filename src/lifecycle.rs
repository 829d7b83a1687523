//! Token lifecycle: proactive renewal scheduling and single-flight renewal coordination.
//!
//! A session token is renewed shortly before it expires so active users never see an
//! authentication gap. The timer re-arms on user activity, which debounces renewal to the
//! last observed interaction instead of firing on a wall-clock grid. Renewal itself runs
//! at most once at a time; concurrent demands share the single attempt's outcome.

// std
use std::sync::Weak;
// crates.io
use tokio::{task::JoinHandle, time::sleep};
// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::{RenewalError, TransportError},
	host::{ActivityKind, ActivityObserver, Clock},
	http::{GatewayTransport, Method, WireRequest},
	obs::{self, OpKind, OpOutcome, OpSpan},
	origin::OriginResolver,
	session::{AccessToken, TokenClaims},
	store::SessionStore,
};

/// Reply shape of the renewal endpoint.
#[derive(Debug, Deserialize)]
struct RenewalReply {
	token: Option<String>,
}

/// Outcome of [`TokenLifecycle::renew_shared`].
#[derive(Debug)]
pub enum SharedRenewal {
	/// This caller executed the renewal attempt itself and owns its consequences.
	Performed(Result<(), RenewalError>),
	/// Another caller was already renewing; that attempt's outcome was adopted.
	Adopted(Result<(), RenewalError>),
}
impl SharedRenewal {
	/// True when the renewal, however obtained, succeeded.
	pub fn succeeded(&self) -> bool {
		matches!(self, Self::Performed(Ok(())) | Self::Adopted(Ok(())))
	}
}

/// Single-flight gate around renewal attempts.
///
/// The async mutex serializes attempts; the outcome flag is written by the performer
/// before the gate is released, so waiters that acquire the gate afterwards read the
/// outcome of exactly the attempt they waited on.
#[derive(Debug, Default)]
struct RenewGate {
	guard: AsyncMutex<()>,
	last_ok: Mutex<bool>,
}
impl RenewGate {
	fn finish(&self, succeeded: bool) {
		*self.last_ok.lock() = succeeded;
	}

	fn last_ok(&self) -> bool {
		*self.last_ok.lock()
	}
}

/// Keeps the stored session token fresh.
///
/// Scheduling and coordination live here; the session-ending side effects of a failed
/// renewal (clearing state, navigation) belong to the dispatch layer, which keeps this
/// type testable without any page environment.
pub struct TokenLifecycle {
	transport: Arc<dyn GatewayTransport>,
	session: SessionStore,
	resolver: Arc<OriginResolver>,
	clock: Arc<dyn Clock>,
	config: GatewayConfig,
	gate: RenewGate,
	timer: Mutex<Option<JoinHandle<()>>>,
}
impl TokenLifecycle {
	/// Creates a lifecycle manager over the provided capabilities.
	pub fn new(
		transport: Arc<dyn GatewayTransport>,
		session: SessionStore,
		resolver: Arc<OriginResolver>,
		clock: Arc<dyn Clock>,
		config: GatewayConfig,
	) -> Self {
		Self {
			transport,
			session,
			resolver,
			clock,
			config,
			gate: RenewGate::default(),
			timer: Mutex::new(None),
		}
	}

	/// Computes how long to wait before proactively renewing the provided claims.
	///
	/// The delay targets the configured lead ahead of expiry and never drops below the
	/// scheduling floor, so an already-short-lived token renews once, shortly after
	/// scheduling, instead of storming the endpoint. Claims without a known expiry yield
	/// no delay because nothing can be scheduled for them.
	pub fn renewal_delay(&self, claims: &TokenClaims) -> Option<Duration> {
		let expires_at = claims.expires_at?;
		let delay = expires_at - self.clock.now() - self.config.renewal_lead;

		Some(delay.max(self.config.renewal_floor))
	}

	/// Arms the proactive renewal timer for the currently stored token.
	///
	/// Any pending timer is cancelled first. Without a stored token, or with a token
	/// whose expiry cannot be decoded, no timer is armed.
	pub async fn schedule_renewal(self: &Arc<Self>) {
		self.cancel_renewal();

		let Ok(Some(token)) = self.session.access_token().await else {
			return;
		};
		let Some(delay) = self.renewal_delay(&TokenClaims::decode(&token)) else {
			return;
		};
		// The task holds a weak reference so a dropped gateway is not kept alive by its
		// own renewal timer.
		let lifecycle = Arc::downgrade(self);
		let handle = tokio::spawn(async move {
			sleep(delay.unsigned_abs()).await;

			let Some(lifecycle) = Weak::upgrade(&lifecycle) else {
				return;
			};

			// This timer has fired; forget its handle first so a reschedule issued by
			// the renewal below cannot abort the task performing it.
			drop(lifecycle.timer.lock().take());
			lifecycle.renew_if_idle().await;
		});

		*self.timer.lock() = Some(handle);
	}

	/// Cancels any pending renewal timer.
	pub fn cancel_renewal(&self) {
		if let Some(handle) = self.timer.lock().take() {
			handle.abort();
		}
	}

	/// Performs one renewal attempt with the currently stored token.
	///
	/// On success the replacement token is persisted and the timer re-arms for it. Any
	/// failure leaves the stored session untouched; deciding what a failed renewal means
	/// for the session is the caller's business.
	pub async fn renew(self: &Arc<Self>) -> Result<(), RenewalError> {
		const KIND: OpKind = OpKind::Renewal;

		let span = OpSpan::new(KIND, "renew");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.renew_inner()).await;
		let outcome = if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure };

		span.settle(outcome);
		obs::record_op_outcome(KIND, outcome);

		result
	}

	/// Runs a renewal only when none is currently in flight.
	///
	/// The timer lands here when it fires. Firing during an in-flight renewal is a no-op
	/// since that attempt re-arms the timer itself on completion.
	pub async fn renew_if_idle(self: &Arc<Self>) {
		let Some(_gate) = self.gate.guard.try_lock() else {
			return;
		};
		let result = self.renew().await;

		self.gate.finish(result.is_ok());
	}

	/// Coordinates renewal across concurrent callers so exactly one attempt runs.
	///
	/// The first caller performs the attempt; callers arriving while it runs wait on the
	/// gate and adopt its outcome instead of stacking further attempts.
	pub async fn renew_shared(self: &Arc<Self>) -> SharedRenewal {
		match self.gate.guard.try_lock() {
			Some(_gate) => {
				let result = self.renew().await;

				self.gate.finish(result.is_ok());

				SharedRenewal::Performed(result)
			},
			None => {
				let _gate = self.gate.guard.lock().await;

				if self.gate.last_ok() {
					SharedRenewal::Adopted(Ok(()))
				} else {
					SharedRenewal::Adopted(Err(RenewalError::SharedFailure))
				}
			},
		}
	}

	/// Returns an activity observer that re-arms the renewal timer on each event.
	///
	/// Re-arming on activity debounces renewal to the last moment of observed use; the
	/// scheduling floor still guarantees renewal before hard expiry either way.
	pub fn activity_observer(self: &Arc<Self>) -> Arc<dyn ActivityObserver> {
		Arc::new(LifecycleActivity { lifecycle: Arc::downgrade(self) })
	}

	/// [`Self::schedule_renewal`] behind an erased future type.
	///
	/// Scheduling spawns a task that renews, and renewing reschedules; boxing this leg
	/// breaks the otherwise cyclic `Send` inference across that recursion.
	fn schedule_renewal_erased(self: &Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		Box::pin(self.schedule_renewal())
	}

	async fn renew_inner(self: &Arc<Self>) -> Result<(), RenewalError> {
		let token = self.session.access_token().await?.ok_or(RenewalError::NoSession)?;
		let origin = self.resolver.resolve().await;
		let url = self
			.resolver
			.base_for(&origin)
			.join(&self.config.renewal_path)
			.map_err(|e| RenewalError::Transport { source: TransportError::network(e) })?;
		let response = self
			.transport
			.execute(WireRequest::new(Method::Post, url).bearer(token))
			.await
			.map_err(|e| RenewalError::Transport { source: e })?;

		if !response.is_success() {
			return Err(RenewalError::Endpoint { status: response.status });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let reply: RenewalReply = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| RenewalError::ResponseParse { source: e })?;
		let renewed = AccessToken::new(reply.token.ok_or(RenewalError::MissingToken)?);

		self.session.set_access_token(&renewed).await?;
		self.schedule_renewal_erased().await;

		Ok(())
	}
}
impl Debug for TokenLifecycle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenLifecycle").field("config", &self.config).finish_non_exhaustive()
	}
}
impl Drop for TokenLifecycle {
	fn drop(&mut self) {
		self.cancel_renewal();
	}
}

struct LifecycleActivity {
	lifecycle: Weak<TokenLifecycle>,
}
impl ActivityObserver for LifecycleActivity {
	fn on_activity(&self, _: ActivityKind) {
		let Some(lifecycle) = self.lifecycle.upgrade() else {
			return;
		};

		tokio::spawn(async move {
			lifecycle.schedule_renewal().await;
		});
	}
}
