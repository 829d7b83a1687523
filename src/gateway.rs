//! The gateway service object every backend call passes through.
//!
//! One instance owns the session store, origin resolver, public-surface classifier, and
//! token lifecycle, and binds them into the dispatch pipeline. All state is instance
//! scoped and every capability (store, clock, navigator, transport) is injected, so the
//! whole stack runs headlessly under test doubles.

pub mod request;
pub use request::*;

mod dispatch;

// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	host::{ActivitySignal, Clock, Navigator},
	http::GatewayTransport,
	lifecycle::TokenLifecycle,
	origin::{Origin, OriginResolver},
	store::{ClientStore, SessionStore},
	surface::PublicSurface,
};
#[cfg(feature = "reqwest")]
use crate::{host::SystemClock, http::ReqwestTransport};

/// The dispatch target bound on first use: one resolved origin and its base URL.
#[derive(Clone, Debug)]
struct BoundTarget {
	origin: Origin,
	base: Url,
}

/// Client-side API gateway for a multi-tenant dashboard backend.
///
/// Construction is cheap and performs no I/O; the dispatch target is bound lazily on the
/// first request and rebound on transport failure or override changes.
pub struct Gateway {
	transport: Arc<dyn GatewayTransport>,
	session: SessionStore,
	resolver: Arc<OriginResolver>,
	surface: PublicSurface,
	lifecycle: Arc<TokenLifecycle>,
	navigator: Arc<dyn Navigator>,
	config: GatewayConfig,
	target: Mutex<Option<BoundTarget>>,
	bind_guard: AsyncMutex<()>,
}
impl Gateway {
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn ClientStore>,
		navigator: Arc<dyn Navigator>,
		clock: Arc<dyn Clock>,
		config: GatewayConfig,
		transport: Arc<dyn GatewayTransport>,
	) -> Self {
		let session = SessionStore::new(store);
		let resolver = Arc::new(OriginResolver::new(
			transport.clone(),
			session.clone(),
			navigator.clone(),
			clock.clone(),
			config.clone(),
		));
		let surface =
			PublicSurface::new(transport.clone(), resolver.clone(), clock.clone(), config.clone());
		let lifecycle = Arc::new(TokenLifecycle::new(
			transport.clone(),
			session.clone(),
			resolver.clone(),
			clock,
			config.clone(),
		));

		Self {
			transport,
			session,
			resolver,
			surface,
			lifecycle,
			navigator,
			config,
			target: Mutex::new(None),
			bind_guard: AsyncMutex::new(()),
		}
	}

	/// Returns the session store shared with login flows.
	pub fn session(&self) -> &SessionStore {
		&self.session
	}

	/// Returns the token lifecycle manager, for scheduling after login.
	pub fn lifecycle(&self) -> &Arc<TokenLifecycle> {
		&self.lifecycle
	}

	/// Subscribes the renewal rescheduler to a host activity signal.
	pub fn attach_activity(&self, signal: &dyn ActivitySignal) {
		signal.subscribe(self.lifecycle.activity_observer());
	}

	/// Returns the origin the dispatch target is currently bound to, if bound.
	pub fn active_origin(&self) -> Option<Origin> {
		self.target.lock().as_ref().map(|target| target.origin.clone())
	}

	/// Discards the bound target and cached record, then resolves and rebinds.
	pub async fn refresh_origin(&self) -> Origin {
		self.rebind_target().await.origin
	}

	/// Forces a refetch of the public-surface patterns, bypassing the TTL.
	pub async fn refresh_public_surface(&self) -> Result<()> {
		Ok(self.surface.refresh().await?)
	}

	/// Persists a manual origin override and retargets the live dispatch slot.
	///
	/// The override takes effect immediately for requests already holding no target as
	/// well as future ones; no rebuild or reload is required.
	pub async fn set_origin_override(&self, origin: Origin) -> Result<()> {
		self.resolver.set_override(origin.clone()).await?;
		self.bind_target(origin);

		Ok(())
	}

	/// Removes the manual override, re-resolves, and retargets the dispatch slot.
	pub async fn clear_origin_override(&self) -> Result<Origin> {
		let origin = self.resolver.clear_override().await?;

		self.bind_target(origin.clone());

		Ok(origin)
	}

	/// Clears the stored session and cancels proactive renewal.
	///
	/// This is the voluntary logout path; it runs none of the forced-navigation side
	/// effects of an unrecoverable renewal failure.
	pub async fn clear_session(&self) -> Result<()> {
		self.lifecycle.cancel_renewal();
		self.session.clear_session().await?;

		Ok(())
	}

	/// Returns the bound dispatch target, binding it on first use.
	///
	/// Concurrent first callers share a single resolution through the bind guard and all
	/// observe the same target.
	async fn ensure_target(&self) -> BoundTarget {
		if let Some(target) = self.target.lock().clone() {
			return target;
		}

		let _bind = self.bind_guard.lock().await;

		// A concurrent first caller may have bound the target while this one waited.
		if let Some(target) = self.target.lock().clone() {
			return target;
		}

		let origin = self.resolver.resolve().await;

		self.bind_target(origin)
	}

	async fn rebind_target(&self) -> BoundTarget {
		self.resolver.invalidate();
		*self.target.lock() = None;

		self.ensure_target().await
	}

	fn bind_target(&self, origin: Origin) -> BoundTarget {
		let target = BoundTarget { base: self.resolver.base_for(&origin), origin };

		*self.target.lock() = Some(target.clone());

		target
	}
}
#[cfg(feature = "reqwest")]
impl Gateway {
	/// Creates a gateway with the crate's default reqwest transport and system clock.
	pub fn new(
		store: Arc<dyn ClientStore>,
		navigator: Arc<dyn Navigator>,
		config: GatewayConfig,
	) -> Self {
		Self::with_transport(
			store,
			navigator,
			Arc::new(SystemClock),
			config,
			Arc::new(ReqwestTransport::default()),
		)
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("target", &*self.target.lock())
			.finish_non_exhaustive()
	}
}
