//! Layered backend origin resolution.
//!
//! The resolver tries the cheapest trustworthy source first: the manual override, the
//! deployment's runtime configuration file, the freshly cached record, the legacy backend
//! hint, an active liveness probe, and finally a heuristic derived from the page location.
//! Every strategy failure degrades to the next one, so [`OriginResolver::resolve`] never
//! errors; degraded steps are visible only through the `obs` counters.

// crates.io
use tokio::time::timeout;
// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::TransportError,
	host::{Clock, Navigator, PageLocation},
	http::{GatewayTransport, Method, WireRequest, WireResponse},
	obs::{self, OpKind, OpOutcome, OpSpan},
	origin::{Origin, OriginRecord},
	store::{SessionStore, StoreError},
};

/// Same-origin configuration payload carrying a backend origin hint.
#[derive(Debug, Deserialize)]
struct BackendHint {
	backend_url: Option<String>,
}

/// Resolves the backend origin for every outgoing request.
pub struct OriginResolver {
	transport: Arc<dyn GatewayTransport>,
	session: SessionStore,
	navigator: Arc<dyn Navigator>,
	clock: Arc<dyn Clock>,
	config: GatewayConfig,
	record: Mutex<Option<OriginRecord>>,
	// Some(outcome) once the runtime file was fetched; cleared by invalidate.
	runtime_memo: Mutex<Option<Option<Origin>>>,
	resolve_guard: AsyncMutex<()>,
}
impl OriginResolver {
	/// Creates a resolver over the provided capabilities.
	pub fn new(
		transport: Arc<dyn GatewayTransport>,
		session: SessionStore,
		navigator: Arc<dyn Navigator>,
		clock: Arc<dyn Clock>,
		config: GatewayConfig,
	) -> Self {
		Self {
			transport,
			session,
			navigator,
			clock,
			config,
			record: Mutex::new(None),
			runtime_memo: Mutex::new(None),
			resolve_guard: AsyncMutex::new(()),
		}
	}

	/// Resolves the backend origin, trying the cheapest trustworthy source first.
	///
	/// Concurrent cold resolutions run the chain once; late arrivals observe the record the
	/// first resolution cached.
	pub async fn resolve(&self) -> Origin {
		const KIND: OpKind = OpKind::OriginResolution;

		let span = OpSpan::new(KIND, "resolve");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let origin = span
			.instrument(async move {
				// The manual override outranks everything, the cache included.
				if let Some(origin) = self.override_origin().await {
					return origin;
				}

				let _singleflight = self.resolve_guard.lock().await;

				if let Some(origin) = self.runtime_hint().await {
					self.store_record(origin.clone());

					return origin;
				}
				if let Some(record) = self.fresh_record() {
					return record.origin;
				}
				if let Some(origin) = self.legacy_hint().await {
					self.store_record(origin.clone());

					return origin;
				}
				if let Some(origin) = self.probe_candidate().await {
					self.store_record(origin.clone());

					return origin;
				}

				let origin = self.location_heuristic();

				self.store_record(origin.clone());

				origin
			})
			.await;

		span.settle(OpOutcome::Success);
		obs::record_op_outcome(KIND, OpOutcome::Success);

		origin
	}

	/// Clears the cached record and the runtime-file memo, forcing the next resolution to
	/// redo the whole chain.
	pub fn invalidate(&self) {
		*self.record.lock() = None;
		*self.runtime_memo.lock() = None;
	}

	/// Returns the cached record, if any.
	pub fn current(&self) -> Option<OriginRecord> {
		self.record.lock().clone()
	}

	/// Persists the manual override and primes the cache with it immediately.
	pub async fn set_override(&self, origin: Origin) -> Result<(), StoreError> {
		self.session.set_origin_override(&origin).await?;
		self.store_record(origin);

		Ok(())
	}

	/// Removes the manual override and re-resolves from scratch.
	pub async fn clear_override(&self) -> Result<Origin, StoreError> {
		self.session.clear_origin_override().await?;
		self.invalidate();

		Ok(self.resolve().await)
	}

	/// Returns the absolute base URL that requests against the provided origin join onto.
	///
	/// Proxy routing resolves to the hosting page's own origin; the compile-time default
	/// backend origin is the last resort when the page location cannot form a URL.
	pub fn base_for(&self, origin: &Origin) -> Url {
		match origin {
			Origin::Absolute(url) => url.clone(),
			Origin::Proxy => self
				.navigator
				.location()
				.origin_url()
				.unwrap_or_else(|_| self.config.default_backend_origin.clone()),
		}
	}

	async fn override_origin(&self) -> Option<Origin> {
		match self.session.origin_override().await {
			Ok(origin) => origin,
			Err(_) => {
				obs::record_degraded(OpKind::OriginResolution, "override_read");

				None
			},
		}
	}

	async fn runtime_hint(&self) -> Option<Origin> {
		if let Some(memo) = self.runtime_memo.lock().clone() {
			return memo;
		}

		let outcome = self.fetch_hint(&self.config.runtime_config_path, "runtime_config").await;

		*self.runtime_memo.lock() = Some(outcome.clone());

		outcome
	}

	async fn legacy_hint(&self) -> Option<Origin> {
		self.fetch_hint(&self.config.legacy_config_path, "legacy_config").await
	}

	/// Fetches a same-origin configuration document and extracts its backend hint.
	///
	/// A non-2xx answer is ordinary absence (not every deployment ships the files); only
	/// transport and parse failures count as degraded steps.
	async fn fetch_hint(&self, path: &str, stage: &'static str) -> Option<Origin> {
		let base = self.navigator.location().origin_url().ok()?;
		let url = base.join(path).ok()?;
		let response = match self.transport.execute(WireRequest::new(Method::Get, url)).await {
			Ok(response) => response,
			Err(_) => {
				obs::record_degraded(OpKind::OriginResolution, stage);

				return None;
			},
		};

		if !response.is_success() {
			return None;
		}

		let hint = match serde_json::from_slice::<BackendHint>(&response.body) {
			Ok(hint) => hint,
			Err(_) => {
				obs::record_degraded(OpKind::OriginResolution, stage);

				return None;
			},
		};
		let backend_url = hint.backend_url?;

		match Origin::from_wire(&backend_url) {
			Ok(origin) => Some(origin),
			Err(_) => {
				obs::record_degraded(OpKind::OriginResolution, stage);

				None
			},
		}
	}

	fn fresh_record(&self) -> Option<OriginRecord> {
		self.record
			.lock()
			.clone()
			.filter(|record| record.is_fresh(self.clock.now(), self.config.origin_ttl))
	}

	async fn probe_candidate(&self) -> Option<Origin> {
		let location = self.navigator.location();

		// Probe bare IPs and non-local names; plain local development keeps proxy routing.
		if location.is_local() && !location.is_bare_ip() {
			return None;
		}

		let origin = self.candidate_from_location(&location)?;
		let Origin::Absolute(base) = &origin else { return None };
		let url = base.join(&self.config.probe_path).ok()?;

		// The probe future is dropped on timeout, so a late answer can never overwrite an
		// already-decided resolution.
		match self.execute_with_deadline(WireRequest::new(Method::Get, url)).await {
			Ok(response) if response.is_success() => Some(origin),
			Ok(_) => {
				obs::record_degraded(OpKind::OriginResolution, "probe_rejected");

				None
			},
			Err(TransportError::Timeout { .. }) => {
				obs::record_degraded(OpKind::OriginResolution, "probe_timeout");

				None
			},
			Err(_) => {
				obs::record_degraded(OpKind::OriginResolution, "probe_unreachable");

				None
			},
		}
	}

	fn location_heuristic(&self) -> Origin {
		let location = self.navigator.location();

		if location.is_local() {
			return Origin::Proxy;
		}

		self.candidate_from_location(&location)
			.unwrap_or_else(|| Origin::Absolute(self.config.default_backend_origin.clone()))
	}

	fn candidate_from_location(&self, location: &PageLocation) -> Option<Origin> {
		let candidate = PageLocation::new(
			location.scheme.clone(),
			location.hostname.clone(),
			Some(self.config.backend_port),
		);

		candidate.origin_url().ok().map(Origin::Absolute)
	}

	async fn execute_with_deadline(
		&self,
		request: WireRequest,
	) -> Result<WireResponse, TransportError> {
		match timeout(self.config.probe_timeout_std(), self.transport.execute(request)).await {
			Ok(outcome) => outcome,
			Err(_) => Err(TransportError::Timeout { timeout: self.config.probe_timeout }),
		}
	}

	fn store_record(&self, origin: Origin) {
		*self.record.lock() = Some(OriginRecord::new(origin, self.clock.now()));
	}
}
