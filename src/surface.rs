//! Public-surface classification: which request paths skip authentication.
//!
//! Installed extensions may add their own public routes, so the set is discovered at
//! runtime instead of hard-coded. Discovery failures never fail a caller-visible request;
//! the classifier degrades to a minimal fallback set and caches it for the normal lifetime
//! so a transient failure cannot cause a request storm.

// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::{DiscoveryError, TransportError},
	host::Clock,
	http::{GatewayTransport, Method, WireRequest},
	obs::{self, OpKind, OpOutcome, OpSpan},
	origin::OriginResolver,
};

/// One classification pattern: a literal path or a wildcard prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicPattern {
	/// Matches exactly one path.
	Literal(String),
	/// Matches the base path itself and everything nested under it.
	Wildcard(String),
}
impl PublicPattern {
	/// Parses the textual form; a trailing `/*` selects the wildcard flavor.
	pub fn parse(raw: &str) -> Self {
		match raw.strip_suffix("/*") {
			Some(base) if !base.is_empty() => Self::Wildcard(base.to_owned()),
			_ => Self::Literal(raw.to_owned()),
		}
	}

	/// True when the provided path falls under this pattern.
	///
	/// Wildcards match on segment boundaries, so `/api/store` covers `/api/store/items`
	/// but never `/api/storefront`.
	pub fn matches(&self, path: &str) -> bool {
		match self {
			Self::Literal(literal) => path == literal,
			Self::Wildcard(base) =>
				path == base
					|| path.strip_prefix(base.as_str()).is_some_and(|rest| rest.starts_with('/')),
		}
	}
}

/// One installed extension as reported by the discovery endpoint.
#[derive(Clone, Debug, Deserialize)]
struct ExtensionManifest {
	name: String,
	#[serde(default)]
	routes: Vec<RouteManifest>,
}

/// One frontend route declared by an extension manifest.
#[derive(Clone, Debug, Deserialize)]
struct RouteManifest {
	path: String,
	#[serde(default)]
	public: bool,
}

#[derive(Clone, Debug)]
struct SurfaceCache {
	patterns: Vec<PublicPattern>,
	fetched_at: OffsetDateTime,
}

/// Classifies request paths as public (no credential attached) or protected.
pub struct PublicSurface {
	transport: Arc<dyn GatewayTransport>,
	resolver: Arc<OriginResolver>,
	clock: Arc<dyn Clock>,
	config: GatewayConfig,
	cache: Mutex<Option<SurfaceCache>>,
	refresh_guard: AsyncMutex<()>,
}
impl PublicSurface {
	/// Creates a classifier over the provided capabilities.
	pub fn new(
		transport: Arc<dyn GatewayTransport>,
		resolver: Arc<OriginResolver>,
		clock: Arc<dyn Clock>,
		config: GatewayConfig,
	) -> Self {
		Self {
			transport,
			resolver,
			clock,
			config,
			cache: Mutex::new(None),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Classifies the provided path, refreshing the pattern cache when stale.
	///
	/// Query and fragment suffixes are ignored. The discovery path short-circuits before
	/// any I/O so discovery can never recurse through its own classification.
	pub async fn is_public(&self, path: &str) -> bool {
		let path = path.split(['?', '#']).next().unwrap_or(path);

		if path == self.config.discovery_path {
			return true;
		}

		if let Some(patterns) = self.fresh_patterns() {
			return patterns.iter().any(|pattern| pattern.matches(path));
		}

		let _singleflight = self.refresh_guard.lock().await;

		// A concurrent refresh may have landed while waiting on the guard.
		let patterns = match self.fresh_patterns() {
			Some(patterns) => patterns,
			None => match self.refresh_locked().await {
				Ok(patterns) => patterns,
				Err(_) => self.fallback_patterns(),
			},
		};

		patterns.iter().any(|pattern| pattern.matches(path))
	}

	/// Forces a refetch bypassing the TTL.
	///
	/// The hot path degrades silently; this surface reports the failure for diagnostics
	/// while still caching the fallback set so subsequent classification stays quiet.
	pub async fn refresh(&self) -> Result<(), DiscoveryError> {
		let _singleflight = self.refresh_guard.lock().await;

		self.refresh_locked().await.map(|_| ())
	}

	/// Returns the cached pattern set regardless of age.
	pub fn cached_patterns(&self) -> Option<Vec<PublicPattern>> {
		self.cache.lock().clone().map(|cache| cache.patterns)
	}

	async fn refresh_locked(&self) -> Result<Vec<PublicPattern>, DiscoveryError> {
		const KIND: OpKind = OpKind::SurfaceDiscovery;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		match span.instrument(self.fetch_patterns()).await {
			Ok(patterns) => {
				span.settle(OpOutcome::Success);
				obs::record_op_outcome(KIND, OpOutcome::Success);
				self.store(patterns.clone());

				Ok(patterns)
			},
			Err(e) => {
				span.settle(OpOutcome::Failure);
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				obs::record_degraded(KIND, "fallback");
				self.store(self.fallback_patterns());

				Err(e)
			},
		}
	}

	async fn fetch_patterns(&self) -> Result<Vec<PublicPattern>, DiscoveryError> {
		let origin = self.resolver.resolve().await;
		let base = self.resolver.base_for(&origin);
		let url = base
			.join(&self.config.discovery_path)
			.map_err(|e| DiscoveryError::Transport { source: TransportError::network(e) })?;
		let response = self
			.transport
			.execute(WireRequest::new(Method::Get, url))
			.await
			.map_err(|e| DiscoveryError::Transport { source: e })?;

		if !response.is_success() {
			return Err(DiscoveryError::Endpoint { status: response.status });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let manifests: Vec<ExtensionManifest> = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| DiscoveryError::ResponseParse { source: e })?;

		Ok(derive_patterns(&manifests, &self.config.discovery_path))
	}

	fn fresh_patterns(&self) -> Option<Vec<PublicPattern>> {
		self.cache
			.lock()
			.clone()
			.filter(|cache| self.clock.now() - cache.fetched_at < self.config.surface_ttl)
			.map(|cache| cache.patterns)
	}

	fn fallback_patterns(&self) -> Vec<PublicPattern> {
		vec![
			PublicPattern::parse(&self.config.discovery_path),
			PublicPattern::Wildcard("/api/public".into()),
		]
	}

	fn store(&self, patterns: Vec<PublicPattern>) {
		*self.cache.lock() = Some(SurfaceCache { patterns, fetched_at: self.clock.now() });
	}
}

/// Unions the discovery path with the patterns each extension contributes.
fn derive_patterns(manifests: &[ExtensionManifest], discovery_path: &str) -> Vec<PublicPattern> {
	let mut patterns = vec![PublicPattern::parse(discovery_path)];

	for manifest in manifests {
		let declared: Vec<_> = manifest.routes.iter().filter(|route| route.public).collect();

		if declared.is_empty() {
			// Name-based guess for integrations that never declare routes; prone to false
			// positives, so manifest declarations always win when present.
			if looks_like_commerce(&manifest.name) {
				patterns.push(PublicPattern::Wildcard(format!("/api/{}", manifest.name)));
			}

			continue;
		}

		for route in declared {
			let trimmed = route.path.trim_end_matches('/');

			if trimmed.is_empty() {
				continue;
			}

			let rooted =
				if trimmed.starts_with('/') { trimmed.to_owned() } else { format!("/{trimmed}") };

			patterns.push(PublicPattern::Wildcard(format!("/api{rooted}")));
		}
	}

	patterns
}

fn looks_like_commerce(name: &str) -> bool {
	let lowered = name.to_lowercase();

	["store", "shop", "market"].iter().any(|needle| lowered.contains(needle))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn manifest(name: &str, routes: &[(&str, bool)]) -> ExtensionManifest {
		ExtensionManifest {
			name: name.into(),
			routes: routes
				.iter()
				.map(|(path, public)| RouteManifest { path: (*path).into(), public: *public })
				.collect(),
		}
	}

	#[test]
	fn wildcard_matches_nested_segments_only() {
		let pattern = PublicPattern::parse("/api/store/*");

		assert!(pattern.matches("/api/store"));
		assert!(pattern.matches("/api/store/items"));
		assert!(pattern.matches("/api/store/items/5"));
		assert!(!pattern.matches("/api/storefront/x"));
		assert!(!pattern.matches("/api/stor"));
	}

	#[test]
	fn literal_requires_exact_match() {
		let pattern = PublicPattern::parse("/api/extensions/public");

		assert!(pattern.matches("/api/extensions/public"));
		assert!(!pattern.matches("/api/extensions/public/extra"));
		assert!(!pattern.matches("/api/extensions"));
	}

	#[test]
	fn bare_wildcard_never_matches_everything() {
		let pattern = PublicPattern::parse("/*");

		assert!(!pattern.matches("/api/items"));
		assert!(pattern.matches("/*"));
	}

	#[test]
	fn declared_public_routes_become_api_wildcards() {
		let manifests = [manifest("blog", &[("/blog", true), ("/blog/admin", false)])];
		let patterns = derive_patterns(&manifests, "/api/extensions/public");

		assert!(patterns.contains(&PublicPattern::Wildcard("/api/blog".into())));
		assert!(!patterns.contains(&PublicPattern::Wildcard("/api/blog/admin".into())));
		assert!(patterns.contains(&PublicPattern::Literal("/api/extensions/public".into())));
	}

	#[test]
	fn commerce_name_guess_applies_only_without_declared_routes() {
		let manifests = [
			manifest("storefront", &[]),
			manifest("shop-window", &[("/window", true)]),
			manifest("calendar", &[]),
		];
		let patterns = derive_patterns(&manifests, "/api/extensions/public");

		assert!(patterns.contains(&PublicPattern::Wildcard("/api/storefront".into())));
		// Declared routes suppress the guess even for commerce-looking names.
		assert!(!patterns.contains(&PublicPattern::Wildcard("/api/shop-window".into())));
		assert!(patterns.contains(&PublicPattern::Wildcard("/api/window".into())));
		assert!(!patterns.iter().any(|p| p.matches("/api/calendar")));
	}
}
