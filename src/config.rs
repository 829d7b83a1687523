//! Gateway configuration: endpoint paths, cache lifetimes, and renewal scheduling knobs.

// self
use crate::{_prelude::*, error::ConfigError};

/// Backend origin assumed when every resolution strategy fails and the page runs locally.
pub const DEFAULT_BACKEND_ORIGIN: &str = "http://localhost:8000";

/// Validated gateway configuration.
///
/// Build one through [`GatewayConfig::builder`]; [`GatewayConfig::standard`] yields the
/// stock deployment layout (same-origin config files, `/api`-rooted endpoints).
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Fallback backend origin used by the resolution heuristic.
	pub default_backend_origin: Url,
	/// Backend port derived from [`Self::default_backend_origin`] during validation.
	pub backend_port: u16,
	/// Session renewal endpoint path.
	pub renewal_path: String,
	/// Deployment-time runtime configuration file path, fetched same-origin.
	pub runtime_config_path: String,
	/// Legacy backend hint path, fetched same-origin.
	pub legacy_config_path: String,
	/// Liveness path probed on candidate origins; any 2xx confirms.
	pub probe_path: String,
	/// Public-extension discovery endpoint path.
	pub discovery_path: String,
	/// Login page path used for forced navigation after an unrecoverable renewal failure.
	pub login_path: String,
	/// Lifetime of a resolved backend origin.
	pub origin_ttl: Duration,
	/// Lifetime of the public-surface pattern cache, for hits and degraded fallbacks alike.
	pub surface_ttl: Duration,
	/// How far ahead of token expiry the renewal timer fires.
	pub renewal_lead: Duration,
	/// Minimum renewal timer delay; keeps near-expiry tokens from firing immediately.
	pub renewal_floor: Duration,
	/// Cooperative deadline for origin liveness probes.
	pub probe_timeout: Duration,
}
impl GatewayConfig {
	/// Creates a builder seeded with the stock deployment layout.
	pub fn builder() -> GatewayConfigBuilder {
		GatewayConfigBuilder::new()
	}

	/// Builds the stock configuration without overrides.
	pub fn standard() -> Result<Self, ConfigError> {
		GatewayConfigBuilder::new().build()
	}

	pub(crate) fn probe_timeout_std(&self) -> std::time::Duration {
		self.probe_timeout.unsigned_abs()
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Fallback backend origin; validated as an absolute URL with a derivable port.
	pub default_backend_origin: String,
	/// Session renewal endpoint path.
	pub renewal_path: String,
	/// Deployment-time runtime configuration file path.
	pub runtime_config_path: String,
	/// Legacy backend hint path.
	pub legacy_config_path: String,
	/// Liveness path probed on candidate origins.
	pub probe_path: String,
	/// Public-extension discovery endpoint path.
	pub discovery_path: String,
	/// Login page path.
	pub login_path: String,
	/// Lifetime of a resolved backend origin.
	pub origin_ttl: Duration,
	/// Lifetime of the public-surface pattern cache.
	pub surface_ttl: Duration,
	/// How far ahead of token expiry the renewal timer fires.
	pub renewal_lead: Duration,
	/// Minimum renewal timer delay.
	pub renewal_floor: Duration,
	/// Cooperative deadline for origin liveness probes.
	pub probe_timeout: Duration,
}
impl GatewayConfigBuilder {
	/// Creates a builder seeded with the stock deployment layout.
	pub fn new() -> Self {
		Self {
			default_backend_origin: DEFAULT_BACKEND_ORIGIN.into(),
			renewal_path: "/api/user/refresh".into(),
			runtime_config_path: "/runtime-config.json".into(),
			legacy_config_path: "/frontend-config".into(),
			probe_path: "/docs".into(),
			discovery_path: "/api/extensions/public".into(),
			login_path: "/login".into(),
			origin_ttl: Duration::minutes(5),
			surface_ttl: Duration::minutes(10),
			renewal_lead: Duration::seconds(120),
			renewal_floor: Duration::seconds(10),
			probe_timeout: Duration::seconds(3),
		}
	}

	/// Overrides the fallback backend origin.
	pub fn default_backend_origin(mut self, origin: impl Into<String>) -> Self {
		self.default_backend_origin = origin.into();

		self
	}

	/// Overrides the session renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = path.into();

		self
	}

	/// Overrides the runtime configuration file path.
	pub fn runtime_config_path(mut self, path: impl Into<String>) -> Self {
		self.runtime_config_path = path.into();

		self
	}

	/// Overrides the legacy backend hint path.
	pub fn legacy_config_path(mut self, path: impl Into<String>) -> Self {
		self.legacy_config_path = path.into();

		self
	}

	/// Overrides the liveness probe path.
	pub fn probe_path(mut self, path: impl Into<String>) -> Self {
		self.probe_path = path.into();

		self
	}

	/// Overrides the public-extension discovery endpoint path.
	pub fn discovery_path(mut self, path: impl Into<String>) -> Self {
		self.discovery_path = path.into();

		self
	}

	/// Overrides the login page path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the resolved-origin lifetime.
	pub fn origin_ttl(mut self, ttl: Duration) -> Self {
		self.origin_ttl = ttl;

		self
	}

	/// Overrides the public-surface cache lifetime.
	pub fn surface_ttl(mut self, ttl: Duration) -> Self {
		self.surface_ttl = ttl;

		self
	}

	/// Overrides the renewal lead.
	pub fn renewal_lead(mut self, lead: Duration) -> Self {
		self.renewal_lead = lead;

		self
	}

	/// Overrides the renewal scheduling floor.
	pub fn renewal_floor(mut self, floor: Duration) -> Self {
		self.renewal_floor = floor;

		self
	}

	/// Overrides the probe deadline.
	pub fn probe_timeout(mut self, timeout: Duration) -> Self {
		self.probe_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let default_backend_origin = Url::parse(&self.default_backend_origin)
			.map_err(|e| ConfigError::InvalidBackendOrigin { source: e })?;
		let backend_port = default_backend_origin
			.port_or_known_default()
			.ok_or(ConfigError::MissingBackendPort)?;

		for path in [
			&self.renewal_path,
			&self.runtime_config_path,
			&self.legacy_config_path,
			&self.probe_path,
			&self.discovery_path,
			&self.login_path,
		] {
			if !path.starts_with('/') {
				return Err(ConfigError::RelativePath { path: path.clone() });
			}
		}
		for (setting, duration) in [
			("origin cache", self.origin_ttl),
			("public-surface cache", self.surface_ttl),
			("renewal lead", self.renewal_lead),
			("renewal floor", self.renewal_floor),
			("probe timeout", self.probe_timeout),
		] {
			if !duration.is_positive() {
				return Err(ConfigError::NonPositiveDuration { setting });
			}
		}
		if self.renewal_lead < self.renewal_floor {
			return Err(ConfigError::LeadBelowFloor);
		}

		Ok(GatewayConfig {
			default_backend_origin,
			backend_port,
			renewal_path: self.renewal_path,
			runtime_config_path: self.runtime_config_path,
			legacy_config_path: self.legacy_config_path,
			probe_path: self.probe_path,
			discovery_path: self.discovery_path,
			login_path: self.login_path,
			origin_ttl: self.origin_ttl,
			surface_ttl: self.surface_ttl,
			renewal_lead: self.renewal_lead,
			renewal_floor: self.renewal_floor,
			probe_timeout: self.probe_timeout,
		})
	}
}
impl Default for GatewayConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
