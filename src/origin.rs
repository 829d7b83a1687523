//! Backend origin model and the layered resolver that discovers it.

pub mod resolver;

pub use resolver::OriginResolver;

// self
use crate::_prelude::*;

/// Where API requests route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
	/// Route relative to the hosting page; its reverse proxy forwards to the backend.
	Proxy,
	/// Route to an explicit backend origin.
	Absolute(Url),
}
impl Origin {
	/// Parses the persisted wire form; the empty string selects [`Origin::Proxy`].
	pub fn from_wire(value: &str) -> Result<Self, url::ParseError> {
		let trimmed = value.trim();

		if trimmed.is_empty() {
			Ok(Self::Proxy)
		} else {
			Url::parse(trimmed.trim_end_matches('/')).map(Self::Absolute)
		}
	}

	/// Returns the persisted wire form; [`Origin::Proxy`] becomes the empty string.
	pub fn to_wire(&self) -> String {
		match self {
			Self::Proxy => String::new(),
			Self::Absolute(url) => url.as_str().trim_end_matches('/').to_owned(),
		}
	}

	/// True when requests route through the hosting page's reverse proxy.
	pub fn is_proxy(&self) -> bool {
		matches!(self, Self::Proxy)
	}
}
impl Display for Origin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Proxy => f.write_str("<proxy>"),
			Self::Absolute(url) => f.write_str(url.as_str().trim_end_matches('/')),
		}
	}
}

/// A resolved origin stamped with the instant the resolution completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginRecord {
	/// Resolved origin.
	pub origin: Origin,
	/// Instant the resolution completed.
	pub resolved_at: OffsetDateTime,
}
impl OriginRecord {
	/// Creates a record stamped at the provided instant.
	pub fn new(origin: Origin, resolved_at: OffsetDateTime) -> Self {
		Self { origin, resolved_at }
	}

	/// True while the record's age stays strictly under the provided lifetime.
	pub fn is_fresh(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		now - self.resolved_at < ttl
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_wire_form_selects_proxy() {
		let origin = Origin::from_wire("").expect("Empty wire form should parse.");

		assert!(origin.is_proxy());
		assert_eq!(origin.to_wire(), "");
	}

	#[test]
	fn absolute_wire_form_drops_trailing_slashes() {
		let origin =
			Origin::from_wire("https://api.example.com/").expect("Absolute form should parse.");

		assert_eq!(origin.to_wire(), "https://api.example.com");
		assert_eq!(origin.to_string(), "https://api.example.com");
	}

	#[test]
	fn unparsable_wire_form_is_an_error() {
		assert!(Origin::from_wire("not a url").is_err());
	}

	#[test]
	fn record_freshness_is_strict() {
		let resolved_at = OffsetDateTime::UNIX_EPOCH;
		let record = OriginRecord::new(Origin::Proxy, resolved_at);
		let ttl = Duration::minutes(5);

		assert!(record.is_fresh(resolved_at + Duration::minutes(4), ttl));
		assert!(!record.is_fresh(resolved_at + Duration::minutes(5), ttl));
		assert!(!record.is_fresh(resolved_at + Duration::minutes(6), ttl));
	}
}
