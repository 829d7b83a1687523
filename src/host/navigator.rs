//! Page-context contract: where the gateway runs and how it forces navigation.

// std
use std::net::IpAddr;
// self
use crate::_prelude::*;

/// Hosting-page context provider plus the forced-navigation side effects.
///
/// Same-origin configuration fetches and proxy-relative dispatch both derive their base from
/// [`Navigator::location`]; the two side effects run only on unrecoverable renewal failure.
pub trait Navigator: Send + Sync {
	/// Returns the location of the page the gateway runs on.
	fn location(&self) -> PageLocation;

	/// Blocks with a session-expiry notification until the host dismisses it.
	fn notify_session_expired(&self, message: &str);

	/// Hard-navigates the host page to the provided rooted path.
	fn navigate(&self, path: &str);
}

/// Location of the hosting page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLocation {
	/// URL scheme, `http` or `https`.
	pub scheme: String,
	/// Hostname without brackets; IPv6 literals keep their colon form.
	pub hostname: String,
	/// Explicit port, when the page URL carries one.
	pub port: Option<u16>,
}
impl PageLocation {
	/// Creates a location from its parts.
	pub fn new(scheme: impl Into<String>, hostname: impl Into<String>, port: Option<u16>) -> Self {
		Self { scheme: scheme.into(), hostname: hostname.into(), port }
	}

	/// Builds the page origin as an absolute URL.
	pub fn origin_url(&self) -> Result<Url, url::ParseError> {
		let host = if self.hostname.contains(':') {
			format!("[{}]", self.hostname.trim_matches(['[', ']']))
		} else {
			self.hostname.clone()
		};
		let origin = match self.port {
			Some(port) => format!("{}://{host}:{port}", self.scheme),
			None => format!("{}://{host}", self.scheme),
		};

		Url::parse(&origin)
	}

	/// True when the page host is a loopback or unspecified development host.
	pub fn is_local(&self) -> bool {
		matches!(self.hostname.as_str(), "localhost" | "127.0.0.1" | "::1" | "[::1]" | "0.0.0.0")
	}

	/// True when the page host is a literal IP address rather than a name.
	pub fn is_bare_ip(&self) -> bool {
		IpAddr::from_str(self.hostname.trim_matches(['[', ']'])).is_ok()
	}
}
