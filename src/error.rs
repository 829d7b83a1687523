//! Gateway-level error types shared across dispatch, renewal, and resolution.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session renewal failure.
	#[error(transparent)]
	Renewal(#[from] RenewalError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Public-surface discovery failure; raised only by the forced-refresh surface.
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),

	/// Backend kept rejecting the credential after a completed renewal.
	#[error("Backend rejected the authenticated request with status {status}.")]
	AuthRejected {
		/// HTTP status returned on the replayed request.
		status: u16,
	},
	/// No session token is stored, so the operation cannot authenticate.
	#[error("No session token is available.")]
	NoSession,
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configured backend origin cannot be parsed as an absolute URL.
	#[error("Default backend origin is not an absolute URL.")]
	InvalidBackendOrigin {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configured backend origin carries no usable port.
	#[error("Default backend origin does not yield a backend port.")]
	MissingBackendPort,
	/// Endpoint path is not rooted.
	#[error("Endpoint path `{path}` must start with `/`.")]
	RelativePath {
		/// Offending path value.
		path: String,
	},
	/// A cache lifetime was configured as zero or negative.
	#[error("The {setting} duration must be positive.")]
	NonPositiveDuration {
		/// Configuration field label.
		setting: &'static str,
	},
	/// Renewal lead does not leave room above the scheduling floor.
	#[error("Renewal lead must be at least the scheduling floor.")]
	LeadBelowFloor,

	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	BodyEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Request path and resolved origin do not combine into a valid URL.
	#[error("Request path `{path}` does not join onto the resolved origin.")]
	InvalidRequestPath {
		/// Offending path value.
		path: String,
	},
}

/// Session renewal failures; the caller that performed the attempt decides whether to log out.
#[derive(Debug, ThisError)]
pub enum RenewalError {
	/// No session token exists to present to the renewal endpoint.
	#[error("No session token is available to renew.")]
	NoSession,
	/// Renewal endpoint answered with a non-success status.
	#[error("Session renewal endpoint returned status {status}.")]
	Endpoint {
		/// HTTP status returned by the renewal endpoint.
		status: u16,
	},
	/// Renewal endpoint responded with malformed JSON that could not be parsed.
	#[error("Session renewal response is malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Renewal endpoint answered with success but omitted the replacement token.
	#[error("Session renewal response did not include a token.")]
	MissingToken,
	/// Renewal request never reached the endpoint.
	#[error("Session renewal request could not reach the backend.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Stored session state could not be read or written during renewal.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// A renewal performed by a concurrent caller failed; this caller adopted that outcome.
	#[error("A concurrent session renewal attempt failed.")]
	SharedFailure,
}

/// Public-surface discovery failures (the hot path degrades instead of raising these).
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
	/// Discovery endpoint answered with a non-success status.
	#[error("Extension discovery endpoint returned status {status}.")]
	Endpoint {
		/// HTTP status returned by the discovery endpoint.
		status: u16,
	},
	/// Discovery endpoint responded with malformed JSON that could not be parsed.
	#[error("Extension discovery response is malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Discovery request never reached the endpoint.
	#[error("Extension discovery request could not reach the backend.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
}

/// Transport-level failures (network, IO); any HTTP status arrives as a response instead.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete within its cooperative deadline.
	#[error("Request did not complete within {timeout}.")]
	Timeout {
		/// Deadline that elapsed.
		timeout: Duration,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
