//! Caller-facing request and response model for the dispatch surface.

// std
use std::borrow::Cow;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{Method, WireResponse},
};

/// One caller-assembled request before the pipeline touches it.
///
/// Paths are rooted and relative to the resolved origin; credentials are never set here
/// since attaching them is the pipeline's decision.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Rooted request path, optionally carrying a query string.
	pub path: String,
	/// JSON-encoded request body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without a body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), body: None }
	}

	/// Attaches a JSON body.
	///
	/// serde_json escapes exactly the JSON-mandated control characters and writes every
	/// other code point literally, so multi-byte text round-trips unchanged.
	pub fn json<T>(mut self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body =
			Some(serde_json::to_vec(payload).map_err(|e| ConfigError::BodyEncode { source: e })?);

		Ok(self)
	}

	/// Attaches a pre-encoded body as is.
	pub fn body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self
	}
}

/// One completed business response.
///
/// Only transport failures and the auth-recovery path surface as errors; every other
/// status, business 4xx/5xx included, arrives here for the caller to inspect.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// True for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Raw body bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Body decoded as UTF-8, lossily.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Decodes the body as JSON, reporting the failing path on malformed payloads.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
	}
}
impl From<WireResponse> for ApiResponse {
	fn from(response: WireResponse) -> Self {
		Self { status: response.status, body: response.body }
	}
}
