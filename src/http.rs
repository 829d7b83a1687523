//! Transport primitives for backend dispatch.
//!
//! The module exposes [`GatewayTransport`] alongside the wire-level request and response
//! model so hosts can integrate custom HTTP stacks without touching the dispatch pipeline.
//! Implementations surface only connection-level failures as [`TransportError`]; an HTTP
//! response of any status is a successful execution. The pipeline relies on that split when
//! it decides between an origin rebuild and an auth retry.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::CONTENT_TYPE;
// self
use crate::{_prelude::*, error::TransportError, session::AccessToken};

/// Boxed future returned by [`GatewayTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<WireResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing gateway requests.
///
/// The trait is the gateway's only dependency on an HTTP stack and stays object safe so the
/// service object can hold it as `Arc<dyn GatewayTransport>` while the dispatch pipeline
/// re-enters itself for replays and rebuilds.
pub trait GatewayTransport
where
	Self: Send + Sync,
{
	/// Executes one request, collecting the full response body.
	fn execute(&self, request: WireRequest) -> TransportFuture<'_>;
}

/// HTTP method subset used by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP PATCH.
	Patch,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Uppercase wire name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One outgoing request, fully assembled by the dispatch pipeline.
#[derive(Clone, Debug)]
pub struct WireRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Bearer credential to attach, when the target is not public.
	pub bearer: Option<AccessToken>,
	/// JSON-encoded request body.
	pub body: Option<Vec<u8>>,
}
impl WireRequest {
	/// Creates a bare request without credential or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, bearer: None, body: None }
	}

	/// Attaches a bearer credential.
	pub fn bearer(mut self, token: AccessToken) -> Self {
		self.bearer = Some(token);

		self
	}

	/// Attaches a JSON-encoded body.
	pub fn body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self
	}
}

/// One complete HTTP response: status plus collected body.
#[derive(Clone, Debug)]
pub struct WireResponse {
	/// HTTP status code.
	pub status: u16,
	/// Collected response body.
	pub body: Vec<u8>,
}
impl WireResponse {
	/// True for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// True for the two statuses the pipeline treats as an auth rejection.
	pub fn is_auth_rejection(&self) -> bool {
		matches!(self.status, 401 | 403)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Bodies are JSON; the transport sets an explicit UTF-8 content type so multi-byte
/// payloads survive intermediaries that assume another charset.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GatewayTransport for ReqwestTransport {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url);

			if let Some(bearer) = request.bearer.as_ref() {
				builder = builder.bearer_auth(bearer.expose());
			}
			if let Some(body) = request.body {
				builder =
					builder.header(CONTENT_TYPE, "application/json; charset=utf-8").body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(WireResponse { status, body })
		})
	}
}
