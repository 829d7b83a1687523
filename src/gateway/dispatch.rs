//! The interceptor pipeline behind every verb.
//!
//! Request phase classifies the path and attaches the bearer credential; response phase
//! owns the two recovery paths. An auth rejection funnels through the shared renewal gate
//! and replays once with the fresh credential; a connection-level failure rebinds the
//! dispatch target against a fresh origin resolution and retries once. The two retries
//! are independent and neither recurses.

// self
use super::{ApiRequest, ApiResponse, BoundTarget, Gateway};
use crate::{
	_prelude::*,
	error::{ConfigError, RenewalError},
	http::{Method, WireRequest},
	lifecycle::SharedRenewal,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

impl Gateway {
	/// Sends a GET request.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.request(ApiRequest::new(Method::Get, path)).await
	}

	/// Sends a DELETE request.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.request(ApiRequest::new(Method::Delete, path)).await
	}

	/// Sends a POST request carrying the payload as JSON.
	pub async fn post<T>(&self, path: &str, payload: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.request(ApiRequest::new(Method::Post, path).json(payload)?).await
	}

	/// Sends a PUT request carrying the payload as JSON.
	pub async fn put<T>(&self, path: &str, payload: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.request(ApiRequest::new(Method::Put, path).json(payload)?).await
	}

	/// Sends a PATCH request carrying the payload as JSON.
	pub async fn patch<T>(&self, path: &str, payload: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.request(ApiRequest::new(Method::Patch, path).json(payload)?).await
	}

	/// Dispatches a caller-assembled request through the pipeline.
	pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(request)).await;
		let outcome = if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure };

		span.settle(outcome);
		obs::record_op_outcome(KIND, outcome);

		result
	}

	async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		let mut target = self.ensure_target().await;
		let wire = self.assemble(&target, &request).await?;
		let response = match self.transport.execute(wire).await {
			Ok(response) => response,
			Err(_) => {
				// No HTTP response at all, so the bound origin is suspect. Rebind
				// against a fresh resolution and retry exactly once; a second
				// connection-level failure surfaces to the caller.
				obs::record_degraded(OpKind::Request, "origin_rebind");

				target = self.rebind_target().await;

				let wire = self.assemble(&target, &request).await?;

				self.transport.execute(wire).await.map_err(Error::from)?
			},
		};

		if !response.is_auth_rejection() {
			return Ok(response.into());
		}

		self.recover_auth(&target, &request).await
	}

	/// Runs the shared renewal and settles the rejected request from its outcome.
	async fn recover_auth(
		&self,
		target: &BoundTarget,
		request: &ApiRequest,
	) -> Result<ApiResponse> {
		match self.lifecycle.renew_shared().await {
			SharedRenewal::Performed(Ok(())) | SharedRenewal::Adopted(Ok(())) => {
				let replay = self.assemble(target, request).await?;
				let response = self.transport.execute(replay).await.map_err(Error::from)?;

				if response.is_auth_rejection() {
					// The credential is freshly renewed, so this rejection is
					// endpoint-level authorization rather than expiry.
					return Err(Error::AuthRejected { status: response.status });
				}

				Ok(response.into())
			},
			SharedRenewal::Performed(Err(RenewalError::NoSession)) => Err(Error::NoSession),
			SharedRenewal::Performed(Err(e)) => {
				self.force_logout().await;

				Err(e.into())
			},
			SharedRenewal::Adopted(Err(e)) => Err(e.into()),
		}
	}

	/// Builds the wire request: joins the path onto the bound base and attaches the
	/// bearer credential unless the path is public or no token is stored.
	async fn assemble(&self, target: &BoundTarget, request: &ApiRequest) -> Result<WireRequest> {
		let url = join_request_path(&target.base, &request.path)?;
		let mut wire = WireRequest::new(request.method, url);

		if let Some(body) = request.body.clone() {
			wire = wire.body(body);
		}
		if !self.surface.is_public(&request.path).await
			&& let Some(token) = self.session.access_token().await?
		{
			wire = wire.bearer(token);
		}

		Ok(wire)
	}

	/// Ends the session after an unrecoverable renewal failure.
	///
	/// The notification blocks until the host dismisses it; navigation follows as a
	/// deliberate, user-visible final action.
	async fn force_logout(&self) {
		self.lifecycle.cancel_renewal();

		if self.session.clear_session().await.is_err() {
			obs::record_degraded(OpKind::Request, "session_clear");
		}

		self.navigator.notify_session_expired(SESSION_EXPIRED_MESSAGE);
		self.navigator.navigate(&self.config.login_path);
	}
}

/// Joins a caller path onto the bound base URL.
///
/// Only rooted single-slash paths are accepted; scheme-relative or absolute inputs would
/// silently retarget the request at another authority.
fn join_request_path(base: &Url, path: &str) -> Result<Url, ConfigError> {
	if !path.starts_with('/') || path.starts_with("//") {
		return Err(ConfigError::InvalidRequestPath { path: path.into() });
	}

	base.join(path).map_err(|_| ConfigError::InvalidRequestPath { path: path.into() })
}
