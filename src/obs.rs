//! Optional observability helpers for gateway operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `portal_gateway.op` with the `op`
//!   (operation) and `stage` (call site) fields, plus an `outcome` field recorded once the
//!   operation settles.
//! - Enable `metrics` to increment the `portal_gateway_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and the
//!   `portal_gateway_degraded_total` counter whenever a resolution or discovery step fails
//!   silently and the gateway falls back to the next strategy.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Gateway operation kinds observed by the instrumentation hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Dispatch of a caller request through the interceptor pipeline.
	Request,
	/// Session token renewal.
	Renewal,
	/// Backend origin resolution.
	OriginResolution,
	/// Public-surface discovery.
	SurfaceDiscovery,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Request => "request",
			OpKind::Renewal => "renewal",
			OpKind::OriginResolution => "origin_resolution",
			OpKind::SurfaceDiscovery => "surface_discovery",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a gateway operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
