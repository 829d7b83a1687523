// self
use crate::obs::{OpKind, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"portal_gateway_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a silently degraded step: the named stage failed and the gateway fell back to
/// the next strategy instead of surfacing an error.
pub fn record_degraded(kind: OpKind, stage: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"portal_gateway_degraded_total",
			"op" => kind.as_str(),
			"stage" => stage
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, stage);
	}
}
