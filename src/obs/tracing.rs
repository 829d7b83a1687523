// self
use crate::{
	_prelude::*,
	obs::{OpKind, OpOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span covering one gateway operation from attempt to settled outcome.
///
/// The span carries `op` and `stage` from creation; the `outcome` field stays empty until
/// the caller settles it via [`OpSpan::settle`].
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"portal_gateway.op",
				op = kind.as_str(),
				stage,
				outcome = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Records the settled outcome onto the span.
	pub fn settle(&self, outcome: OpOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn settle_is_a_noop_without_tracing() {
		// Compile-time smoke test; the span must exist even when tracing is disabled.
		OpSpan::new(OpKind::Renewal, "test").settle(OpOutcome::Success);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::Request, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		span.settle(OpOutcome::Success);

		assert_eq!(value, 42);
	}
}
