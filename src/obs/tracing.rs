// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedSubmission<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedSubmission<F> = F;

/// A span builder used around document submissions.
#[derive(Clone, Debug)]
pub struct SubmissionSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl SubmissionSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("registry_client.submission", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedSubmission<Fut>
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
}

/// Emits a debug event when a caller has to wait for the bucket to refill.
pub fn trace_throttled(retry_in: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(retry_in_ms = retry_in.as_millis() as u64, "Waiting for a submission slot.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = retry_in;
	}
}

/// Emits a debug event when a waiter leaves the queue without a slot.
pub fn trace_cancelled() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("Submission slot wait was cancelled.");
	}
}
