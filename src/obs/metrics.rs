// self
use crate::obs::{AdmissionOutcome, SubmissionOutcome};

/// Records a submission outcome via the global metrics recorder (when enabled).
pub fn record_submission_outcome(outcome: SubmissionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("registry_client_submission_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a limiter decision via the global metrics recorder (when enabled).
pub fn record_admission(outcome: AdmissionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("registry_client_admission_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
