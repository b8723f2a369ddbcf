//! Optional observability helpers for submissions and admission control.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `registry_client.submission` with a
//!   `stage` field, plus `debug` events whenever a caller waits for (or abandons) a slot.
//! - Enable `metrics` to increment `registry_client_submission_total` (labeled by `outcome`)
//!   for every submission attempt/success/failure, and `registry_client_admission_total`
//!   (labeled by `outcome`) for every limiter decision.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmissionOutcome {
	/// Entry to [`DocumentClient::submit_document`](crate::client::DocumentClient::submit_document).
	Attempt,
	/// The transport returned a response (any status).
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl SubmissionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SubmissionOutcome::Attempt => "attempt",
			SubmissionOutcome::Success => "success",
			SubmissionOutcome::Failure => "failure",
		}
	}
}
impl Display for SubmissionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each limiter decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdmissionOutcome {
	/// A slot was granted without waiting.
	Immediate,
	/// A slot was granted after waiting.
	Delayed,
	/// The caller gave up (or was released by shutdown) before a slot was granted.
	Cancelled,
}
impl AdmissionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AdmissionOutcome::Immediate => "immediate",
			AdmissionOutcome::Delayed => "delayed",
			AdmissionOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for AdmissionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
