// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for limiter admissions.
#[derive(Debug, Default)]
pub struct LimiterMetrics {
	granted: AtomicU64,
	delayed: AtomicU64,
	cancelled: AtomicU64,
}
impl LimiterMetrics {
	/// Returns the total number of granted slots (immediate and delayed).
	pub fn granted(&self) -> u64 {
		self.granted.load(Ordering::Relaxed)
	}

	/// Returns the number of grants that had to wait for capacity or for earlier waiters.
	pub fn delayed(&self) -> u64 {
		self.delayed.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions that ended in cancellation.
	pub fn cancelled(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	pub(crate) fn record_grant(&self, delayed: bool) {
		self.granted.fetch_add(1, Ordering::Relaxed);

		if delayed {
			self.delayed.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_cancelled(&self) {
		self.cancelled.fetch_add(1, Ordering::Relaxed);
	}
}
