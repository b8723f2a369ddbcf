//! Token-bucket admission control for outbound registry calls.
//!
//! [`RateLimiter`] admits at most [`RateBudget::max_requests`] calls in any rolling
//! [`RateBudget::window`]. The bucket starts full, so a fresh limiter lets a whole burst
//! through without waiting. Each spent token returns to the bucket exactly one window after
//! it was granted, which keeps the rolling-window bound intact even across window
//! boundaries.
//!
//! Waiting callers queue on an async gate, so at most one caller at a time sleeps on the
//! bucket and everyone behind it is served in turn once tokens come back. A waiter that is
//! cancelled (by dropping its future, through [`RateLimiter::acquire_until`], or by
//! [`RateLimiter::close`]) leaves the queue without touching the bucket.

mod metrics;

pub use metrics::*;

// std
use std::collections::VecDeque;
// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	config::RateBudget,
	obs::{self, AdmissionOutcome},
};

/// Result of a non-blocking [`RateLimiter::try_acquire`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
	/// A slot was granted; the caller may submit immediately.
	Granted,
	/// No slot is available right now.
	Delay(RetryDirective),
}

/// Advises callers when to retry after an [`AdmissionDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Time until the next token returns to the bucket.
	pub retry_in: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided delay.
	pub fn new(retry_in: Duration) -> Self {
		Self { retry_in, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}

/// Admission-control primitive enforcing a [`RateBudget`] across concurrent callers.
pub struct RateLimiter {
	budget: RateBudget,
	state: Mutex<BucketState>,
	gate: AsyncMutex<()>,
	closed: watch::Sender<bool>,
	metrics: LimiterMetrics,
}
impl RateLimiter {
	/// Creates a limiter whose bucket starts full.
	pub fn new(budget: RateBudget) -> Self {
		let (closed, _) = watch::channel(false);

		Self {
			budget,
			state: Mutex::new(BucketState::with_capacity(budget.capacity())),
			gate: AsyncMutex::new(()),
			closed,
			metrics: LimiterMetrics::default(),
		}
	}

	/// Returns the budget enforced by the limiter.
	pub fn budget(&self) -> RateBudget {
		self.budget
	}

	/// Returns the admission counters.
	pub fn metrics(&self) -> &LimiterMetrics {
		&self.metrics
	}

	/// Returns how many slots could be granted right now without waiting.
	pub fn available(&self) -> usize {
		self.state.lock().available(&self.budget, Instant::now())
	}

	/// Returns `true` once [`close`](Self::close) has been called.
	pub fn is_closed(&self) -> bool {
		*self.closed.borrow()
	}

	/// Closes the limiter: every current and future waiter fails with [`Error::Cancelled`].
	pub fn close(&self) {
		self.state.lock().closed = true;
		self.closed.send_replace(true);
	}

	/// Waits until a slot is granted.
	///
	/// Returns immediately while capacity remains. Dropping the returned future before it
	/// completes abandons the wait without consuming a slot.
	pub async fn acquire(&self) -> Result<()> {
		self.acquire_until(std::future::pending::<()>()).await
	}

	/// Waits until a slot is granted or `cancel` resolves, whichever happens first.
	///
	/// A slot is never granted to a caller that observes cancellation: the grant happens
	/// inside a single critical section, after which the call returns `Ok` without yielding.
	pub async fn acquire_until<F>(&self, cancel: F) -> Result<()>
	where
		F: Future<Output = ()>,
	{
		let mut ticket = Ticket::new(&self.metrics);
		let mut closed = self.closed.subscribe();
		let shutdown = async {
			let _ = closed.wait_for(|closed| *closed).await;
		};
		let admitted = async {
			// Queueing behind a caller that is only taking a free token is not a delay.
			let (_turn, mut delayed) = match self.gate.try_lock() {
				Some(turn) => (turn, false),
				None => {
					let starved =
						!self.state.lock().retry_in(&self.budget, Instant::now()).is_zero();

					(self.gate.lock().await, starved)
				},
			};

			loop {
				let admission = self.state.lock().admit(&self.budget, Instant::now());

				match admission {
					Admission::Ready => return Ok(delayed),
					Admission::Waiting { retry_in } => {
						obs::trace_throttled(retry_in);

						delayed = true;

						tokio::time::sleep(retry_in).await;
					},
					Admission::Closed => return Err(Error::Cancelled),
				}
			}
		};
		let result = tokio::select! {
			biased;
			_ = shutdown => Err(Error::Cancelled),
			_ = cancel => Err(Error::Cancelled),
			result = admitted => result,
		};

		match result {
			Ok(delayed) => {
				ticket.granted(delayed);

				Ok(())
			},
			Err(e) => Err(e),
		}
	}

	/// Attempts to take a slot without waiting.
	///
	/// Callers already queued in [`acquire`](Self::acquire) keep their turn: while anyone is
	/// waiting, this returns [`AdmissionDecision::Delay`] even if a token is about to return.
	pub fn try_acquire(&self) -> Result<AdmissionDecision> {
		let now = Instant::now();
		let Some(_turn) = self.gate.try_lock() else {
			let mut state = self.state.lock();

			if state.closed {
				return Err(Error::Cancelled);
			}

			let retry_in = state.retry_in(&self.budget, now);
			let reason = if retry_in.is_zero() {
				"Another caller is taking a slot; retry immediately."
			} else {
				"Earlier callers are waiting for a slot."
			};
			let directive = RetryDirective::new(retry_in).with_reason(reason);

			return Ok(AdmissionDecision::Delay(directive));
		};
		let admission = self.state.lock().admit(&self.budget, now);

		match admission {
			Admission::Ready => {
				self.metrics.record_grant(false);
				obs::record_admission(AdmissionOutcome::Immediate);

				Ok(AdmissionDecision::Granted)
			},
			Admission::Waiting { retry_in } =>
				Ok(AdmissionDecision::Delay(RetryDirective::new(retry_in))),
			Admission::Closed => Err(Error::Cancelled),
		}
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter")
			.field("budget", &self.budget)
			.field("closed", &self.is_closed())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Outcome of a single admission attempt against the bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Admission {
	/// A token was deducted.
	Ready,
	/// The bucket is empty; the oldest token returns after `retry_in`.
	Waiting { retry_in: Duration },
	/// The limiter no longer grants tokens.
	Closed,
}

/// Grant instants of the tokens currently spent, oldest first.
#[derive(Debug)]
struct BucketState {
	spent: VecDeque<Instant>,
	closed: bool,
}
impl BucketState {
	fn with_capacity(capacity: usize) -> Self {
		Self { spent: VecDeque::with_capacity(capacity.min(1024)), closed: false }
	}

	/// Returns tokens granted at least one full window ago to the bucket.
	fn reclaim(&mut self, budget: &RateBudget, now: Instant) {
		while let Some(granted_at) = self.spent.front() {
			if now.saturating_duration_since(*granted_at) < budget.window() {
				break;
			}

			self.spent.pop_front();
		}
	}

	fn admit(&mut self, budget: &RateBudget, now: Instant) -> Admission {
		if self.closed {
			return Admission::Closed;
		}

		self.reclaim(budget, now);

		if self.spent.len() < budget.capacity() {
			self.spent.push_back(now);

			Admission::Ready
		} else {
			Admission::Waiting { retry_in: self.retry_in(budget, now) }
		}
	}

	fn available(&mut self, budget: &RateBudget, now: Instant) -> usize {
		self.reclaim(budget, now);

		budget.capacity().saturating_sub(self.spent.len())
	}

	/// Time until the next token can be granted; zero while capacity remains.
	fn retry_in(&mut self, budget: &RateBudget, now: Instant) -> Duration {
		self.reclaim(budget, now);

		if self.spent.len() < budget.capacity() {
			return Duration::ZERO;
		}

		match self.spent.front() {
			Some(oldest) => budget.window().saturating_sub(now.saturating_duration_since(*oldest)),
			None => Duration::ZERO,
		}
	}
}

/// Tracks one `acquire` call so abandoned waits are counted even when the future is dropped.
struct Ticket<'a> {
	metrics: &'a LimiterMetrics,
	settled: bool,
}
impl<'a> Ticket<'a> {
	fn new(metrics: &'a LimiterMetrics) -> Self {
		Self { metrics, settled: false }
	}

	fn granted(&mut self, delayed: bool) {
		self.settled = true;
		self.metrics.record_grant(delayed);

		obs::record_admission(if delayed {
			AdmissionOutcome::Delayed
		} else {
			AdmissionOutcome::Immediate
		});
	}
}
impl Drop for Ticket<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.metrics.record_cancelled();
			obs::trace_cancelled();
			obs::record_admission(AdmissionOutcome::Cancelled);
		}
	}
}
