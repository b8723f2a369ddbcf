// std
use std::{sync::Arc, time::Duration};
// crates.io
use tokio::{task::JoinSet, time::Instant};
// self
use registry_client::{
	config::RateBudget,
	error::Error,
	limiter::{LimiterMetrics, RateLimiter},
};

fn limiter(window: Duration, max_requests: u32) -> Arc<RateLimiter> {
	let budget =
		RateBudget::new(window, max_requests).expect("Limiter budget fixture should be valid.");

	Arc::new(RateLimiter::new(budget))
}

async fn grant_times(limiter: &Arc<RateLimiter>, callers: usize) -> Vec<Instant> {
	let mut tasks = JoinSet::new();

	for _ in 0..callers {
		let limiter = Arc::clone(limiter);

		tasks.spawn(async move {
			limiter.acquire().await.expect("Open limiter should grant every caller.");

			Instant::now()
		});
	}

	let mut grants = Vec::with_capacity(callers);

	while let Some(joined) = tasks.join_next().await {
		grants.push(joined.expect("Acquire task should not panic."));
	}

	grants.sort();

	grants
}

// `slack` absorbs the gap between a grant and the moment its task records it.
fn assert_within_budget(
	grants: &[Instant],
	window: Duration,
	max_requests: usize,
	slack: Duration,
) {
	for run in grants.windows(max_requests + 1) {
		let span = run[max_requests] - run[0];

		assert!(
			span + slack >= window,
			"{} grants landed within {span:?}, which is shorter than the {window:?} window.",
			max_requests + 1,
		);
	}
}

#[tokio::test(start_paused = true)]
async fn fresh_limiter_bursts_then_blocks_for_a_full_window() {
	let window = Duration::from_secs(10);
	let limiter = limiter(window, 3);
	let start = Instant::now();

	for _ in 0..3 {
		limiter.acquire().await.expect("Burst acquisitions should succeed.");
	}

	assert_eq!(start.elapsed(), Duration::ZERO, "The initial burst must not wait.");
	assert_eq!(limiter.available(), 0);

	limiter.acquire().await.expect("The next acquisition should succeed after a window.");

	let waited = start.elapsed();

	assert!(waited >= window, "Fourth grant arrived after only {waited:?}.");
	assert!(waited < window + Duration::from_millis(10), "Fourth grant overslept: {waited:?}.");
	assert_eq!(limiter.metrics().granted(), 4);
	assert_eq!(limiter.metrics().delayed(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_never_exceed_the_budget() {
	let window = Duration::from_secs(10);
	let limiter = limiter(window, 3);
	let start = Instant::now();
	let grants = grant_times(&limiter, 10).await;

	assert_eq!(grants.len(), 10);
	assert_within_budget(&grants, window, 3, Duration::ZERO);
	assert_eq!(grants.iter().filter(|at| **at == start).count(), 3);

	let last = *grants.last().expect("Grants should not be empty.") - start;

	assert!(last >= window * 3, "Ten callers at three per window need three refills.");
	assert!(last < window * 3 + Duration::from_millis(50), "Callers waited too long: {last:?}.");
}

#[tokio::test(start_paused = true)]
async fn tokens_return_one_window_after_their_own_grant() {
	let window = Duration::from_secs(10);
	let limiter = limiter(window, 2);
	let start = Instant::now();

	limiter.acquire().await.expect("First acquisition should succeed.");
	tokio::time::sleep(Duration::from_secs(6)).await;
	limiter.acquire().await.expect("Second acquisition should succeed.");

	// The bucket is empty; the first token comes back at t=10s, the second at t=16s.
	limiter.acquire().await.expect("Third acquisition should succeed.");

	let third = start.elapsed();

	limiter.acquire().await.expect("Fourth acquisition should succeed.");

	let fourth = start.elapsed();

	assert!(third >= window && third < window + Duration::from_millis(10));
	assert!(fourth >= Duration::from_secs(16) && fourth < Duration::from_millis(16_010));
}

#[tokio::test(start_paused = true)]
async fn every_waiter_is_eventually_served() {
	let window = Duration::from_secs(1);
	let limiter = limiter(window, 2);
	let grants = tokio::time::timeout(window * 5, grant_times(&limiter, 9))
		.await
		.expect("Nine callers at two per window should finish within five windows.");

	assert_eq!(grants.len(), 9);
	assert_within_budget(&grants, window, 2, Duration::ZERO);
	let metrics: &LimiterMetrics = limiter.metrics();

	assert_eq!(metrics.granted(), 9);
	assert_eq!(metrics.cancelled(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_waiter_leaves_capacity_untouched() {
	let window = Duration::from_secs(10);
	let limiter = limiter(window, 1);

	limiter.acquire().await.expect("First acquisition should succeed.");

	let abandoned = tokio::time::timeout(Duration::from_secs(1), limiter.acquire()).await;

	assert!(abandoned.is_err(), "The waiter should still be blocked when dropped.");
	assert_eq!(limiter.metrics().cancelled(), 1);

	tokio::time::sleep(Duration::from_secs(9)).await;

	assert_eq!(limiter.available(), 1, "A dropped waiter must not consume the refilled token.");
}

#[tokio::test(start_paused = true)]
async fn cancelled_waiter_does_not_take_another_callers_slot() {
	let window = Duration::from_secs(10);
	let limiter = limiter(window, 1);
	let start = Instant::now();

	limiter.acquire().await.expect("First acquisition should succeed.");

	let patient = {
		let limiter = Arc::clone(&limiter);

		tokio::spawn(async move {
			limiter.acquire().await.expect("Patient waiter should be granted.");

			Instant::now()
		})
	};
	let impatient = {
		let limiter = Arc::clone(&limiter);

		tokio::spawn(async move {
			limiter.acquire_until(tokio::time::sleep(Duration::from_secs(5))).await
		})
	};
	let impatient = impatient.await.expect("Impatient task should not panic.");

	assert!(matches!(impatient, Err(Error::Cancelled)));
	let gave_up = start.elapsed();

	assert!(gave_up >= Duration::from_secs(5) && gave_up < Duration::from_millis(5_010));

	let granted_at = patient.await.expect("Patient task should not panic.") - start;

	assert!(granted_at >= window && granted_at < window + Duration::from_millis(10));
	assert_eq!(limiter.available(), 0);
	assert_eq!(limiter.metrics().granted(), 2);
	assert_eq!(limiter.metrics().cancelled(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_releases_every_waiter() {
	let limiter = limiter(Duration::from_secs(60), 1);
	let mut waiters = JoinSet::new();

	limiter.acquire().await.expect("First acquisition should succeed.");

	for _ in 0..3 {
		let limiter = Arc::clone(&limiter);

		waiters.spawn(async move { limiter.acquire().await });
	}

	tokio::time::sleep(Duration::from_secs(1)).await;
	limiter.close();

	while let Some(joined) = waiters.join_next().await {
		let outcome = joined.expect("Waiter task should not panic.");

		assert!(matches!(outcome, Err(Error::Cancelled)));
	}

	assert!(limiter.is_closed());
	assert_eq!(limiter.metrics().granted(), 1);
	assert_eq!(limiter.metrics().cancelled(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn budget_holds_across_worker_threads() {
	let window = Duration::from_millis(300);
	let limiter = limiter(window, 3);
	let start = Instant::now();
	let grants = grant_times(&limiter, 9).await;
	let elapsed = start.elapsed();

	assert_eq!(grants.len(), 9);
	assert_within_budget(&grants, window, 3, Duration::from_millis(100));
	assert!(elapsed >= window * 2, "Nine callers at three per window finished in {elapsed:?}.");
	assert_eq!(limiter.metrics().granted(), 9);
}
