//! Per-key sliding-window request limiter consulted before issuing authInfo strings.
//!
//! Each key keeps a log of the instants it was allowed through. A request is allowed when
//! fewer than `max_requests` entries fall inside the trailing window; denied requests are not
//! recorded. The limiter lives in process memory and is shared by reference, so counters are
//! per-process and reset on restart. Keys with no request left in the window are swept at most
//! once per window, so memory tracks the set of recently active keys.

// self
use crate::_prelude::*;

/// Result of [`RateLimiter::evaluate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately; it has been counted.
	Allow,
	/// The request should be delayed.
	Delay(RetryDirective),
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Suggested backoff duration.
	pub recommended_backoff: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}

/// Sliding-log limiter keyed by caller identity (typically the client address).
#[derive(Debug)]
pub struct RateLimiter {
	max_requests: usize,
	window: Duration,
	state: Mutex<LimiterState>,
}
impl RateLimiter {
	/// Default number of requests per window.
	pub const DEFAULT_MAX_REQUESTS: usize = 5;
	/// Default window length.
	pub const DEFAULT_WINDOW: Duration = Duration::seconds(60);

	/// Creates a limiter allowing `max_requests` per `window`.
	///
	/// `max_requests` is clamped to at least one and a non-positive window falls back to
	/// [`Self::DEFAULT_WINDOW`].
	pub fn new(max_requests: usize, window: Duration) -> Self {
		Self {
			max_requests: max_requests.max(1),
			window: if window.is_positive() { window } else { Self::DEFAULT_WINDOW },
			state: Default::default(),
		}
	}

	/// Configured request budget per window.
	pub fn max_requests(&self) -> usize {
		self.max_requests
	}

	/// Configured window length.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Checks and records a request for `key` at the current time.
	pub fn is_allowed(&self, key: &str) -> bool {
		self.is_allowed_at(key, OffsetDateTime::now_utc())
	}

	/// Checks and records a request for `key` observed at `now`.
	///
	/// An observation older than the newest recorded request for the key is denied.
	pub fn is_allowed_at(&self, key: &str, now: OffsetDateTime) -> bool {
		let cutoff = now.saturating_sub(self.window);
		let mut state = self.state.lock();

		state.sweep(now, cutoff, self.window);

		let log = state.logs.entry(key.to_owned()).or_default();

		if log.back().is_some_and(|newest| now < *newest) {
			return false;
		}

		prune(log, cutoff);

		if log.len() >= self.max_requests {
			return false;
		}

		log.push_back(now);

		true
	}

	/// Whole seconds until `key` may be allowed again, or `None` when it is under budget.
	pub fn get_remaining_time(&self, key: &str) -> Option<u64> {
		self.remaining_time_at(key, OffsetDateTime::now_utc())
	}

	/// Same as [`Self::get_remaining_time`] for an explicit observation time.
	///
	/// The result is truncated toward zero and never negative or larger than the window.
	pub fn remaining_time_at(&self, key: &str, now: OffsetDateTime) -> Option<u64> {
		let mut state = self.state.lock();
		let log = state.logs.get_mut(key)?;

		prune(log, now.saturating_sub(self.window));

		if log.is_empty() {
			state.logs.remove(key);

			return None;
		}
		if log.len() < self.max_requests {
			return None;
		}

		let oldest = *log.front()?;
		let remaining = self.window - (now - oldest);
		let secs = remaining.whole_seconds().clamp(0, self.window.whole_seconds());

		Some(secs.unsigned_abs())
	}

	/// Records a request for `key` and explains how long to wait when it is denied.
	pub fn evaluate(&self, key: &str) -> RateLimitDecision {
		self.evaluate_at(key, OffsetDateTime::now_utc())
	}

	/// Same as [`Self::evaluate`] for an explicit observation time.
	pub fn evaluate_at(&self, key: &str, now: OffsetDateTime) -> RateLimitDecision {
		if self.is_allowed_at(key, now) {
			return RateLimitDecision::Allow;
		}

		// A denial caused by clock regression has no countable entry to wait on.
		let backoff = self
			.remaining_time_at(key, now)
			.map(|secs| Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
			.unwrap_or(self.window);

		RateLimitDecision::Delay(
			RetryDirective::new(now.saturating_add(backoff), backoff).with_reason(format!(
				"At most {} requests per {} seconds.",
				self.max_requests,
				self.window.whole_seconds()
			)),
		)
	}

	/// Drops keys whose logs no longer hold any request inside the window.
	pub fn purge_idle(&self, now: OffsetDateTime) {
		self.state.lock().purge(now, now.saturating_sub(self.window));
	}

	/// Number of keys currently holding a request log.
	pub fn tracked_keys(&self) -> usize {
		self.state.lock().logs.len()
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_REQUESTS, Self::DEFAULT_WINDOW)
	}
}

#[derive(Debug, Default)]
struct LimiterState {
	logs: HashMap<String, VecDeque<OffsetDateTime>>,
	last_sweep: Option<OffsetDateTime>,
}
impl LimiterState {
	fn sweep(&mut self, now: OffsetDateTime, cutoff: OffsetDateTime, window: Duration) {
		if self.last_sweep.is_some_and(|last| now - last < window) {
			return;
		}

		self.purge(now, cutoff);
	}

	fn purge(&mut self, now: OffsetDateTime, cutoff: OffsetDateTime) {
		self.logs.retain(|_, log| {
			prune(log, cutoff);

			!log.is_empty()
		});
		self.last_sweep = Some(now);
	}
}

fn prune(log: &mut VecDeque<OffsetDateTime>, cutoff: OffsetDateTime) {
	while log.front().is_some_and(|t| *t <= cutoff) {
		log.pop_front();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn at(secs: i64) -> OffsetDateTime {
		OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_700_000_000 + secs)
	}

	#[test]
	fn budget_is_per_key() {
		let limiter = RateLimiter::default();

		for i in 0..5 {
			assert!(limiter.is_allowed_at("10.0.0.1", at(i)));
		}

		assert!(!limiter.is_allowed_at("10.0.0.1", at(5)));
		assert!(limiter.is_allowed_at("10.0.0.2", at(5)));
	}

	#[test]
	fn entries_leave_the_window() {
		let limiter = RateLimiter::new(2, Duration::seconds(10));

		assert!(limiter.is_allowed_at("k", at(0)));
		assert!(limiter.is_allowed_at("k", at(1)));
		assert!(!limiter.is_allowed_at("k", at(9)));
		// The entry at t=0 expires exactly at t=10.
		assert!(limiter.is_allowed_at("k", at(10)));
		assert!(!limiter.is_allowed_at("k", at(10)));
	}

	#[test]
	fn remaining_time_counts_down_from_the_oldest_entry() {
		let limiter = RateLimiter::new(2, Duration::seconds(60));

		assert_eq!(limiter.remaining_time_at("k", at(0)), None);
		assert!(limiter.is_allowed_at("k", at(0)));
		assert_eq!(limiter.remaining_time_at("k", at(1)), None);
		assert!(limiter.is_allowed_at("k", at(20)));
		assert_eq!(limiter.remaining_time_at("k", at(20)), Some(40));
		assert_eq!(
			limiter.remaining_time_at("k", at(20) + Duration::milliseconds(500)),
			Some(39),
			"Partial seconds truncate toward zero."
		);
		assert_eq!(limiter.remaining_time_at("k", at(61)), None);
	}

	#[test]
	fn denied_requests_are_not_recorded() {
		let limiter = RateLimiter::new(1, Duration::seconds(10));

		assert!(limiter.is_allowed_at("k", at(0)));

		for i in 1..10 {
			assert!(!limiter.is_allowed_at("k", at(i)));
		}

		assert!(limiter.is_allowed_at("k", at(10)));
	}

	#[test]
	fn clock_regression_is_denied() {
		let limiter = RateLimiter::default();

		assert!(limiter.is_allowed_at("k", at(30)));
		assert!(!limiter.is_allowed_at("k", at(29)));

		let RateLimitDecision::Delay(directive) = limiter.evaluate_at("k", at(29)) else {
			panic!("Regressed clock should delay.");
		};

		assert_eq!(directive.recommended_backoff, Duration::seconds(60));
	}

	#[test]
	fn evaluate_reports_backoff() {
		let limiter = RateLimiter::new(1, Duration::seconds(60));

		assert_eq!(limiter.evaluate_at("k", at(0)), RateLimitDecision::Allow);

		let RateLimitDecision::Delay(directive) = limiter.evaluate_at("k", at(15)) else {
			panic!("Second request should be delayed.");
		};

		assert_eq!(directive.recommended_backoff, Duration::seconds(45));
		assert_eq!(directive.earliest_retry_at, at(60));
		assert!(directive.reason.is_some());
	}

	#[test]
	fn idle_keys_are_purged() {
		let limiter = RateLimiter::new(1, Duration::seconds(10));

		assert!(limiter.is_allowed_at("a", at(0)));
		assert!(limiter.is_allowed_at("b", at(5)));

		limiter.purge_idle(at(12));

		assert_eq!(limiter.tracked_keys(), 1);
		assert_eq!(limiter.remaining_time_at("b", at(12)), Some(3));
	}

	#[test]
	fn idle_keys_are_swept_by_later_traffic() {
		let limiter = RateLimiter::default();

		for i in 0..10_000 {
			assert!(limiter.is_allowed_at(&format!("10.0.{}.{}", i / 256, i % 256), at(0)));
		}

		assert_eq!(limiter.tracked_keys(), 10_000);
		assert!(limiter.is_allowed_at("10.9.9.9", at(86_400)));
		assert_eq!(limiter.tracked_keys(), 1);
	}

	#[test]
	fn lookups_drop_expired_keys() {
		let limiter = RateLimiter::new(1, Duration::seconds(10));

		assert!(limiter.is_allowed_at("k", at(0)));
		assert_eq!(limiter.remaining_time_at("k", at(11)), None);
		assert_eq!(limiter.tracked_keys(), 0);
		assert_eq!(limiter.remaining_time_at("unknown", at(11)), None);
		assert_eq!(limiter.tracked_keys(), 0);
	}

	#[test]
	fn degenerate_configuration_is_clamped() {
		let limiter = RateLimiter::new(0, Duration::ZERO);

		assert_eq!(limiter.max_requests(), 1);
		assert_eq!(limiter.window(), RateLimiter::DEFAULT_WINDOW);
	}
}
