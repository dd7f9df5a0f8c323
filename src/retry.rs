//! Bounded retry for flaky remote operations.
//!
//! [`ResilientExecutor`] drives a deferred operation until it succeeds, raises a
//! permanent fault, or spends the configured attempt budget. Delays between attempts
//! grow monotonically and never exceed the policy cap, and a terminal failure is never
//! masked, only delayed.

// self
use crate::_prelude::*;

/// Future type returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Classification verdict for one operation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
	/// Retry-survivable failure such as throttling or a connectivity blip.
	Transient,
	/// Failure that retrying cannot resolve.
	Permanent,
}

/// Classifies operation failures into [`FaultKind`] verdicts.
///
/// Any `Fn(&E) -> FaultKind` closure qualifies, so call sites rarely implement the
/// trait by hand.
pub trait FaultClassifier<E>
where
	Self: Send + Sync,
{
	/// Returns the verdict for one failure.
	fn classify(&self, error: &E) -> FaultKind;
}
impl<E, F> FaultClassifier<E> for F
where
	F: Fn(&E) -> FaultKind + Send + Sync,
{
	fn classify(&self, error: &E) -> FaultKind {
		self(error)
	}
}

/// Retry budget and delay curve applied by [`ResilientExecutor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts allowed, first try included.
	pub max_attempts: u32,
	/// Delay before the second attempt.
	pub initial_delay: Duration,
	/// Upper bound every delay is clamped to.
	pub max_delay: Duration,
}
impl RetryPolicy {
	/// Creates a policy, clamping the attempt budget to at least one try.
	pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
		Self { max_attempts: max_attempts.max(1), initial_delay, max_delay }
	}

	/// Delay applied before the given attempt number (1-based; the first try never waits).
	///
	/// The delay doubles for each further attempt and is clamped to [`Self::max_delay`].
	pub fn delay_before(&self, attempt: u32) -> Duration {
		if attempt <= 1 {
			return Duration::ZERO;
		}

		let doublings = (attempt - 2).min(16);
		let factor = 1_i32 << doublings;

		self.initial_delay.checked_mul(factor).unwrap_or(self.max_delay).min(self.max_delay)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(3, Duration::seconds(5), Duration::seconds(20))
	}
}

/// Clock abstraction letting tests observe delays without waiting them out.
pub trait Sleeper
where
	Self: Send + Sync,
{
	/// Sleeps for the requested delay.
	fn sleep(&self, delay: Duration) -> SleepFuture<'_>;
}

/// [`Sleeper`] running on the Tokio clock.
#[cfg(feature = "tokio")]
#[derive(Clone, Debug, Default)]
pub struct TokioSleeper;
#[cfg(feature = "tokio")]
impl Sleeper for TokioSleeper {
	fn sleep(&self, delay: Duration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(delay.unsigned_abs()))
	}
}

/// Generic retry wrapper applying one [`RetryPolicy`] to heterogeneous operations.
#[derive(Clone, Debug)]
pub struct ResilientExecutor<S> {
	policy: RetryPolicy,
	sleeper: S,
}
#[cfg(feature = "tokio")]
impl ResilientExecutor<TokioSleeper> {
	/// Creates an executor running on the Tokio clock.
	pub fn new(policy: RetryPolicy) -> Self {
		Self::with_sleeper(policy, TokioSleeper)
	}
}
impl<S> ResilientExecutor<S>
where
	S: Sleeper,
{
	/// Creates an executor with a custom sleeper.
	pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
		Self { policy, sleeper }
	}

	/// Policy currently in force.
	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// Runs `operation` until success, a permanent fault, or attempt exhaustion.
	///
	/// Permanent faults propagate on first occurrence without delay. Once the budget is
	/// spent, the last failure propagates unchanged.
	pub async fn run<T, E, C, Op, Fut>(&self, classifier: &C, mut operation: Op) -> Result<T, E>
	where
		C: ?Sized + FaultClassifier<E>,
		Op: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		let max_attempts = self.policy.max_attempts.max(1);
		let mut attempt = 1;

		loop {
			let error = match operation().await {
				Ok(value) => return Ok(value),
				Err(error) => error,
			};

			if matches!(classifier.classify(&error), FaultKind::Permanent) || attempt >= max_attempts
			{
				return Err(error);
			}

			let delay = self.policy.delay_before(attempt + 1);

			tracing::debug!(
				attempt,
				max_attempts,
				delay_secs = delay.whole_seconds(),
				"Transient fault; retrying after delay.",
			);

			self.sleeper.sleep(delay).await;

			attempt += 1;
		}
	}
}
