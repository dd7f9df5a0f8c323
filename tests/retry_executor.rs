// std
use std::sync::atomic::{AtomicU32, Ordering};
// crates.io
use time::Duration;
// self
use identity_broker::retry::{FaultKind, ResilientExecutor, RetryPolicy, TokioSleeper};

#[derive(Clone, Debug, PartialEq, Eq)]
struct FlakyFault {
	attempt: u32,
	permanent: bool,
}

fn classify(fault: &FlakyFault) -> FaultKind {
	if fault.permanent { FaultKind::Permanent } else { FaultKind::Transient }
}

fn fast_executor(max_attempts: u32) -> ResilientExecutor<TokioSleeper> {
	ResilientExecutor::new(RetryPolicy::new(
		max_attempts,
		Duration::milliseconds(2),
		Duration::milliseconds(8),
	))
}

#[tokio::test]
async fn transient_faults_are_retried_to_success() {
	let executor = fast_executor(5);
	let attempts = AtomicU32::new(0);
	let value = executor
		.run(&classify, || async {
			let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

			if attempt < 3 { Err(FlakyFault { attempt, permanent: false }) } else { Ok("recovered") }
		})
		.await
		.expect("Transient faults within the budget should be retried to success.");

	assert_eq!(value, "recovered");
	assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn permanent_faults_fail_on_the_first_attempt() {
	let executor = fast_executor(5);
	let attempts = AtomicU32::new(0);
	let err = executor
		.run(&classify, || async {
			let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

			Err::<(), _>(FlakyFault { attempt, permanent: true })
		})
		.await
		.expect_err("Permanent faults should never be retried.");

	assert_eq!(err, FlakyFault { attempt: 1, permanent: true });
	assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_budget_surfaces_the_last_fault() {
	let executor = fast_executor(3);
	let attempts = AtomicU32::new(0);
	let err = executor
		.run(&classify, || async {
			let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

			Err::<(), _>(FlakyFault { attempt, permanent: false })
		})
		.await
		.expect_err("An exhausted budget should surface the final fault.");

	assert_eq!(err, FlakyFault { attempt: 3, permanent: false });
	assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn attempt_budget_is_clamped_to_one_try() {
	let executor = fast_executor(0);

	assert_eq!(executor.policy().max_attempts, 1);

	let attempts = AtomicU32::new(0);
	let err = executor
		.run(&classify, || async {
			let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

			Err::<(), _>(FlakyFault { attempt, permanent: false })
		})
		.await
		.expect_err("A single-attempt budget should fail after one try.");

	assert_eq!(err.attempt, 1);
	assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
