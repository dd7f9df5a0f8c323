// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for acquisition chain outcomes.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	silent: AtomicU64,
	password: AtomicU64,
	interactive: AtomicU64,
	failure: AtomicU64,
}
impl BrokerMetrics {
	/// Returns the number of tokens produced by the silent stage.
	pub fn silent_tokens(&self) -> u64 {
		self.silent.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens produced by the password stage.
	pub fn password_tokens(&self) -> u64 {
		self.password.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens produced by the interactive stage.
	pub fn interactive_tokens(&self) -> u64 {
		self.interactive.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions that ended in a terminal failure.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_silent(&self) {
		self.silent.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_password(&self) {
		self.password.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_interactive(&self) {
		self.interactive.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
