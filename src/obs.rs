//! Observability helpers for the acquisition chain.
//!
//! # Feature Flags
//!
//! - Structured spans named `identity_broker.acquire` with the `resource` field are always
//!   emitted, as are per-stage events.
//! - Enable `metrics` to increment the `identity_broker_stage_total` counter for every stage
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Acquisition chain stages observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
	/// Construction of the shared identity client.
	ClientInit,
	/// Silent acquisition against a cached account.
	Silent,
	/// Username plus password grant.
	Password,
	/// Interactive device login.
	Interactive,
}
impl StageKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageKind::ClientInit => "client_init",
			StageKind::Silent => "silent",
			StageKind::Password => "password",
			StageKind::Interactive => "interactive",
		}
	}
}
impl Display for StageKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry into a stage.
	Attempt,
	/// Stage produced a token.
	Success,
	/// Terminal failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
