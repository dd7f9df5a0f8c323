// crates.io
use tracing::instrument::Instrumented;
// self
use crate::_prelude::*;

/// A span builder covering one acquisition chain run.
#[derive(Clone, Debug)]
pub struct AcquireSpan {
	span: tracing::Span,
}
impl AcquireSpan {
	/// Creates a new span tagged with the normalized resource.
	pub fn new(resource: &str) -> Self {
		let span = tracing::info_span!("identity_broker.acquire", resource);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		// crates.io
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
