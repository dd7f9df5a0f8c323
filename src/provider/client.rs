//! Identity client contracts consumed by the token acquisition chain.
//!
//! Implementations decorate one provider integration (HTTP, scripted doubles, etc.)
//! behind object-safe hooks so the broker never depends on a concrete OAuth stack.

// self
use crate::{
	_prelude::*,
	auth::{ResourceUri, Secret},
	config::BrokerConfig,
	store::{AccountRecord, AccountStore, StoreError},
};

/// Future type returned by identity client operations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Identity provider client driving the silent, password, and interactive grants.
///
/// Implementations are expected to persist refresh material into their attached
/// [`AccountStore`] after successful grants so later silent acquisitions can reuse it.
pub trait IdentityClient
where
	Self: Send + Sync,
{
	/// Looks up the cached account whose principal matches case-insensitively.
	fn cached_account<'a>(&'a self, principal: &'a str) -> ClientFuture<'a, Option<AccountRecord>>;

	/// Attempts a silent grant against a cached account.
	///
	/// A provider demand for a human-present sign-in is reported through
	/// [`SilentOutcome::InteractionRequired`], never through the error channel.
	fn acquire_silent<'a>(
		&'a self,
		account: &'a AccountRecord,
		resource: &'a ResourceUri,
	) -> ClientFuture<'a, SilentOutcome>;

	/// Exchanges a username and password pair for a token.
	fn acquire_with_password<'a>(
		&'a self,
		principal: &'a str,
		secret: &'a Secret,
		resource: &'a ResourceUri,
	) -> ClientFuture<'a, TokenGrant>;

	/// Runs the human-present device flow, publishing the prompt through `interaction`.
	fn acquire_interactive<'a>(
		&'a self,
		principal: Option<&'a str>,
		resource: &'a ResourceUri,
		interaction: &'a dyn InteractionSink,
	) -> ClientFuture<'a, TokenGrant>;
}

/// Factory constructing [`IdentityClient`] values on first use.
pub trait ClientFactory
where
	Self: Send + Sync,
{
	/// Constructs a ready-to-use identity client bound to `store`.
	fn build(
		&self,
		config: &BrokerConfig,
		store: Arc<dyn AccountStore>,
	) -> Result<Arc<dyn IdentityClient>, ProviderError>;
}

/// Error type produced by [`IdentityClient`] and [`ClientFactory`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderError {
	/// Identity client construction failed.
	#[error("Identity client construction failed: {message}.")]
	Construction {
		/// Human-readable error payload.
		message: String,
	},
	/// Attached account cache raised while the client was using it.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		StoreError,
	),
	/// Provider rejected the grant with a terminal OAuth error.
	#[error("Provider rejected the {grant} grant: {message}.")]
	Rejected {
		/// Grant that was underway.
		grant: &'static str,
		/// HTTP status returned by the provider, when available.
		status: Option<u16>,
		/// Provider-supplied error payload.
		message: String,
	},
	/// Provider response could not be parsed.
	#[error("Provider returned a malformed token response: {message}.")]
	Malformed {
		/// Human-readable error payload.
		message: String,
	},
	/// Transport failed before the provider produced a verdict.
	#[error("Provider transport failure: {message}.")]
	Transport {
		/// Human-readable error payload.
		message: String,
	},
}

/// Outcome of a silent acquisition attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SilentOutcome {
	/// Silent grant succeeded.
	Granted(TokenGrant),
	/// Provider demands a human-present sign-in before the account can be used again.
	InteractionRequired,
}

/// Token material handed back by a successful grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
	/// Principal the provider authenticated, when disclosed by the token claims.
	pub principal: Option<String>,
	/// Directory tenant that issued the token, when disclosed by the token claims.
	pub tenant_id: Option<String>,
	/// Bearer secret.
	pub bearer: Secret,
	/// Refresh material for future silent grants, when issued.
	pub refresh_secret: Option<Secret>,
	/// Token lifetime reported by the provider.
	pub lifetime: Option<Duration>,
}

/// Sink receiving device-flow prompts that a human must act on.
pub trait InteractionSink
where
	Self: Send + Sync,
{
	/// Presents the verification prompt to the human completing the sign-in.
	fn present(&self, prompt: &InteractionPrompt);
}

/// Device-flow verification prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionPrompt {
	/// URI the human must open in a browser.
	pub verification_uri: String,
	/// One-time code the human must enter there.
	pub user_code: String,
}
impl Display for InteractionPrompt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"To sign in, use a web browser to open {} and enter the code {}.",
			self.verification_uri, self.user_code,
		)
	}
}

/// Default [`InteractionSink`] that publishes prompts through the tracing pipeline.
#[derive(Clone, Debug, Default)]
pub struct TracingInteractionSink;
impl InteractionSink for TracingInteractionSink {
	fn present(&self, prompt: &InteractionPrompt) {
		tracing::info!(
			verification_uri = %prompt.verification_uri,
			user_code = %prompt.user_code,
			"Complete the device sign-in in a browser.",
		);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn prompt_renders_a_human_readable_sentence() {
		let prompt = InteractionPrompt {
			verification_uri: "https://login.example.net/devicelogin".into(),
			user_code: "ABCD-1234".into(),
		};

		assert_eq!(
			prompt.to_string(),
			"To sign in, use a web browser to open https://login.example.net/devicelogin and enter the code ABCD-1234.",
		);
	}

	#[test]
	fn cache_failures_keep_the_store_error_as_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let provider_error: ProviderError = store_error.clone().into();

		assert!(matches!(provider_error, ProviderError::Cache(_)));

		let source = StdError::source(&provider_error)
			.expect("Provider error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
