//! Token acquisition chain over a lazily constructed identity client.
//!
//! [`TokenBroker::acquire_token`] turns a resource URI and an optional principal into a
//! bearer token while minimizing interactive prompts. Stages run cheapest first: a
//! silent grant against a cached account, then the password grant when credentials are
//! at hand, then the human-present device flow as the last resort. The underlying
//! identity client is built exactly once per broker under a mutex and is only published
//! after construction succeeds, so a failed build never leaves a half-initialized
//! client visible to concurrent callers.

mod metrics;

pub use metrics::BrokerMetrics;

// self
#[cfg(feature = "reqwest")] use crate::provider::HttpIdentityClientFactory;
use crate::{
	_prelude::*,
	auth::{AcquiredToken, ResourceUri, Secret},
	config::BrokerConfig,
	obs::{self, AcquireSpan, StageKind, StageOutcome},
	provider::{
		ClientFactory, IdentityClient, InteractionSink, ProviderError, SilentOutcome, TokenGrant,
		TracingInteractionSink,
	},
	store::{AccountStore, FileStore, MemoryStore},
	tenant::TenantRegistry,
};

/// One token acquisition request.
#[derive(Clone, Debug)]
pub struct AcquireRequest {
	/// Resource URI access is requested against.
	pub resource_uri: String,
	/// Explicit principal to sign in; resolved through the tenant registry when absent.
	pub principal: Option<String>,
	/// Password backing the password grant stage, when known.
	pub secret: Option<Secret>,
	/// Whether the URI came from outside and must be collapsed to its HTTPS origin.
	pub externally_provided: bool,
}
impl AcquireRequest {
	/// Creates a request for `resource_uri`.
	pub fn new(resource_uri: impl Into<String>, externally_provided: bool) -> Self {
		Self {
			resource_uri: resource_uri.into(),
			principal: None,
			secret: None,
			externally_provided,
		}
	}

	/// Sets the explicit principal to sign in.
	pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
		self.principal = Some(principal.into());

		self
	}

	/// Sets the password used by the password grant stage.
	pub fn with_secret(mut self, secret: Secret) -> Self {
		self.secret = Some(secret);

		self
	}
}

/// Multi-tenant token broker running the acquisition chain.
pub struct TokenBroker {
	config: BrokerConfig,
	tenants: Arc<TenantRegistry>,
	factory: Arc<dyn ClientFactory>,
	interaction: Arc<dyn InteractionSink>,
	client: Mutex<Option<Arc<dyn IdentityClient>>>,
	metrics: BrokerMetrics,
}
impl TokenBroker {
	const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(1);

	/// Creates a broker driving identity clients built by `factory`.
	pub fn new(
		config: BrokerConfig,
		tenants: Arc<TenantRegistry>,
		factory: Arc<dyn ClientFactory>,
	) -> Self {
		Self {
			config,
			tenants,
			factory,
			interaction: Arc::new(TracingInteractionSink),
			client: Mutex::new(None),
			metrics: BrokerMetrics::default(),
		}
	}

	/// Creates a broker backed by the bundled HTTPS identity client.
	#[cfg(feature = "reqwest")]
	pub fn with_http_provider(config: BrokerConfig, tenants: Arc<TenantRegistry>) -> Self {
		Self::new(config, tenants, Arc::new(HttpIdentityClientFactory::default()))
	}

	/// Replaces the sink receiving device-flow prompts.
	pub fn with_interaction_sink(mut self, interaction: Arc<dyn InteractionSink>) -> Self {
		self.interaction = interaction;

		self
	}

	/// Counters observed across this broker's lifetime.
	pub fn metrics(&self) -> &BrokerMetrics {
		&self.metrics
	}

	/// Runs the acquisition chain for one request.
	///
	/// The resource URI is normalized first, then the principal is resolved through the
	/// tenant registry when the request carries none. Provider failures from any stage
	/// surface as [`Error::Authentication`] wrapping the original cause; a failed call
	/// never corrupts broker state, so a later call may still succeed.
	pub async fn acquire_token(&self, request: &AcquireRequest) -> Result<AcquiredToken> {
		let resource = ResourceUri::normalize(&request.resource_uri, request.externally_provided)?;
		let principal =
			match request.principal.clone().filter(|principal| !principal.trim().is_empty()) {
				Some(principal) => Some(principal),
				None => self.tenants.resolve_username(&resource)?,
			};
		let span = AcquireSpan::new(resource.as_str());

		span.instrument(self.run_chain(resource, principal, request.secret.as_ref())).await
	}

	async fn run_chain(
		&self,
		resource: ResourceUri,
		principal: Option<String>,
		secret: Option<&Secret>,
	) -> Result<AcquiredToken> {
		let client = self.client_handle()?;

		if let Some(principal) = principal.as_deref() {
			obs::record_stage_outcome(StageKind::Silent, StageOutcome::Attempt);

			let cached = client
				.cached_account(principal)
				.await
				.map_err(|source| self.auth_failure(StageKind::Silent, source))?;

			match cached {
				Some(account) => {
					tracing::debug!(principal, "Found a cached account; attempting a silent grant.");

					match client.acquire_silent(&account, &resource).await {
						Ok(SilentOutcome::Granted(grant)) => {
							obs::record_stage_outcome(StageKind::Silent, StageOutcome::Success);
							self.metrics.record_silent();

							return Ok(self.assemble(grant, Some(principal), &resource));
						},
						Ok(SilentOutcome::InteractionRequired) => {
							tracing::debug!(
								principal,
								"Provider requires a fresh sign-in; falling through.",
							);
						},
						Err(source) => return Err(self.auth_failure(StageKind::Silent, source)),
					}
				},
				None => tracing::debug!(principal, "No cached account; a new sign-in is required."),
			}
		}

		if let (Some(principal), Some(secret)) = (principal.as_deref(), secret) {
			obs::record_stage_outcome(StageKind::Password, StageOutcome::Attempt);
			tracing::debug!(principal, "Acquiring a token with the password grant.");

			let grant = client
				.acquire_with_password(principal, secret, &resource)
				.await
				.map_err(|source| self.auth_failure(StageKind::Password, source))?;

			obs::record_stage_outcome(StageKind::Password, StageOutcome::Success);
			self.metrics.record_password();

			return Ok(self.assemble(grant, Some(principal), &resource));
		}

		obs::record_stage_outcome(StageKind::Interactive, StageOutcome::Attempt);
		tracing::info!(
			resource = %resource,
			principal = principal.as_deref().unwrap_or(""),
			"Starting the interactive device sign-in.",
		);

		let grant = client
			.acquire_interactive(principal.as_deref(), &resource, &*self.interaction)
			.await
			.map_err(|source| self.auth_failure(StageKind::Interactive, source))?;

		obs::record_stage_outcome(StageKind::Interactive, StageOutcome::Success);
		self.metrics.record_interactive();

		Ok(self.assemble(grant, principal.as_deref(), &resource))
	}

	// Double-checked lazy construction. The lock covers construction only, never the
	// network calls that follow, and the slot is written after the factory succeeds.
	fn client_handle(&self) -> Result<Arc<dyn IdentityClient>> {
		let mut guard = self.client.lock();

		if let Some(client) = guard.as_ref() {
			return Ok(Arc::clone(client));
		}

		obs::record_stage_outcome(StageKind::ClientInit, StageOutcome::Attempt);

		let store = self.open_account_store()?;
		let client = self
			.factory
			.build(&self.config, store)
			.map_err(|source| self.auth_failure(StageKind::ClientInit, source))?;

		*guard = Some(Arc::clone(&client));

		obs::record_stage_outcome(StageKind::ClientInit, StageOutcome::Success);

		Ok(client)
	}

	fn open_account_store(&self) -> Result<Arc<dyn AccountStore>> {
		match self.config.token_cache.as_ref() {
			Some(location) => {
				let path = location.file_path();

				tracing::info!(
					directory = %location.directory.display(),
					file_name = %location.file_name,
					"Attaching the persistent account cache.",
				);

				if path.exists() {
					tracing::info!("Account cache file exists and will be loaded.");
				} else {
					tracing::info!(
						"Account cache file does not exist; a new file will be created after login.",
					);
				}

				let store = FileStore::open(path).map_err(|error| {
					tracing::error!(%error, "Failed to open the persistent account cache.");

					Error::from(error)
				})?;

				Ok(Arc::new(store))
			},
			None => Ok(Arc::new(MemoryStore::default())),
		}
	}

	fn assemble(
		&self,
		grant: TokenGrant,
		principal: Option<&str>,
		resource: &ResourceUri,
	) -> AcquiredToken {
		let principal =
			grant.principal.clone().or_else(|| principal.map(str::to_owned)).unwrap_or_default();
		let expires_at =
			OffsetDateTime::now_utc() + grant.lifetime.unwrap_or(Self::DEFAULT_TOKEN_LIFETIME);
		let token = AcquiredToken {
			principal,
			tenant_id: grant.tenant_id,
			resource: resource.as_str().to_owned(),
			bearer: grant.bearer,
			expires_at,
		};

		tracing::info!(
			resource = %token.resource,
			principal = %token.principal,
			tenant_id = token.tenant_id.as_deref().unwrap_or(""),
			"Token acquired.",
		);

		token
	}

	fn auth_failure(&self, stage: StageKind, source: ProviderError) -> Error {
		obs::record_stage_outcome(stage, StageOutcome::Failure);
		self.metrics.record_failure();

		tracing::error!(stage = %stage, error = %source, "Token acquisition stage failed.");

		Error::Authentication { stage, source }
	}
}
