//! HTTPS identity client built on the bundled OAuth stack.
//!
//! [`HttpIdentityClient`] drives the refresh, password, and device-code grants over a
//! redirect-free reqwest transport, persisting refresh material into its attached
//! [`AccountStore`] after every successful exchange. Token requests never follow
//! redirects, matching OAuth 2.0 guidance that token endpoints return results directly
//! instead of delegating to another URI.

// crates.io
use oauth2::{
	AsyncHttpClient, ClientId, DeviceAuthorizationUrl, EndpointNotSet, EndpointSet,
	ErrorResponseType, HttpClientError, HttpRequest, HttpResponse, RedirectUrl, RefreshToken,
	RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, Scope,
	StandardDeviceAuthorizationResponse, StandardErrorResponse, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicTokenResponse},
};
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	auth::{ResourceUri, Secret},
	config::BrokerConfig,
	provider::{
		claims,
		client::{
			ClientFactory, ClientFuture, IdentityClient, InteractionPrompt, InteractionSink,
			ProviderError, SilentOutcome, TokenGrant,
		},
	},
	store::{AccountRecord, AccountStore},
};

type ConfiguredClient =
	BasicClient<EndpointNotSet, EndpointSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Thread-safe slot capturing the HTTP status of the most recent provider response.
#[derive(Clone, Debug, Default)]
pub struct StatusSlot(Arc<Mutex<Option<u16>>>);
impl StatusSlot {
	/// Stores the status of the current response.
	pub fn store(&self, status: u16) {
		*self.0.lock() = Some(status);
	}

	/// Returns the captured status, if any, consuming it from the slot.
	pub fn take(&self) -> Option<u16> {
		self.0.lock().take()
	}
}

struct HttpEngine {
	client: ReqwestClient,
	slot: StatusSlot,
}

/// [`AsyncHttpClient`] handle over reqwest that records response statuses in a [`StatusSlot`].
#[derive(Clone)]
pub struct HttpHandle(Arc<HttpEngine>);
impl HttpHandle {
	fn new(client: ReqwestClient, slot: StatusSlot) -> Self {
		Self(Arc::new(HttpEngine { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for HttpHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let engine = Arc::clone(&self.0);

		Box::pin(async move {
			engine.slot.take();

			let response = engine
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			engine.slot.store(status.as_u16());

			let mut converted = HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

/// Identity client backed by HTTPS token exchanges against the configured directory.
pub struct HttpIdentityClient {
	oauth_client: ConfiguredClient,
	http: ReqwestClient,
	store: Arc<dyn AccountStore>,
}
impl HttpIdentityClient {
	fn handle(&self) -> (StatusSlot, HttpHandle) {
		let slot = StatusSlot::default();
		let handle = HttpHandle::new(self.http.clone(), slot.clone());

		(slot, handle)
	}

	async fn persist_grant(
		&self,
		grant: &TokenGrant,
		fallback_refresh: Option<&Secret>,
	) -> Result<(), ProviderError> {
		let Some(principal) = grant.principal.as_deref() else { return Ok(()) };
		let refresh = match grant.refresh_secret.as_ref().or(fallback_refresh) {
			Some(value) => value.clone(),
			None => return Ok(()),
		};

		self.store.save(AccountRecord::new(principal, grant.tenant_id.clone(), refresh)).await?;

		Ok(())
	}
}
impl IdentityClient for HttpIdentityClient {
	fn cached_account<'a>(&'a self, principal: &'a str) -> ClientFuture<'a, Option<AccountRecord>> {
		Box::pin(async move { Ok(self.store.fetch(principal).await?) })
	}

	fn acquire_silent<'a>(
		&'a self,
		account: &'a AccountRecord,
		resource: &'a ResourceUri,
	) -> ClientFuture<'a, SilentOutcome> {
		Box::pin(async move {
			let (slot, handle) = self.handle();
			let refresh = RefreshToken::new(account.refresh_secret.expose().to_owned());
			let request = self
				.oauth_client
				.exchange_refresh_token(&refresh)
				.add_scope(Scope::new(resource.default_scope()));
			let response = match request.request_async(&handle).await {
				Ok(response) => response,
				Err(error) => {
					let outcome = classify_silent_error(slot.take(), error)?;

					// A refresh secret answered with "interaction required" is spent;
					// evict the record so later look-ups skip straight to a fresh sign-in.
					self.store.remove(&account.principal).await?;

					return Ok(outcome);
				},
			};
			let grant = finish_grant(response, Some(&account.principal))?;

			self.persist_grant(&grant, Some(&account.refresh_secret)).await?;

			Ok(SilentOutcome::Granted(grant))
		})
	}

	fn acquire_with_password<'a>(
		&'a self,
		principal: &'a str,
		secret: &'a Secret,
		resource: &'a ResourceUri,
	) -> ClientFuture<'a, TokenGrant> {
		Box::pin(async move {
			let (slot, handle) = self.handle();
			let username = ResourceOwnerUsername::new(principal.to_owned());
			let password = ResourceOwnerPassword::new(secret.expose().to_owned());
			let request = self
				.oauth_client
				.exchange_password(&username, &password)
				.add_scope(Scope::new(resource.default_scope()));
			let response = request
				.request_async(&handle)
				.await
				.map_err(|error| terminal_error("password", slot.take(), error))?;
			let grant = finish_grant(response, Some(principal))?;

			self.persist_grant(&grant, None).await?;

			Ok(grant)
		})
	}

	fn acquire_interactive<'a>(
		&'a self,
		principal: Option<&'a str>,
		resource: &'a ResourceUri,
		interaction: &'a dyn InteractionSink,
	) -> ClientFuture<'a, TokenGrant> {
		Box::pin(async move {
			let (slot, handle) = self.handle();
			let details: StandardDeviceAuthorizationResponse = self
				.oauth_client
				.exchange_device_code()
				.add_scope(Scope::new(resource.default_scope()))
				.request_async(&handle)
				.await
				.map_err(|error| terminal_error("device_code", slot.take(), error))?;

			interaction.present(&InteractionPrompt {
				verification_uri: details.verification_uri().to_string(),
				user_code: details.user_code().secret().to_string(),
			});

			let (slot, handle) = self.handle();
			let response = self
				.oauth_client
				.exchange_device_access_token(&details)
				.request_async(&handle, tokio::time::sleep, None)
				.await
				.map_err(|error| terminal_error("device_code", slot.take(), error))?;
			let grant = finish_grant(response, principal)?;

			self.persist_grant(&grant, None).await?;

			Ok(grant)
		})
	}
}

/// Factory constructing [`HttpIdentityClient`] values from broker configuration.
#[derive(Clone, Debug, Default)]
pub struct HttpIdentityClientFactory {
	http: Option<ReqwestClient>,
}
impl HttpIdentityClientFactory {
	/// Overrides the HTTP transport, e.g. with a client carrying custom TLS settings.
	///
	/// Supplied clients should disable redirect following, because token requests are
	/// dispatched through this transport unchanged.
	pub fn with_http_client(mut self, client: ReqwestClient) -> Self {
		self.http = Some(client);

		self
	}
}
impl ClientFactory for HttpIdentityClientFactory {
	fn build(
		&self,
		config: &BrokerConfig,
		store: Arc<dyn AccountStore>,
	) -> Result<Arc<dyn IdentityClient>, ProviderError> {
		let http = match &self.http {
			Some(client) => client.clone(),
			None => ReqwestClient::builder()
				.redirect(Policy::none())
				.build()
				.map_err(|e| ProviderError::Construction { message: e.to_string() })?,
		};
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_token_uri(TokenUrl::from_url(config.endpoints.token.clone()))
			.set_device_authorization_url(DeviceAuthorizationUrl::from_url(
				config.endpoints.device_authorization.clone(),
			))
			.set_redirect_uri(RedirectUrl::from_url(config.redirect_uri.clone()));

		Ok(Arc::new(HttpIdentityClient { oauth_client, http, store }))
	}
}

fn finish_grant(
	response: BasicTokenResponse,
	fallback_principal: Option<&str>,
) -> Result<TokenGrant, ProviderError> {
	let bearer = Secret::new(response.access_token().secret().clone());
	let recovered = claims::extract_claims(bearer.expose()).unwrap_or_default();
	let lifetime = match response.expires_in() {
		Some(value) => Some(i64::try_from(value.as_secs()).map(Duration::seconds).map_err(
			|_| ProviderError::Malformed {
				message: "expires_in overflows the supported range".into(),
			},
		)?),
		None => None,
	};

	Ok(TokenGrant {
		principal: recovered.principal.or_else(|| fallback_principal.map(str::to_owned)),
		tenant_id: recovered.tenant_id,
		bearer,
		refresh_secret: response.refresh_token().map(|token| Secret::new(token.secret().clone())),
		lifetime,
	})
}

fn classify_silent_error(
	status: Option<u16>,
	error: RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>,
) -> Result<SilentOutcome, ProviderError> {
	if let RequestTokenError::ServerResponse(response) = &error {
		if interaction_required(response) {
			return Ok(SilentOutcome::InteractionRequired);
		}
	}

	Err(terminal_error("refresh_token", status, error))
}

fn interaction_required(response: &BasicErrorResponse) -> bool {
	// An expired or revoked refresh token surfaces as `invalid_grant`; both it and the
	// provider's explicit `interaction_required` extension mean "sign in again", not a fault.
	match response.error() {
		BasicErrorResponseType::InvalidGrant => true,
		BasicErrorResponseType::Extension(code) => code == "interaction_required",
		_ => false,
	}
}

fn terminal_error<RE, ET>(
	grant: &'static str,
	status: Option<u16>,
	error: RequestTokenError<RE, StandardErrorResponse<ET>>,
) -> ProviderError
where
	RE: 'static + StdError,
	ET: ErrorResponseType + Display,
{
	match error {
		RequestTokenError::ServerResponse(response) => {
			let message = if let Some(description) = response.error_description() {
				format!("{}: {description}", response.error())
			} else {
				response.error().to_string()
			};

			ProviderError::Rejected { grant, status, message }
		},
		RequestTokenError::Request(source) =>
			ProviderError::Transport { message: source.to_string() },
		RequestTokenError::Parse(source, _) =>
			ProviderError::Malformed { message: source.to_string() },
		RequestTokenError::Other(message) => ProviderError::Transport { message },
	}
}
