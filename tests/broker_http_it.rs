#![cfg(feature = "reqwest")]

// std
use std::{
	env, fs, process,
	sync::Arc,
	time::{SystemTime, UNIX_EPOCH},
};
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
use url::Url;
// self
use identity_broker::{
	auth::Secret,
	broker::{AcquireRequest, TokenBroker},
	config::{BrokerConfig, TokenCacheLocation},
	error::Error,
	obs::StageKind,
	provider::{HttpIdentityClientFactory, InteractionPrompt, InteractionSink, ProviderError},
	tenant::TenantRegistry,
};

const CLIENT_ID: &str = "11111111-2222-3333-4444-555555555555";
const RESOURCE: &str = "https://tenant.files.example.net/sites/Team";
const PRINCIPAL: &str = "admin@tenant.example";

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse test URL literal.")
}

fn broker_config(server: &MockServer, cache: Option<TokenCacheLocation>) -> BrokerConfig {
	let mut builder = BrokerConfig::builder()
		.client_id(CLIENT_ID)
		.redirect_uri(url("https://login.example.net/common/oauth2/nativeclient"))
		.token_endpoint(url(&server.url("/token")))
		.device_authorization_endpoint(url(&server.url("/devicecode")));

	if let Some(location) = cache {
		builder = builder.token_cache(location);
	}

	builder.build().expect("Broker configuration should build for mock endpoints.")
}

/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`.
fn insecure_http_client() -> reqwest::Client {
	reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure reqwest client for tests.")
}

fn broker_for(server: &MockServer, cache: Option<TokenCacheLocation>) -> TokenBroker {
	let factory = HttpIdentityClientFactory::default().with_http_client(insecure_http_client());

	TokenBroker::new(
		broker_config(server, cache),
		Arc::new(TenantRegistry::new("directory.example.net")),
		Arc::new(factory),
	)
}

fn temp_cache_location(label: &str) -> TokenCacheLocation {
	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should sit after the Unix epoch.")
		.subsec_nanos();

	TokenCacheLocation::new(
		env::temp_dir(),
		format!("identity_broker_http_{label}_{}_{nanos}.json", process::id()),
	)
}

#[derive(Default)]
struct RecordingSink {
	prompts: Mutex<Vec<InteractionPrompt>>,
}
impl RecordingSink {
	fn recorded(&self) -> Vec<InteractionPrompt> {
		self.prompts.lock().clone()
	}
}
impl InteractionSink for RecordingSink {
	fn present(&self, prompt: &InteractionPrompt) {
		self.prompts.lock().push(prompt.clone());
	}
}

#[tokio::test]
async fn password_grant_seeds_the_silent_path() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-opaque-1\",\"refresh_token\":\"refresh-opaque-1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let broker = broker_for(&server, None);
	let first = broker
		.acquire_token(
			&AcquireRequest::new(RESOURCE, true)
				.with_principal(PRINCIPAL)
				.with_secret(Secret::new("hunter2")),
		)
		.await
		.expect("Password grant should mint a token.");

	assert_eq!(first.bearer.expose(), "access-opaque-1");
	assert_eq!(first.principal, PRINCIPAL);
	assert_eq!(first.resource, "https://tenant.files.example.net");

	let second = broker
		.acquire_token(&AcquireRequest::new(RESOURCE, true).with_principal(PRINCIPAL))
		.await
		.expect("Silent grant should reuse the persisted refresh material.");

	assert_eq!(second.bearer.expose(), "access-opaque-1");

	token_mock.assert_calls_async(2).await;

	assert_eq!(broker.metrics().password_tokens(), 1);
	assert_eq!(broker.metrics().silent_tokens(), 1);
}

#[tokio::test]
async fn password_rejection_surfaces_the_provider_error() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(
					"{\"error\":\"invalid_grant\",\"error_description\":\"AADSTS50126: Invalid username or password.\"}",
				);
		})
		.await;
	let broker = broker_for(&server, None);
	let err = broker
		.acquire_token(
			&AcquireRequest::new(RESOURCE, true)
				.with_principal(PRINCIPAL)
				.with_secret(Secret::new("wrong")),
		)
		.await
		.expect_err("Password grant should fail with the provider rejection.");

	match err {
		Error::Authentication { stage: StageKind::Password, source } => match source {
			ProviderError::Rejected { grant, status, message } => {
				assert_eq!(grant, "password");
				assert_eq!(status, Some(400));
				assert!(message.contains("AADSTS50126"), "Unexpected rejection message: {message}.");
			},
			other => panic!("Unexpected provider error variant: {other:?}."),
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	token_mock.assert_async().await;

	assert_eq!(broker.metrics().failures(), 1);
}

#[tokio::test]
async fn device_flow_prompts_and_polls_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let device_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/devicecode");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"device_code\":\"device-code-0001\",\"user_code\":\"ABCD-1234\",\"verification_uri\":\"https://login.example.net/devicelogin\",\"expires_in\":900,\"interval\":0}",
				);
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-device-1\",\"refresh_token\":\"refresh-device-1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let sink = Arc::new(RecordingSink::default());
	let broker = broker_for(&server, None).with_interaction_sink(sink.clone());
	let token = broker
		.acquire_token(&AcquireRequest::new(RESOURCE, true))
		.await
		.expect("Device flow should mint a token.");

	assert_eq!(token.bearer.expose(), "access-device-1");

	device_mock.assert_async().await;
	token_mock.assert_async().await;

	let prompts = sink.recorded();

	assert_eq!(prompts.len(), 1);
	assert_eq!(prompts[0].user_code, "ABCD-1234");
	assert_eq!(prompts[0].verification_uri, "https://login.example.net/devicelogin");
	assert_eq!(broker.metrics().interactive_tokens(), 1);
}

#[tokio::test]
async fn silent_interaction_demand_falls_through_over_the_wire() {
	let server = MockServer::start_async().await;
	let mut seed_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-seed-1\",\"refresh_token\":\"refresh-seed-1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let broker = broker_for(&server, None);

	broker
		.acquire_token(
			&AcquireRequest::new(RESOURCE, true)
				.with_principal(PRINCIPAL)
				.with_secret(Secret::new("hunter2")),
		)
		.await
		.expect("Password grant should seed the account cache.");

	seed_mock.assert_async().await;
	seed_mock.delete_async().await;

	let demand_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"interaction_required\",\"error_description\":\"AADSTS50076: multi-factor authentication is required\"}");
		})
		.await;
	let err = broker
		.acquire_token(
			&AcquireRequest::new(RESOURCE, true)
				.with_principal(PRINCIPAL)
				.with_secret(Secret::new("hunter2")),
		)
		.await
		.expect_err("Password retry after the silent fall-through should surface the rejection.");

	// Both the silent refresh and the follow-up password grant must reach the endpoint.
	demand_mock.assert_calls_async(2).await;

	match err {
		Error::Authentication { stage: StageKind::Password, source } => match source {
			ProviderError::Rejected { grant: "password", status: Some(400), message } =>
				assert!(
					message.contains("interaction_required"),
					"Unexpected rejection message: {message}.",
				),
			other => panic!("Unexpected provider error variant: {other:?}."),
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	broker
		.acquire_token(
			&AcquireRequest::new(RESOURCE, true)
				.with_principal(PRINCIPAL)
				.with_secret(Secret::new("hunter2")),
		)
		.await
		.expect_err("The password grant should still be rejected.");

	// The interaction demand evicted the cached account, so the third call goes straight
	// to the password grant instead of retrying the dead refresh secret.
	demand_mock.assert_calls_async(3).await;

	assert_eq!(broker.metrics().silent_tokens(), 0);
	assert_eq!(broker.metrics().failures(), 2);
}

#[tokio::test]
async fn file_cache_survives_broker_restarts() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-persisted-1\",\"refresh_token\":\"refresh-persisted-1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let location = temp_cache_location("restart");

	{
		let broker = broker_for(&server, Some(location.clone()));

		broker
			.acquire_token(
				&AcquireRequest::new(RESOURCE, true)
					.with_principal(PRINCIPAL)
					.with_secret(Secret::new("hunter2")),
			)
			.await
			.expect("Password grant should mint a token and persist the account.");

		assert_eq!(broker.metrics().password_tokens(), 1);
	}

	let restarted = broker_for(&server, Some(location.clone()));
	let token = restarted
		.acquire_token(&AcquireRequest::new(RESOURCE, true).with_principal(PRINCIPAL))
		.await
		.expect("A fresh broker should acquire silently from the persisted cache.");

	assert_eq!(token.bearer.expose(), "access-persisted-1");
	assert_eq!(restarted.metrics().silent_tokens(), 1);
	assert_eq!(restarted.metrics().password_tokens(), 0);

	token_mock.assert_calls_async(2).await;

	let _ = fs::remove_file(location.file_path());
}
