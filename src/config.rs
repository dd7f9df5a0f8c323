//! Broker configuration and its validating builder.

// std
use std::path::PathBuf;
// self
use crate::_prelude::*;

/// Configuration validation failures.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Client identifier was not supplied or is empty.
	#[error("Client identifier must be supplied and non-empty.")]
	MissingClientId,
	/// Redirect URI was not supplied.
	#[error("Redirect URI must be supplied.")]
	MissingRedirectUri,
	/// A directory endpoint was not supplied.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Token cache file name must carry actual characters.
	#[error("Token cache file name must be non-empty.")]
	EmptyCacheFileName,
}

/// Directory endpoints the identity client talks to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectoryEndpoints {
	/// Token grant endpoint.
	pub token: Url,
	/// Device authorization endpoint backing interactive logins.
	pub device_authorization: Url,
}

/// On-disk location of the persistent account cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenCacheLocation {
	/// Directory holding the cache file.
	pub directory: PathBuf,
	/// Cache file name inside [`Self::directory`].
	pub file_name: String,
}
impl TokenCacheLocation {
	/// Creates a cache location from a directory and a file name.
	pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
		Self { directory: directory.into(), file_name: file_name.into() }
	}

	/// Full path of the cache file.
	pub fn file_path(&self) -> PathBuf {
		self.directory.join(&self.file_name)
	}
}

/// Validated broker configuration.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
	/// Public client identifier registered with the identity provider.
	pub client_id: String,
	/// Redirect URI registered for the public client.
	pub redirect_uri: Url,
	/// Directory endpoints used for token grants.
	pub endpoints: DirectoryEndpoints,
	/// Optional persistent account cache location; in-memory when absent.
	pub token_cache: Option<TokenCacheLocation>,
}
impl BrokerConfig {
	/// Creates a new builder.
	pub fn builder() -> BrokerConfigBuilder {
		BrokerConfigBuilder::default()
	}
}

/// Builder for [`BrokerConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct BrokerConfigBuilder {
	client_id: Option<String>,
	redirect_uri: Option<Url>,
	token_endpoint: Option<Url>,
	device_authorization_endpoint: Option<Url>,
	token_cache: Option<TokenCacheLocation>,
}
impl BrokerConfigBuilder {
	/// Sets the public client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the token grant endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the device authorization endpoint.
	pub fn device_authorization_endpoint(mut self, url: Url) -> Self {
		self.device_authorization_endpoint = Some(url);

		self
	}

	/// Enables the persistent account cache at the given location.
	pub fn token_cache(mut self, location: TokenCacheLocation) -> Self {
		self.token_cache = Some(location);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BrokerConfig, ConfigError> {
		let client_id = self
			.client_id
			.filter(|client_id| !client_id.trim().is_empty())
			.ok_or(ConfigError::MissingClientId)?;
		let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRedirectUri)?;
		let token =
			self.token_endpoint.ok_or(ConfigError::MissingEndpoint { endpoint: "token" })?;
		let device_authorization = self
			.device_authorization_endpoint
			.ok_or(ConfigError::MissingEndpoint { endpoint: "device authorization" })?;

		validate_endpoint("redirect", &redirect_uri)?;
		validate_endpoint("token", &token)?;
		validate_endpoint("device authorization", &device_authorization)?;

		if let Some(location) = self.token_cache.as_ref() {
			if location.file_name.trim().is_empty() {
				return Err(ConfigError::EmptyCacheFileName);
			}
		}

		Ok(BrokerConfig {
			client_id,
			redirect_uri,
			endpoints: DirectoryEndpoints { token, device_authorization },
			token_cache: self.token_cache,
		})
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
