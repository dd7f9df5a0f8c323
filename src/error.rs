//! Broker-level error types shared across tenants, providers, stores, and remote sessions.

// self
use crate::{
	_prelude::*, auth::ResourceError, config::ConfigError, gateway::RemoteFault, obs::StageKind,
	provider::ProviderError, store::StoreError, tenant::TenantError,
};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Resource URI was rejected during normalization.
	#[error(transparent)]
	Resource(#[from] ResourceError),
	/// Tenant registry could not resolve a usable sign-in identity.
	#[error(transparent)]
	Tenant(#[from] TenantError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),

	/// Identity provider failed while the acquisition chain was running.
	#[error("Token acquisition failed during the {} stage.", stage.as_str())]
	Authentication {
		/// Chain stage that raised the provider failure.
		stage: StageKind,
		/// Underlying provider failure.
		#[source]
		source: ProviderError,
	},
	/// Remote content store call failed after the retry budget was spent.
	#[error(transparent)]
	Remote(#[from] RemoteFault),
}
