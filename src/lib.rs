//! Rust's prompt-frugal identity token broker: resolve tenants, chain silent-first sign-ins, and
//! retry flaky content sessions in one crate built for migration workloads.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod broker;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod obs;
pub mod provider;
pub mod retry;
pub mod store;
pub mod tenant;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AcquiredToken, Secret},
		config::BrokerConfig,
	};

	/// Parses a URL literal, panicking with context when the literal is malformed.
	pub fn test_url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL literal.")
	}

	/// Builds a broker configuration pointing at a fictional directory endpoint pair.
	pub fn test_broker_config() -> BrokerConfig {
		BrokerConfig::builder()
			.client_id("11111111-2222-3333-4444-555555555555")
			.redirect_uri(test_url("https://login.example.net/common/oauth2/nativeclient"))
			.token_endpoint(test_url("https://login.example.net/common/oauth2/v2.0/token"))
			.device_authorization_endpoint(test_url(
				"https://login.example.net/common/oauth2/v2.0/devicecode",
			))
			.build()
			.expect("Failed to build broker configuration fixture.")
	}

	/// Builds a granted token fixture for the given principal and resource.
	pub fn test_token(principal: &str, resource: &str) -> AcquiredToken {
		AcquiredToken {
			principal: principal.to_owned(),
			tenant_id: Some("test-tenant".into()),
			resource: resource.to_owned(),
			bearer: Secret::new(format!("token-for-{principal}")),
			expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
