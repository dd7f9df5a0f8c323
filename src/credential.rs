//! Site credential cache feeding remote content sessions.

// self
use crate::{_prelude::*, auth::Secret};

/// Stored credential for one content site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SiteCredential {
	/// Site address the credential belongs to.
	pub site_address: String,
	/// Sign-in principal.
	pub principal: String,
	/// Credential secret.
	pub secret: Secret,
}

/// Identity pair handed to content session openers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserContext {
	/// Sign-in principal; empty for anonymous sessions.
	pub principal: String,
	/// Credential secret; empty for anonymous sessions.
	pub secret: Secret,
}
impl UserContext {
	/// Anonymous placeholder used when no credential is cached for a site.
	pub fn anonymous() -> Self {
		Self { principal: String::new(), secret: Secret::new("") }
	}

	/// Returns `true` when this context carries no credential material.
	pub fn is_anonymous(&self) -> bool {
		self.principal.is_empty() && self.secret.is_empty()
	}
}

/// Last-write-wins cache of site credentials keyed by case-insensitive site address.
#[derive(Default)]
pub struct CredentialCache {
	entries: RwLock<HashMap<String, SiteCredential>>,
}
impl CredentialCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores a credential, replacing any previous entry for the same site.
	pub fn put(&self, credential: SiteCredential) {
		self.entries.write().insert(credential.site_address.to_lowercase(), credential);
	}

	/// Looks up the credential cached for a site.
	pub fn try_get(&self, site_address: &str) -> Option<SiteCredential> {
		self.entries.read().get(&site_address.to_lowercase()).cloned()
	}

	/// Builds the user context for a site, falling back to the anonymous placeholder.
	pub fn user_context_for(&self, site_address: &str) -> UserContext {
		self.try_get(site_address)
			.map(|credential| UserContext {
				principal: credential.principal,
				secret: credential.secret,
			})
			.unwrap_or_else(UserContext::anonymous)
	}
}
