//! Acquired token material handed back to callers.

// self
use crate::{_prelude::*, auth::Secret};

/// Bearer token acquired for one principal against one normalized resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquiredToken {
	/// Principal the token was issued to.
	pub principal: String,
	/// Directory tenant that issued the token, when the provider disclosed it.
	pub tenant_id: Option<String>,
	/// Normalized resource the token grants access to.
	pub resource: String,
	/// Bearer secret presented to the resource.
	pub bearer: Secret,
	/// Expiry instant reported by the provider.
	pub expires_at: OffsetDateTime,
}
impl AcquiredToken {
	/// Renders the `Authorization` header value for this token.
	pub fn authorization_header(&self) -> String {
		format!("Bearer {}", self.bearer.expose())
	}

	/// Whether the token is expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at <= instant
	}

	/// Whether the token is expired right now.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
