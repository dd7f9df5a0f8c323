//! Best-effort claim extraction from provider-issued bearer tokens.
//!
//! Brokered tokens are opaque to callers, but the directory tenant and the signed-in
//! principal ride inside the JWT payload when the provider issues one. Extraction never
//! fails a grant; a token that is not a parsable JWT simply yields no claims.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

/// Claims of interest recovered from a bearer token payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenClaims {
	/// Directory tenant that issued the token.
	pub tenant_id: Option<String>,
	/// Principal the token was issued to.
	pub principal: Option<String>,
}

#[derive(Deserialize)]
struct RawClaims {
	tid: Option<String>,
	upn: Option<String>,
	unique_name: Option<String>,
	preferred_username: Option<String>,
}

/// Extracts [`TokenClaims`] from a compact JWT, returning `None` for opaque tokens.
pub fn extract_claims(token: &str) -> Option<TokenClaims> {
	let mut segments = token.split('.');
	let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
		(Some(_), Some(payload), Some(_), None) => payload,
		_ => return None,
	};
	let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
	let raw = serde_json::from_slice::<RawClaims>(&bytes).ok()?;

	Some(TokenClaims {
		tenant_id: raw.tid,
		principal: raw.upn.or(raw.unique_name).or(raw.preferred_username),
	})
}
