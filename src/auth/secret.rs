//! Redacted secret material carried through the acquisition chain.

// self
use crate::_prelude::*;

/// Opaque secret that redacts itself when formatted.
///
/// Passwords, refresh material, and bearer tokens all travel through this wrapper so that
/// formatting a request or a token can never leak credential bytes into logs.
#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps raw secret material.
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// Exposes the wrapped material to code that genuinely needs it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the wrapped material is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Secret(<redacted>)")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
impl From<&str> for Secret {
	fn from(raw: &str) -> Self {
		Self::new(raw)
	}
}
impl From<String> for Secret {
	fn from(raw: String) -> Self {
		Self(raw)
	}
}
