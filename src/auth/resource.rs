//! Resource URI normalization for token requests.

// self
use crate::_prelude::*;

const HTTPS_DEFAULT_PORT: u16 = 443;

/// Failures raised while normalizing a resource URI.
#[derive(Debug, ThisError)]
pub enum ResourceError {
	/// Resource URI could not be parsed at all.
	#[error("Resource URI `{uri}` could not be parsed.")]
	Unparsable {
		/// Offending input.
		uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Resource URI has no host component to rebuild an origin from.
	#[error("Resource URI `{uri}` has no host component.")]
	MissingHost {
		/// Offending input.
		uri: String,
	},
	/// Internally supplied resource URI does not use HTTPS.
	#[error("Resource URI `{uri}` must use the https scheme.")]
	InsecureScheme {
		/// Offending input.
		uri: String,
	},
}

/// Normalized resource identifier accepted by every acquisition entry point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceUri {
	resource: String,
	host: String,
}
impl ResourceUri {
	/// Normalizes a raw resource URI.
	///
	/// Externally supplied URIs are rebuilt down to an HTTPS origin: only the host and an
	/// explicit non-default port survive, while path and query are dropped. Internally supplied
	/// URIs are trusted verbatim but must already use HTTPS.
	pub fn normalize(raw: &str, externally_provided: bool) -> Result<Self, ResourceError> {
		let url = Url::parse(raw)
			.map_err(|source| ResourceError::Unparsable { uri: raw.to_owned(), source })?;
		let host = url
			.host_str()
			.ok_or_else(|| ResourceError::MissingHost { uri: raw.to_owned() })?
			.to_owned();

		if !externally_provided {
			if url.scheme() != "https" {
				return Err(ResourceError::InsecureScheme { uri: raw.to_owned() });
			}

			return Ok(Self { resource: raw.to_owned(), host });
		}

		let resource = match url.port() {
			Some(port) if port != HTTPS_DEFAULT_PORT => format!("https://{host}:{port}"),
			_ => format!("https://{host}"),
		};

		Ok(Self { resource, host })
	}

	/// Returns the normalized resource as a string slice.
	pub fn as_str(&self) -> &str {
		&self.resource
	}

	/// Returns the host component of the resource.
	pub fn host(&self) -> &str {
		&self.host
	}

	/// Returns the provider scope granting delegated access to the whole resource.
	pub fn default_scope(&self) -> String {
		format!("{}/.default", self.resource)
	}
}
impl Display for ResourceUri {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.resource)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn external_uri_collapses_to_origin() {
		let resource = ResourceUri::normalize("https://host:8443/a/b?x=1", true)
			.expect("Failed to normalize external resource URI.");

		assert_eq!(resource.as_str(), "https://host:8443");

		let resource = ResourceUri::normalize("https://host/a", true)
			.expect("Failed to normalize external resource URI.");

		assert_eq!(resource.as_str(), "https://host");
	}

	#[test]
	fn external_uri_is_coerced_to_https() {
		let resource = ResourceUri::normalize("http://host:8080/path", true)
			.expect("Failed to normalize external resource URI.");

		assert_eq!(resource.as_str(), "https://host:8080");
	}

	#[test]
	fn external_uri_drops_the_default_port() {
		let resource = ResourceUri::normalize("https://host:443/path", true)
			.expect("Failed to normalize external resource URI.");

		assert_eq!(resource.as_str(), "https://host");
	}

	#[test]
	fn internal_uri_passes_through_verbatim() {
		let resource = ResourceUri::normalize("https://host:8443/a/b?x=1", false)
			.expect("Failed to accept internal resource URI.");

		assert_eq!(resource.as_str(), "https://host:8443/a/b?x=1");
		assert_eq!(resource.host(), "host");
	}

	#[test]
	fn internal_uri_requires_https() {
		let err = ResourceUri::normalize("http://host/a", false)
			.expect_err("Insecure internal resource URI should be rejected.");

		assert!(matches!(err, ResourceError::InsecureScheme { .. }));
	}

	#[test]
	fn unparsable_uri_is_rejected() {
		let err = ResourceUri::normalize("not a uri", true)
			.expect_err("Unparsable resource URI should be rejected.");

		assert!(matches!(err, ResourceError::Unparsable { .. }));
	}

	#[test]
	fn hostless_uri_is_rejected() {
		let err = ResourceUri::normalize("mailto:ops@example.com", true)
			.expect_err("Hostless resource URI should be rejected.");

		assert!(matches!(err, ResourceError::MissingHost { .. }));
	}

	#[test]
	fn default_scope_spans_the_whole_resource() {
		let resource = ResourceUri::normalize("https://tenant.files.example.net/sites/Team", true)
			.expect("Failed to normalize external resource URI.");

		assert_eq!(resource.default_scope(), "https://tenant.files.example.net/.default");
	}
}
