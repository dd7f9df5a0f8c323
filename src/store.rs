//! Storage contracts and built-in account stores backing silent acquisition.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Secret};

/// Future type returned by account store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by account stores.
///
/// Record keys are normalized principals, so lookups behave case-insensitively across every
/// backend.
pub trait AccountStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record for a principal.
	fn save(&self, record: AccountRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record for a principal, if present.
	fn fetch<'a>(&'a self, principal: &'a str) -> StoreFuture<'a, Option<AccountRecord>>;

	/// Lists every persisted record.
	fn list(&self) -> StoreFuture<'_, Vec<AccountRecord>>;

	/// Removes the record for a principal, returning it when present.
	fn remove<'a>(&'a self, principal: &'a str) -> StoreFuture<'a, Option<AccountRecord>>;
}

/// Error type produced by [`AccountStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Persisted account material enabling later silent sign-ins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
	/// Principal the record belongs to.
	pub principal: String,
	/// Directory tenant the principal signed in through, when the provider disclosed it.
	pub tenant_id: Option<String>,
	/// Refresh material used for silent grants.
	pub refresh_secret: Secret,
	/// Instant the record was last written.
	pub updated_at: OffsetDateTime,
}
impl AccountRecord {
	/// Creates a record stamped with the current time.
	pub fn new(
		principal: impl Into<String>,
		tenant_id: Option<String>,
		refresh_secret: Secret,
	) -> Self {
		Self {
			principal: principal.into(),
			tenant_id,
			refresh_secret,
			updated_at: OffsetDateTime::now_utc(),
		}
	}

	/// Store key of this record.
	pub fn key(&self) -> String {
		normalize_principal(&self.principal)
	}
}

/// Normalizes a principal into its case-insensitive store key.
pub fn normalize_principal(principal: &str) -> String {
	principal.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Backend { message: "filesystem unreachable".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("filesystem unreachable"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn principal_keys_normalize_case_and_whitespace() {
		assert_eq!(normalize_principal("  Admin@Contoso.Example "), "admin@contoso.example");

		let record =
			AccountRecord::new("Admin@Contoso.Example", None, Secret::new("refresh-material"));

		assert_eq!(record.key(), "admin@contoso.example");
	}

	#[test]
	fn account_record_serializes_without_leaking_debug_output() {
		let record = AccountRecord::new(
			"admin@contoso.example",
			Some("tenant-1".into()),
			Secret::new("refresh-material"),
		);

		assert!(!format!("{record:?}").contains("refresh-material"));

		let payload =
			serde_json::to_string(&record).expect("Account record should serialize to JSON.");

		assert!(payload.contains("refresh-material"));

		let round_trip: AccountRecord = serde_json::from_str(&payload)
			.expect("Serialized account record should deserialize from JSON.");

		assert_eq!(round_trip, record);
	}
}
