//! Thread-safe in-memory [`AccountStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{self, AccountRecord, AccountStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, AccountRecord>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn save_now(map: StoreMap, record: AccountRecord) -> Result<(), StoreError> {
		map.write().insert(record.key(), record);

		Ok(())
	}

	fn fetch_now(map: StoreMap, principal: String) -> Option<AccountRecord> {
		map.read().get(&store::normalize_principal(&principal)).cloned()
	}

	fn list_now(map: StoreMap) -> Vec<AccountRecord> {
		map.read().values().cloned().collect()
	}

	fn remove_now(map: StoreMap, principal: String) -> Option<AccountRecord> {
		map.write().remove(&store::normalize_principal(&principal))
	}
}
impl AccountStore for MemoryStore {
	fn save(&self, record: AccountRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, record) })
	}

	fn fetch<'a>(&'a self, principal: &'a str) -> StoreFuture<'a, Option<AccountRecord>> {
		let map = self.0.clone();
		let principal = principal.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, principal)) })
	}

	fn list(&self) -> StoreFuture<'_, Vec<AccountRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::list_now(map)) })
	}

	fn remove<'a>(&'a self, principal: &'a str) -> StoreFuture<'a, Option<AccountRecord>> {
		let map = self.0.clone();
		let principal = principal.to_owned();

		Box::pin(async move { Ok(Self::remove_now(map, principal)) })
	}
}
