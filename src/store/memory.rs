//! Thread-safe in-memory [`ClientStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{ClientStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl ClientStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), value.to_owned());

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(key);

			Ok(())
		})
	}

	fn remove_many<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			let mut guard = map.write();

			for key in keys {
				guard.remove(*key);
			}

			Ok(())
		})
	}
}
