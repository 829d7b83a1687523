//! Storage contract and built-in stores for client-local session state.

pub mod file;
pub mod memory;
pub mod session;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::SessionStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`ClientStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistent, string-keyed client-local storage contract.
///
/// Hosts map this onto whatever survives a page reload or app restart: browser local
/// storage, a profile file, or an in-process map for tests.
pub trait ClientStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under the provided key, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Persists or replaces the value stored under the provided key.
	fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

	/// Removes the value stored under the provided key, if present.
	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Removes every provided key in one backend operation.
	fn remove_many<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`ClientStore`] implementations.
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
