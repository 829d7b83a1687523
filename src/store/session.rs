//! Typed facade over a [`ClientStore`] for the gateway's well-known session keys.

// self
use crate::{
	_prelude::*,
	origin::Origin,
	session::{AccessToken, SessionIdentity},
	store::{ClientStore, StoreError},
};

const KEY_TOKEN: &str = "token";
const KEY_ROLE: &str = "role";
const KEY_USERNAME: &str = "username";
const KEY_USER_ID: &str = "user_id";
const KEY_ORIGIN_OVERRIDE: &str = "backend_origin_override";

/// Typed access to the persisted session state.
///
/// Five keys live behind this facade: the bearer token, the three identity fields, and the
/// manual backend-origin override. [`SessionStore::clear_session`] removes all five together.
#[derive(Clone)]
pub struct SessionStore {
	store: Arc<dyn ClientStore>,
}
impl SessionStore {
	/// Wraps the provided storage backend.
	pub fn new(store: Arc<dyn ClientStore>) -> Self {
		Self { store }
	}

	/// Fetches the stored bearer token, if present.
	pub async fn access_token(&self) -> Result<Option<AccessToken>, StoreError> {
		Ok(self.store.get(KEY_TOKEN).await?.map(AccessToken::new))
	}

	/// Replaces the stored bearer token, leaving the identity fields untouched.
	pub async fn set_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
		self.store.set(KEY_TOKEN, token.expose()).await
	}

	/// Fetches the stored identity; partial or unparsable identity fields read as absent.
	pub async fn identity(&self) -> Result<Option<SessionIdentity>, StoreError> {
		let role = self.store.get(KEY_ROLE).await?;
		let username = self.store.get(KEY_USERNAME).await?;
		let user_id = self.store.get(KEY_USER_ID).await?;
		let identity = match (role, username, user_id) {
			(Some(role), Some(username), Some(user_id)) => user_id
				.parse::<i64>()
				.ok()
				.map(|user_id| SessionIdentity { role, username, user_id }),
			_ => None,
		};

		Ok(identity)
	}

	/// Persists a full signed-in session: token plus identity.
	pub async fn save_session(
		&self,
		token: &AccessToken,
		identity: &SessionIdentity,
	) -> Result<(), StoreError> {
		self.store.set(KEY_TOKEN, token.expose()).await?;
		self.store.set(KEY_ROLE, &identity.role).await?;
		self.store.set(KEY_USERNAME, &identity.username).await?;
		self.store.set(KEY_USER_ID, &identity.user_id.to_string()).await?;

		Ok(())
	}

	/// Fetches the manual backend-origin override; an unparsable stored value reads as absent.
	pub async fn origin_override(&self) -> Result<Option<Origin>, StoreError> {
		Ok(self
			.store
			.get(KEY_ORIGIN_OVERRIDE)
			.await?
			.and_then(|wire| Origin::from_wire(&wire).ok()))
	}

	/// Persists the manual backend-origin override.
	pub async fn set_origin_override(&self, origin: &Origin) -> Result<(), StoreError> {
		self.store.set(KEY_ORIGIN_OVERRIDE, &origin.to_wire()).await
	}

	/// Removes the manual backend-origin override.
	pub async fn clear_origin_override(&self) -> Result<(), StoreError> {
		self.store.remove(KEY_ORIGIN_OVERRIDE).await
	}

	/// Removes every persisted session key, the origin override included.
	pub async fn clear_session(&self) -> Result<(), StoreError> {
		self.store
			.remove_many(&[KEY_TOKEN, KEY_ROLE, KEY_USERNAME, KEY_USER_ID, KEY_ORIGIN_OVERRIDE])
			.await
	}
}
impl Debug for SessionStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionStore").finish_non_exhaustive()
	}
}
