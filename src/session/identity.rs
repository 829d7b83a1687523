//! Identity of the signed-in user, persisted next to the bearer token.

// self
use crate::_prelude::*;

/// Signed-in user identity stored alongside the bearer token and cleared with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
	/// Role name driving host-side authorization gates.
	pub role: String,
	/// Display username.
	pub username: String,
	/// Numeric user identifier.
	pub user_id: i64,
}
impl SessionIdentity {
	/// Creates an identity from its parts.
	pub fn new(role: impl Into<String>, username: impl Into<String>, user_id: i64) -> Self {
		Self { role: role.into(), username: username.into(), user_id }
	}
}
