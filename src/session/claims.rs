//! Best-effort view of the bearer token's embedded claims.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
// self
use crate::{_prelude::*, session::AccessToken};

/// Claims the gateway cares about, decoded from the token's payload segment.
///
/// The token stays opaque except for renewal scheduling: decoding is best effort, never
/// verifies the signature, and collapses every malformed shape into "no expiry known".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenClaims {
	/// Expiry instant from the `exp` claim, when one decodes.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenClaims {
	/// Decodes the claims carried by the provided token.
	pub fn decode(token: &AccessToken) -> Self {
		Self { expires_at: decode_expiry(token.expose()) }
	}
}

fn decode_expiry(raw: &str) -> Option<OffsetDateTime> {
	let payload = raw.split('.').nth(1)?;
	// Unpadded per RFC 7515, but tolerate issuers that keep the padding.
	let bytes = URL_SAFE_NO_PAD.decode(payload).or_else(|_| URL_SAFE.decode(payload)).ok()?;
	let claims = serde_json::from_slice::<serde_json::Value>(&bytes).ok()?;
	let exp = claims.get("exp")?;
	let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;

	OffsetDateTime::from_unix_timestamp(seconds).ok()
}
