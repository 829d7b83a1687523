//! Session model: the bearer token, its decoded claims, and the signed-in identity.

pub mod claims;
pub mod identity;
pub mod token;

pub use claims::TokenClaims;
pub use identity::SessionIdentity;
pub use token::AccessToken;
