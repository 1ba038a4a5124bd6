//! Shared access signature tokens.
//!
//! [`canonical`] builds the string to sign, [`signer`] computes and encodes the
//! HMAC-SHA256 digest, [`issuer`] assembles the header-ready token and [`cache`]
//! keeps one live token per destination.

pub mod cache;
pub mod canonical;
pub mod issuer;
pub mod signer;

pub use cache::TokenCache;
pub use canonical::canonicalize;
pub use issuer::{issue, AccessToken};
pub use signer::sign;
