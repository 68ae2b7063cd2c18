//! Opaque session tokens of the form `tally_<lookup>_<secret>`.
//!
//! The lookup half is stored in the clear under a unique index so a request
//! can find its session row in one query; the full token is argon2id-hashed
//! at rest, so a leaked database cannot be replayed.

use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "tally";
const LOOKUP_LENGTH: usize = 8;
const SECRET_BYTES: usize = 12;
const SECRET_LENGTH: usize = 2 * SECRET_BYTES; // hex

/// A freshly issued token. `token` goes to the client; `lookup` and `hash`
/// go into the session row.
pub struct IssuedToken {
    pub token: String,
    pub lookup: String,
    pub hash: String,
}

/// Mints a new session token.
pub fn issue_token() -> Result<IssuedToken> {
    let lookup = uuid::Uuid::new_v4().simple().to_string()[..LOOKUP_LENGTH].to_string();
    let secret = hex::encode(rand::random::<[u8; SECRET_BYTES]>());
    let token = format!("{TOKEN_PREFIX}_{lookup}_{secret}");
    let hash = super::hash_secret(token.as_bytes())?;

    Ok(IssuedToken {
        token,
        lookup,
        hash,
    })
}

/// Verifies a presented token against a session row's stored hash.
pub fn verify_token(token: &str, hash: &str) -> Result<bool> {
    super::verify_secret(token.as_bytes(), hash)
}

/// Splits a presented token into `(lookup, secret)`, rejecting anything that
/// does not match the issued shape exactly.
pub fn parse_token(token: &str) -> Result<(String, String)> {
    let mut parts = token.split('_');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(TOKEN_PREFIX), Some(lookup), Some(secret), None)
            if lookup.len() == LOOKUP_LENGTH && secret.len() == SECRET_LENGTH =>
        {
            Ok((lookup.to_string(), secret.to_string()))
        }
        _ => Err(Error::InvalidTokenFormat),
    }
}
