use crate::error::Result;

/// Hashes a password using Argon2id, returning a PHC-format string.
pub fn hash_password(password: &str) -> Result<String> {
    super::hash_secret(password.as_bytes())
}

/// Verifies a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    super::verify_secret(password.as_bytes(), hash)
}
