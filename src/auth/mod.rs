mod middleware;
mod password;
mod token;

pub use middleware::{AuthError, RequireAdmin, RequireUser};
pub use password::{hash_password, verify_password};
pub use token::{IssuedToken, issue_token, parse_token, verify_token};

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{Error, Result};

/// Sessions expire this long after issuance.
pub const SESSION_TTL_DAYS: i64 = 7;

const ARGON2_MEMORY: u32 = 64 * 1024; // 64 MiB in KiB blocks
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

/// Shared Argon2id instance used for both passwords and session tokens.
fn hasher() -> Argon2<'static> {
    let params = Params::new(
        ARGON2_MEMORY,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(ARGON2_OUTPUT_LEN),
    )
    .expect("invalid argon2 params");

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hashes an arbitrary secret with a fresh salt, returning a PHC string.
fn hash_secret(secret: &[u8]) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()
        .hash_password(secret, &salt)
        .map_err(|e| Error::Config(format!("failed to hash secret: {e}")))?;
    Ok(hash.to_string())
}

/// Verifies a secret against a stored PHC hash. A mismatch is `Ok(false)`;
/// only malformed input is an error.
fn verify_secret(secret: &[u8], hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;

    match hasher().verify_password(secret, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Config(format!("failed to verify secret: {e}"))),
    }
}
