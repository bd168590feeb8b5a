//! Credential hashing and one-time password generation.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::distr::Alphanumeric;
use rand::RngExt;

use crate::error::{AccountError, AccountResult};

/// Length of generated one-time passwords.
const GENERATED_PASSWORD_LEN: usize = 16;

/// Hash a plaintext credential with argon2.
///
/// Called on every credential change; the plaintext is never stored.
pub fn hash_password(password: &str) -> AccountResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::PasswordHash(e.to_string()))
}

/// Verify a plaintext credential against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> AccountResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AccountError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a random one-time password for a synthesized account.
///
/// The caller hashes it for storage and hands the plaintext to the delivery
/// channel exactly once.
pub fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
