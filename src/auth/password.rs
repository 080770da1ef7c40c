// src/auth/password.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::errors::ServerError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with Argon2id default parameters.
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    hash_with(&Argon2::default(), password)
}

/// Hash with explicit cost parameters (memory KiB, iterations, lanes).
pub fn hash_password_with_params(
    password: &str,
    memory_kib: u32,
    iterations: u32,
    lanes: u32,
) -> Result<String, ServerError> {
    let params = Params::new(memory_kib, iterations, lanes, None).map_err(|e| {
        tracing::error!(error = %e, "invalid argon2 params");
        ServerError::InternalError
    })?;
    hash_with(&Argon2::new(Algorithm::Argon2id, Version::V0x13, params), password)
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ServerError::InternalError
        })
}

/// Black-box credential check. A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_correct_and_rejects_wrong() {
        let hash = hash_password_with_params("correct horse", 256, 1, 1).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-hash"));
    }
}
