// src/auth/token.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

pub const DEFAULT_TOKEN_BYTES: usize = 32;
pub const VERIFICATION_CODE_LEN: usize = 6;

/// Generate a secure random session token using the OS RNG.
pub fn generate_token_default() -> String {
    let mut rng = OsRng;
    generate_token(&mut rng, DEFAULT_TOKEN_BYTES)
}

/// Generate a URL-safe token from random bytes.
/// - Uses Base64 URL-safe, no padding.
/// - Typically 32 bytes -> ~43 char token.
pub fn generate_token<R: RngCore>(rng: &mut R, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buf)
}

/// Six decimal digits, uniform over 100000..=999999.
pub fn generate_verification_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(100_000u32..=999_999).to_string()
}

pub fn generate_verification_code_default() -> String {
    generate_verification_code(&mut OsRng)
}

pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Hash a token using SHA-256.
/// Store this output in DB (BLOB).
pub fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
