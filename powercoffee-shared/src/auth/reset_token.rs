/// Password reset token utilities
///
/// A reset token is a 32-character base62 string handed to the user out of
/// band. Only its SHA-256 digest is persisted, so a leaked database row cannot
/// be replayed as a token.
///
/// # Example
///
/// ```
/// use powercoffee_shared::auth::reset_token::{generate_reset_token, hash_reset_token};
///
/// let (token, digest) = generate_reset_token();
/// assert_eq!(token.len(), 32);
/// assert_eq!(hash_reset_token(&token), digest);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a reset token (characters)
pub const RESET_TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a fresh reset token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_digest)
pub fn generate_reset_token() -> (String, String) {
    let token = random_base62(RESET_TOKEN_LENGTH);
    let digest = hash_reset_token(&token);

    (token, digest)
}

/// Random base62 string from the thread-local CSPRNG
pub fn random_base62(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Hex-encoded SHA-256 digest of a token (64 characters)
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check run before any store lookup
pub fn is_well_formed(token: &str) -> bool {
    token.len() == RESET_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
