use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 of `text`, lowercase hex (64 chars).
///
/// Used to store OTP codes without keeping the plaintext.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two digests over their full length in constant time.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
