//! SHA-256 digest computation and constant-time comparison of admin codes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of a string's UTF-8 bytes as 64-char
/// lowercase hex.
pub fn digest_hex(input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(hash)
}

/// True iff `s` is exactly 64 hexadecimal characters.
pub fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Compare two strings in time independent of the first mismatch position.
///
/// Returns false immediately when lengths differ; for equal lengths every
/// byte pair is folded into the result before deciding. Admin codes gate
/// both lock and unlock, so the mismatch position must not leak through
/// wall-clock timing.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Normalize a submitted admin code for digest comparison.
///
/// A string that already looks like a digest is treated as one (lower-cased
/// literal); anything else is digested first. An administrator can therefore
/// configure and submit either the raw secret phrase or its precomputed
/// digest.
pub fn normalize_submitted_code(input: &str) -> String {
    if is_hex64(input) {
        input.to_ascii_lowercase()
    } else {
        digest_hex(input)
    }
}
