//! API key format, generation and comparison.
//!
//! A valid key is the `shrink-` prefix followed by at least 32 characters of
//! unpadded standard base64.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use rand::RngCore;

/// Prefix carried by every key this service issues.
pub const KEY_PREFIX: &str = "shrink-";

/// Minimum length of the encoded part of a key.
pub const MIN_KEY_LENGTH: usize = 32;

/// Random bytes behind a generated key.
const KEY_BYTES: usize = 24;

/// Check a string against the API key format.
pub fn is_valid_api_key(key: &str) -> bool {
    let Some(encoded) = key.strip_prefix(KEY_PREFIX) else {
        return false;
    };

    if encoded.len() < MIN_KEY_LENGTH {
        return false;
    }

    STANDARD_NO_PAD.decode(encoded).is_ok()
}

/// Generate a new API key from the given random source.
pub fn generate_api_key<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut key = [0u8; KEY_BYTES];
    rng.fill_bytes(&mut key);

    format!("{KEY_PREFIX}{}", STANDARD.encode(key))
}

/// Compare two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
