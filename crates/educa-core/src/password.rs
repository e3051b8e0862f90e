//! # Password Hashing
//!
//! Salted, stretched keyed-BLAKE3 hashes encoded as
//! `blake3$<rounds>$<salt-hex>$<hash-hex>`.
//!
//! The key for each hash is derived from a random 16-byte salt, then the
//! password is hashed and re-hashed `rounds` times under that key.
//! Verification re-derives the hash and compares it in constant time.

use crate::primitives::PASSWORD_HASH_ROUNDS;
use std::sync::LazyLock;
use subtle::ConstantTimeEq;

const SCHEME: &str = "blake3";
const KEY_CONTEXT: &str = "educa 2024-06-01 password hashing v1";

/// Stand-in hash checked when a username does not exist, so that unknown
/// accounts cost the same time as wrong passwords.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_with("", b"educa-dummy-salt", PASSWORD_HASH_ROUNDS));

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    hash_with(password, &salt, PASSWORD_HASH_ROUNDS)
}

/// Check a password against an encoded hash. Unknown formats never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    if rounds == 0 {
        return false;
    }

    let recomputed = hash_with(password, &salt, rounds);
    let Some(actual) = recomputed.rsplit('$').next() else {
        return false;
    };
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Spend one full verification on [`DUMMY_HASH`]. Always `false`.
pub fn verify_missing_user(password: &str) -> bool {
    let _ = verify_password(password, &DUMMY_HASH);
    false
}

fn hash_with(password: &str, salt: &[u8], rounds: u32) -> String {
    let key = blake3::derive_key(KEY_CONTEXT, salt);
    let mut digest = blake3::keyed_hash(&key, password.as_bytes());
    for _ in 1..rounds {
        digest = blake3::keyed_hash(&key, digest.as_bytes());
    }
    format!(
        "{SCHEME}${rounds}${}${}",
        hex::encode(salt),
        digest.to_hex()
    )
}

// =============================================================================
// TESTS
// =============================================================================
