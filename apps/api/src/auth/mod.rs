//! Identity provider: salted credential digests and opaque session tokens.
//!
//! Passwords are stored as `{salt_hex}${digest_hex}` where the digest is
//! sha-256 over salt || password; verification compares in constant time.
//! Session tokens are opaque uuids handed to the client; only their sha-256
//! digest is persisted.

pub mod handlers;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Hashes a password under a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest_hex(&salt, password);
    format!("{salt}${digest}")
}

/// Verifies a password against a stored `{salt}${digest}` value in constant
/// time. Malformed stored values verify as false, never panic.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    let computed = digest_hex(salt, password);
    computed.as_bytes().ct_eq(digest.as_bytes()).into()
}

/// Digest under which a session token is persisted and looked up.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
