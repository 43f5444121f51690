use rand::Rng;
use sha2::{Digest, Sha256};

use super::{KeyDigest, RawApiKey};

/// Entropy of an issued key in bytes (256 bits).
pub const RAW_KEY_BYTES: usize = 32;

/// Generate a cryptographically random API key, hex encoded (64 chars).
pub fn generate_raw_key() -> RawApiKey {
    let bytes: [u8; RAW_KEY_BYTES] = rand::rng().random();
    RawApiKey::new(hex::encode(bytes))
}

/// Compute the SHA-256 digest of a raw key as lowercase hex.
pub fn digest_key(raw_key: &str) -> KeyDigest {
    KeyDigest::from_hex(hex::encode(Sha256::digest(raw_key.as_bytes())))
}
