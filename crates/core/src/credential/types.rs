use std::fmt;

use serde::{Serialize, Serializer};

/// A freshly issued API key.
///
/// Only exists in memory between issuance and the caller handing it to the
/// user. `Debug` is redacted so the secret never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct RawApiKey(String);

impl RawApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for RawApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawApiKey(<redacted>)")
    }
}

impl Serialize for RawApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Lowercase hex SHA-256 digest of a raw API key.
///
/// Used as the indirection key for the lookup record. Like the raw key it is
/// kept out of `Debug` output and error messages.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyDigest(String);

impl KeyDigest {
    /// Length of a hex-encoded SHA-256 digest.
    pub const HEX_LEN: usize = 64;

    /// Accepts a stored digest only if it is 64 lowercase hex characters.
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = value.len() == Self::HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(value.to_string()))
    }

    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyDigest(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_key_debug_is_redacted() {
        let key = RawApiKey::new("deadbeef");
        assert_eq!(format!("{key:?}"), "RawApiKey(<redacted>)");
    }

    #[test]
    fn raw_key_serializes_as_plain_string() {
        let key = RawApiKey::new("abc");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"abc\"");
    }

    #[test]
    fn digest_parse_accepts_lowercase_hex() {
        let hex = "a".repeat(64);
        assert_eq!(KeyDigest::parse(&hex).unwrap().as_str(), hex);
    }

    #[test]
    fn digest_parse_rejects_malformed_values() {
        assert!(KeyDigest::parse("").is_none());
        assert!(KeyDigest::parse(&"a".repeat(63)).is_none());
        assert!(KeyDigest::parse(&"A".repeat(64)).is_none());
        assert!(KeyDigest::parse(&"g".repeat(64)).is_none());
    }
}
