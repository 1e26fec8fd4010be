//! Node identity key type.
//!
//! The core treats public keys as opaque 32-byte values: they are carried
//! through the wire verbatim, never interpreted. Compact encodings use a
//! 6-byte prefix.

use crate::error::{ProtocolError, Result};

/// Length of a full public key on the wire.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the prefix used by compact message encodings.
const PREFIX_LEN: usize = 6;

/// An opaque 32-byte node public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn new(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` unless the slice is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            ProtocolError::Truncated {
                record: "public_key",
                expected: PUBLIC_KEY_LEN,
                actual: bytes.len(),
            }
        })?;
        Ok(Self(arr))
    }

    /// The full key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// The 6-byte prefix used in compact message encodings.
    #[must_use]
    pub fn prefix(&self) -> [u8; PREFIX_LEN] {
        let mut out = [0u8; PREFIX_LEN];
        out.copy_from_slice(&self.0[..PREFIX_LEN]);
        out
    }

    /// True if `prefix` matches the head of this key.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &[u8]) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }
}

impl From<[u8; PUBLIC_KEY_LEN]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(PublicKey::from_slice(&[0u8; 31]).is_err());
        assert!(PublicKey::from_slice(&[0u8; 33]).is_err());
        assert!(PublicKey::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn prefix_is_first_six_bytes() {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let key = PublicKey::new(bytes);
        assert_eq!(key.prefix(), [1, 2, 3, 4, 5, 6]);
        assert!(key.matches_prefix(&[1, 2, 3]));
        assert!(!key.matches_prefix(&[2, 2, 3]));
        assert!(!key.matches_prefix(&[]));
    }

    #[test]
    fn display_is_hex() {
        let key = PublicKey::new([0xAB; 32]);
        assert!(key.to_string().starts_with("abab"));
        assert_eq!(key.to_string().len(), 64);
    }
}
