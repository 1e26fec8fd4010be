//! Channel secret derivation.
//!
//! Hashtag channels (name beginning with `#`) do not carry a user-supplied
//! key; their 16-byte secret is derived from the channel name so that every
//! node computes the same key independently.

use sha2::{Digest, Sha256};

/// Length of a channel secret on the wire.
pub const CHANNEL_SECRET_LEN: usize = 16;

/// Well-known secret of the default public channel.
pub const PUBLIC_CHANNEL_SECRET: [u8; CHANNEL_SECRET_LEN] = [
    0x8b, 0x33, 0x87, 0xe9, 0xc5, 0xcd, 0xea, 0x6a, 0xc9, 0xe5, 0xed, 0xba, 0xa1, 0x15, 0xcd,
    0x72,
];

/// Derive a channel secret from its name: `SHA256(utf8(name))[0..16]`.
#[must_use]
pub fn derive_channel_secret(name: &str) -> [u8; CHANNEL_SECRET_LEN] {
    let digest = Sha256::digest(name.as_bytes());
    let mut secret = [0u8; CHANNEL_SECRET_LEN];
    secret.copy_from_slice(&digest[..CHANNEL_SECRET_LEN]);
    secret
}
