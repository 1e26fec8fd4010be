//! Channel records.
//!
//! A channel is a named group key slot on the device. Body layout (49
//! bytes): `[0 index][1..33 name, 32 NUL-padded][33..49 secret, 16]`.
//! An all-zero secret means the channel is unencrypted.

use crate::{
    channel_secret::CHANNEL_SECRET_LEN,
    error::{ProtocolError, Result},
    wire::{Reader, put_fixed_str},
};

/// Maximum channel name length in UTF-8 bytes (the 32-byte field keeps a
/// trailing NUL).
pub const CHANNEL_NAME_MAX: usize = 31;

/// Width of the on-wire channel name field.
const NAME_FIELD: usize = 32;

/// One group-channel slot of the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Slot index on the device.
    pub index: u8,
    /// Channel name (≤ 31 bytes UTF-8).
    pub name: String,
    /// 16-byte channel secret; all-zero means unencrypted.
    pub secret: [u8; CHANNEL_SECRET_LEN],
}

impl ChannelInfo {
    /// True when the secret is non-zero.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.secret != [0u8; CHANNEL_SECRET_LEN]
    }

    /// Decode a channel record body (the payload after the response code).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if the body is shorter than 49 bytes.
    /// - `ProtocolError::InvalidText` if the name is not UTF-8.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("channel", body);
        Ok(Self {
            index: r.u8()?,
            name: r.fixed_str(NAME_FIELD, "name")?,
            secret: r.array()?,
        })
    }

    /// Encode as a 49-byte channel record body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Malformed` if the name exceeds
    ///   [`CHANNEL_NAME_MAX`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.name.len() > CHANNEL_NAME_MAX {
            return Err(ProtocolError::Malformed {
                record: "channel",
                reason: format!(
                    "name is {} bytes, limit is {CHANNEL_NAME_MAX}",
                    self.name.len()
                ),
            });
        }

        let mut out = Vec::with_capacity(1 + NAME_FIELD + CHANNEL_SECRET_LEN);
        out.push(self.index);
        put_fixed_str(&mut out, &self.name, NAME_FIELD);
        out.extend_from_slice(&self.secret);
        Ok(out)
    }
}
