//! Text message records.
//!
//! Outgoing messages are request bodies; incoming messages arrive in four
//! flavours selected by response code. Firmware revisions vary the incoming
//! layouts, so the incoming decoder is lenient: structurally insufficient
//! payloads yield `None` rather than an error, and the frame is skipped.

use crate::{
    codes::ResponseCode,
    error::Result,
    wire::Reader,
};

/// Kind byte of a text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Ordinary chat text.
    Plain,
    /// A CLI command addressed to the remote node.
    CliCommand,
    /// Signed plain text.
    SignedPlain,
    /// A kind byte this host does not know about.
    Unknown(u8),
}

impl TextKind {
    /// The on-wire kind byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::CliCommand => 1,
            Self::SignedPlain => 2,
            Self::Unknown(b) => b,
        }
    }

    /// Decode an on-wire kind byte. Never fails.
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0 => Self::Plain,
            1 => Self::CliCommand,
            2 => Self::SignedPlain,
            other => Self::Unknown(other),
        }
    }
}

/// Request body of `SendTxtMsg`:
/// `[txt_type][attempt][timestamp u32][pubkey_prefix, 6][text]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingContactMessage {
    /// Message kind.
    pub kind: TextKind,
    /// Retry counter, 0 for the first attempt.
    pub attempt: u8,
    /// Sender timestamp (Unix seconds).
    pub timestamp: u32,
    /// Recipient's public-key prefix.
    pub pubkey_prefix: [u8; 6],
    /// Message text (UTF-8, no interior NUL).
    pub text: String,
}

impl OutgoingContactMessage {
    /// Encode as a request body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.text.len());
        out.push(self.kind.to_u8());
        out.push(self.attempt);
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.pubkey_prefix);
        out.extend_from_slice(self.text.as_bytes());
        out
    }
}

/// Request body of `SendChannelTxtMsg`:
/// `[txt_type][channel_idx][timestamp u32][text][NUL]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingChannelMessage {
    /// Message kind.
    pub kind: TextKind,
    /// Target channel slot.
    pub channel_idx: u8,
    /// Sender timestamp (Unix seconds).
    pub timestamp: u32,
    /// Message text (UTF-8, no interior NUL).
    pub text: String,
}

impl OutgoingChannelMessage {
    /// Encode as a request body (trailing NUL included).
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(7 + self.text.len() + 1);
        out.push(self.kind.to_u8());
        out.push(self.channel_idx);
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(self.text.as_bytes());
        out.push(0);
        out
    }
}

/// A received direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    /// Message kind.
    pub kind: TextKind,
    /// Sender's retry counter.
    pub attempt: u8,
    /// Sender timestamp (Unix seconds).
    pub timestamp: u32,
    /// Sender's public-key prefix.
    pub pubkey_prefix: [u8; 6],
    /// Message text.
    pub text: String,
    /// Receive SNR in quarter-dB, present on V3 frames.
    pub snr_scaled: Option<i8>,
    /// Inbound hop count, present on V3 frames.
    pub path_len: Option<u8>,
}

impl ContactMessage {
    /// Receive SNR in dB, if the frame carried one.
    #[must_use]
    pub fn snr_db(&self) -> Option<f32> {
        self.snr_scaled.map(|v| f32::from(v) / 4.0)
    }
}

/// A received channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Message kind.
    pub kind: TextKind,
    /// Channel slot the message arrived on.
    pub channel_idx: u8,
    /// Sender timestamp (Unix seconds).
    pub timestamp: u32,
    /// Message text.
    pub text: String,
    /// Receive SNR in quarter-dB, present on V3 frames.
    pub snr_scaled: Option<i8>,
    /// Inbound hop count, present on V3 frames.
    pub path_len: Option<u8>,
}

/// A received message of either addressing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    /// Direct message from a contact.
    Contact(ContactMessage),
    /// Group message on a channel.
    Channel(ChannelMessage),
}

impl IncomingMessage {
    /// Timestamp of the inner message.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        match self {
            Self::Contact(m) => m.timestamp,
            Self::Channel(m) => m.timestamp,
        }
    }

    /// Text of the inner message.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Contact(m) => &m.text,
            Self::Channel(m) => &m.text,
        }
    }

    /// Decode a message body for one of the four message response codes.
    ///
    /// Returns `None` when `code` is not a message code or the payload is
    /// structurally insufficient for its layout — firmware revisions vary,
    /// and a short message frame must never take the link down.
    #[must_use]
    pub fn decode(code: ResponseCode, body: &[u8]) -> Option<Self> {
        match code {
            ResponseCode::ContactMsgRecv => Self::decode_contact(body, false).ok(),
            ResponseCode::ContactMsgRecvV3 => Self::decode_contact(body, true).ok(),
            ResponseCode::ChannelMsgRecv => Self::decode_channel(body, false).ok(),
            ResponseCode::ChannelMsgRecvV3 => Self::decode_channel(body, true).ok(),
            _ => None,
        }
    }

    fn decode_contact(body: &[u8], v3: bool) -> Result<Self> {
        let mut r = Reader::new("contact_message", body);

        let (snr_scaled, path_len) =
            if v3 { (Some(r.i8()?), Some(r.u8()?)) } else { (None, None) };

        Ok(Self::Contact(ContactMessage {
            kind: TextKind::from_u8(r.u8()?),
            attempt: r.u8()?,
            timestamp: r.u32()?,
            pubkey_prefix: r.array()?,
            text: r.rest_str("text")?,
            snr_scaled,
            path_len,
        }))
    }

    fn decode_channel(body: &[u8], v3: bool) -> Result<Self> {
        let mut r = Reader::new("channel_message", body);

        let (snr_scaled, path_len) =
            if v3 { (Some(r.i8()?), Some(r.u8()?)) } else { (None, None) };

        let kind = TextKind::from_u8(r.u8()?);
        let channel_idx = r.u8()?;
        let timestamp = r.u32()?;
        let mut text = r.rest_str("text")?;
        // The request layout carries a trailing NUL; strip it when echoed.
        if text.ends_with('\0') {
            text.pop();
        }

        Ok(Self::Channel(ChannelMessage {
            kind,
            channel_idx,
            timestamp,
            text,
            snr_scaled,
            path_len,
        }))
    }
}

/// Body of a `Sent` ack: `[result][expected_ack u32][suggested_timeout_ms u32]`.
///
/// The suggested timeout seeds the second wait of a two-phase operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentAck {
    /// Device-side queue result byte.
    pub result: u8,
    /// CRC the eventual delivery confirmation will carry.
    pub expected_ack: u32,
    /// Device's estimate of the round trip, in milliseconds.
    pub suggested_timeout_ms: u32,
}

impl SentAck {
    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 9 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("sent_ack", body);
        Ok(Self {
            result: r.u8()?,
            expected_ack: r.u32()?,
            suggested_timeout_ms: r.u32()?,
        })
    }
}
