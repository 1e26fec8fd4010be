//! Wire protocol for MeshCore companion radio nodes.
//!
//! A MeshCore node is driven over a byte-oriented duplex link (USB serial,
//! BLE, TCP). This crate implements the byte level of that link and nothing
//! above it:
//!
//! - [`Frame`] and [`FrameCodec`]: length-prefixed framing with directional
//!   start bytes, reassembly under partial reads, and bounded buffering.
//! - [`CommandCode`], [`ResponseCode`], [`ErrorStatus`]: the protocol's
//!   numeric code tables. Unrecognised bytes decode to `Unknown` variants so
//!   newer firmware never causes a hard parse failure.
//! - [`records`]: deterministic serialize/deserialize for every record shape
//!   the protocol carries (contacts, channels, messages, device info, paths,
//!   stats, neighbours).
//! - [`channel_secret`]: SHA-256 derivation of hashtag-channel secrets.
//!
//! The crate performs no I/O and has no runtime dependency; `meshcore-core`
//! builds the transport on top of it.

mod channel_secret;
mod codes;
mod error;
mod frame;
mod key;
pub mod records;
mod wire;

pub use channel_secret::{CHANNEL_SECRET_LEN, PUBLIC_CHANNEL_SECRET, derive_channel_secret};
pub use codes::{
    BinaryReqType, CommandCode, ErrorStatus, FRAME_START_DEVICE, FRAME_START_HOST, ResponseCode,
};
pub use error::{ProtocolError, Result};
pub use frame::{Frame, FrameCodec, FrameDirection, MAX_BUFFER, MAX_PAYLOAD, PushOutcome};
pub use key::{PUBLIC_KEY_LEN, PublicKey};
