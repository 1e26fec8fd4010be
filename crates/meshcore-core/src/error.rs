//! Transport error taxonomy.
//!
//! One enum covers every failure a caller can observe from the transport
//! layer. Device-reported protocol errors are layered on top by the command
//! surface (`meshcore-client`), which has the command context needed for a
//! useful diagnostic.

use std::time::Duration;

use meshcore_proto::ProtocolError;
use thiserror::Error;

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Operation attempted while the transport is not open.
    #[error("not connected")]
    NotConnected,

    /// The connector refused to open the underlying stream.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// What the connector reported.
        reason: String,
    },

    /// Underlying stream read/write failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No reply arrived before the caller's deadline.
    #[error("timed out after {after:?}")]
    Timeout {
        /// How long the caller waited.
        after: Duration,
    },

    /// The caller's cancellation signal fired before completion.
    #[error("cancelled")]
    Cancelled,

    /// A payload failed structural decoding.
    #[error("codec error: {0}")]
    Codec(#[from] ProtocolError),

    /// The framing buffer exceeded its bound and was truncated.
    #[error("framing buffer overflow: dropped {dropped} bytes")]
    BufferOverflow {
        /// How many bytes were lost.
        dropped: usize,
    },
}

impl TransportError {
    /// True if the transport itself is still usable after this error.
    ///
    /// Timeouts, cancellations, and decode failures leave the link up;
    /// connection and I/O failures do not.
    #[must_use]
    pub fn is_link_alive(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Cancelled | Self::Codec(_) | Self::BufferOverflow { .. }
        )
    }
}
