//! Client error types.

use meshcore_core::TransportError;
use meshcore_proto::{CommandCode, ErrorStatus, ProtocolError};
use thiserror::Error;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the command surface.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (link down, timeout, cancellation, I/O).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The device reported an error or replied with an unexpected code.
    #[error("protocol error on {command}: {status}: {message}")]
    Protocol {
        /// Command the device objected to.
        command: CommandCode,
        /// Raw status byte, preserved verbatim.
        status: ErrorStatus,
        /// Diagnostic message.
        message: String,
    },

    /// A reply payload did not match the expected record layout.
    #[error(transparent)]
    Record(#[from] ProtocolError),

    /// A caller-supplied argument failed validation.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Which argument.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl ClientError {
    /// Raw device status of a protocol error, if that is what this is.
    #[must_use]
    pub fn device_status(&self) -> Option<ErrorStatus> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}
