//! Wire-level error types.
//!
//! These cover structural failures only: a payload that does not match the
//! expected record layout. Device-reported errors (`RESP_CODE_ERR`) are a
//! successful parse and are surfaced by the command surface, not here.

use thiserror::Error;

/// Result alias for wire-level operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The payload ended before the record's fixed fields.
    #[error("truncated {record} record: need {expected} bytes, have {actual}")]
    Truncated {
        /// Record type being decoded.
        record: &'static str,
        /// Minimum bytes the layout requires.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// A payload exceeded the framing limit.
    #[error("payload too large: {size} bytes exceeds limit of {max}")]
    PayloadTooLarge {
        /// Offending payload size.
        size: usize,
        /// Maximum the frame codec accepts.
        max: usize,
    },

    /// The payload had the right size but nonsensical content.
    #[error("malformed {record} record: {reason}")]
    Malformed {
        /// Record type being decoded.
        record: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A text field was not valid UTF-8.
    #[error("invalid utf-8 in {record} field `{field}`")]
    InvalidText {
        /// Record type being decoded.
        record: &'static str,
        /// Field that failed.
        field: &'static str,
    },
}
