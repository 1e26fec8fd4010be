//! Typed device events.
//!
//! The reader task decodes every push frame into an [`Event`] and publishes
//! it on a bounded broadcast channel. Message frames are also mirrored here
//! even when they complete a pending request, so subscribers observe all
//! traffic without racing the command surface.

use meshcore_proto::{
    Frame, ResponseCode,
    records::{
        Advertisement, BinaryResponse, IncomingMessage, PathDiscoveryResult, PathUpdated,
        RemoteStatus, RxLogEntry, SendConfirmed, TraceData,
    },
};

/// An asynchronous device event.
#[derive(Debug, Clone)]
pub enum Event {
    /// A text message arrived (direct or channel).
    MessageReceived(IncomingMessage),

    /// The device has queued messages waiting to be synced.
    MessagesWaiting,

    /// A node advert was heard; the contact may be new or updated.
    ContactObserved(Advertisement),

    /// A contact's learned out-path changed.
    PathUpdated(PathUpdated),

    /// A previously sent message was confirmed delivered.
    SendConfirmed(SendConfirmed),

    /// A remote node answered a status request.
    StatusResponse(RemoteStatus),

    /// Trace data arrived for a `SendTracePath` command.
    TraceData(TraceData),

    /// A tagged binary response arrived.
    BinaryResponse(BinaryResponse),

    /// A path discovery round completed.
    PathResponse(PathDiscoveryResult),

    /// Raw RX log entry (firmware packet logging).
    RxLog(RxLogEntry),

    /// A push frame this host does not decode; payload preserved verbatim.
    UnknownPush {
        /// The raw response code.
        code: u8,
        /// The frame body after the code byte.
        body: Vec<u8>,
    },

    /// The reader task hit a non-fatal condition (decode failure, framing
    /// buffer overflow) or a fatal stream error just before stopping.
    Error {
        /// Human-readable description.
        reason: String,
    },

    /// The reader task stopped; the transport is down.
    Disconnected,
}

impl Event {
    /// Decode a device→host frame into the event it represents.
    ///
    /// Returns `None` for frames that carry no event semantics (plain
    /// request/response codes other than messages) and for push frames
    /// whose body fails structural decoding — those surface as
    /// [`Event::Error`] at the call site instead.
    #[must_use]
    pub(crate) fn from_frame(frame: &Frame) -> Option<Self> {
        let code = ResponseCode::from_u8(frame.code()?);
        let body = frame.body();

        if code.is_message() {
            return IncomingMessage::decode(code, body).map(Self::MessageReceived);
        }

        match code {
            ResponseCode::PushMsgWaiting => Some(Self::MessagesWaiting),
            ResponseCode::PushAdvert | ResponseCode::PushNewAdvert => {
                Advertisement::decode(body).ok().map(Self::ContactObserved)
            },
            ResponseCode::PushPathUpdated => {
                PathUpdated::decode(body).ok().map(Self::PathUpdated)
            },
            ResponseCode::PushSendConfirmed => {
                SendConfirmed::decode(body).ok().map(Self::SendConfirmed)
            },
            ResponseCode::PushStatusResponse => {
                RemoteStatus::decode(body).ok().map(Self::StatusResponse)
            },
            ResponseCode::PushTraceData => TraceData::decode(body).ok().map(Self::TraceData),
            ResponseCode::PushBinaryResponse => {
                BinaryResponse::decode(body).ok().map(Self::BinaryResponse)
            },
            ResponseCode::PushPathResponse => {
                PathDiscoveryResult::decode(body).ok().map(Self::PathResponse)
            },
            ResponseCode::PushLogRxData => RxLogEntry::decode(body).ok().map(Self::RxLog),
            code if code.is_push() => {
                Some(Self::UnknownPush { code: code.to_u8(), body: body.to_vec() })
            },
            _ => None,
        }
    }
}
