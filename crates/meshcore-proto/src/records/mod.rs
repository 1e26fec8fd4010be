//! Record codecs: the binary shapes the protocol carries.
//!
//! Each record is a pair of `serialize`/`deserialize` routines with exact
//! byte semantics: all multi-byte integers little-endian, fixed-width name
//! fields NUL-padded, timestamps unsigned 32-bit Unix seconds. Round-trip
//! holds for every in-domain value.
//!
//! Offsets documented per type are payload offsets: byte 0 of a payload is
//! the command byte or response code, record bodies start at byte 1. The
//! decode routines here take the body (code byte already stripped).

mod channel;
mod contact;
mod device;
mod message;
mod network;

pub use channel::{CHANNEL_NAME_MAX, ChannelInfo};
pub use contact::{
    Contact, ContactFlags, ContactType, ContactsStart, EndOfContacts, OUT_PATH_MAX,
};
pub use device::{
    AutoAddConfig, BatteryAndStorage, DeviceInfo, RadioParams, RadioStats, SelfInfo,
};
pub use message::{
    ChannelMessage, ContactMessage, IncomingMessage, OutgoingChannelMessage,
    OutgoingContactMessage, SentAck, TextKind,
};
pub use network::{
    Advertisement, AdvertPath, BinaryRequest, BinaryResponse, NeighbourEntry, NeighbourList,
    PathDiscoveryResult, PathUpdated, RemoteStatus, RxLogEntry, SendConfirmed, TraceData,
    TracePathRequest,
};
