//! Transport core for MeshCore companion radio links.
//!
//! This crate owns the byte-oriented duplex stream to a radio node and
//! multiplexes it between many logical flows:
//!
//! - [`Transport`]: owns the stream, runs the background reader task,
//!   exposes `send_frame` / `send_command` and the event subscription API.
//! - The request correlator (internal): binds device replies to the single
//!   pending caller, routes push codes to subscribers, and matches tagged
//!   pushes (trace data, binary responses) to their waiters.
//! - [`Event`]: typed device events delivered over a bounded broadcast
//!   channel. Slow subscribers lag and drop the oldest events; the reader
//!   never stalls.
//!
//! The concrete link (USB serial, BLE, TCP, in-memory pipe) is supplied by
//! the caller as a [`Connector`]. The crate performs no reconnection: a
//! stream failure is reported once via [`Event::Error`] and the transport
//! stays down until the caller rebuilds it.

mod cancel;
mod correlator;
mod error;
mod event;
mod stream;
mod transport;

pub use cancel::CancelToken;
pub use error::{Result, TransportError};
pub use event::Event;
pub use stream::{ByteStream, Connector};
pub use transport::{RequestOptions, TaggedReply, Transport, TransportConfig};
