//! High-level client for MeshCore companion radio nodes.
//!
//! [`Client`] offers one typed async operation per protocol command on top
//! of a [`meshcore_core::Transport`]: device queries, contact management,
//! channel management, messaging, and mesh-network operations (adverts,
//! path discovery, traces, remote status, neighbour tables).
//!
//! Each operation validates its arguments, packs the request record, issues
//! the command, and decodes the reply. Device-reported errors surface as
//! [`ClientError::Protocol`] with the raw status byte preserved; nothing is
//! silently retried or substituted. Long-latency operations follow the
//! protocol's two-phase pattern: an immediate `Sent` ack carrying a
//! suggested timeout, then a push frame with the real result.
//!
//! Multiple clients may coexist, one per device; there is no global state.

mod channels;
mod client;
mod contacts;
mod device;
mod error;
mod messaging;
mod network;

pub use channels::{Channel, DEFAULT_PUBLIC_FREQ_HZ};
pub use client::{Client, ClientConfig};
pub use contacts::ContactBook;
pub use error::{ClientError, Result};
pub use meshcore_core::{CancelToken, Event, Transport, TransportConfig, TransportError};
pub use meshcore_proto::{PublicKey, records};
