//! Byte-stream abstraction.
//!
//! The transport consumes any duplex byte stream: USB serial, a BLE GATT
//! characteristic pair bridged to a stream, TCP, or an in-memory pipe. The
//! seam has two parts: [`ByteStream`], the stream itself, and [`Connector`],
//! which knows how to open one (and can be asked again after a failure).

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A duplex byte stream the transport can own.
///
/// Blanket-implemented for every Tokio stream type, so serial-port and TCP
/// crates plug in without adapters.
pub trait ByteStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> ByteStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Opens the underlying stream for a transport.
///
/// `open` is called on every `connect`; a connector backed by a hot-pluggable
/// link may succeed on a later attempt after failing once.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open the stream.
    ///
    /// # Errors
    ///
    /// Any `io::Error` the link produces; the transport surfaces it as
    /// `ConnectionFailed`.
    async fn open(&self) -> io::Result<Box<dyn ByteStream>>;

    /// Diagnostic identifier of the link (port path, peer address, …).
    fn id(&self) -> String;
}
