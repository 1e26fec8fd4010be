//! In-memory pipe connector.

use std::{io, sync::Mutex};

use async_trait::async_trait;
use meshcore_core::{ByteStream, Connector};
use tokio::io::DuplexStream;

/// Connector that hands out a pre-created in-memory stream exactly once.
///
/// A second `open` fails the way a vanished serial port would, which makes
/// reconnect-path tests honest.
pub struct PipeConnector {
    stream: Mutex<Option<DuplexStream>>,
    id: String,
}

impl PipeConnector {
    /// Wrap the host side of a duplex pipe.
    #[must_use]
    pub fn new(stream: DuplexStream) -> Self {
        Self { stream: Mutex::new(Some(stream)), id: "mem://sim-device".to_owned() }
    }

    /// Wrap with a custom diagnostic id.
    #[must_use]
    pub fn with_id(stream: DuplexStream, id: impl Into<String>) -> Self {
        Self { stream: Mutex::new(Some(stream)), id: id.into() }
    }
}

#[async_trait]
impl Connector for PipeConnector {
    async fn open(&self) -> io::Result<Box<dyn ByteStream>> {
        self.stream
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .map(|s| Box::new(s) as Box<dyn ByteStream>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "pipe already consumed"))
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}
