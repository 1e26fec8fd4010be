//! Transport shell: owns the stream, runs the reader, correlates replies.
//!
//! One transport owns one duplex stream. A single background reader task
//! reassembles frames and dispatches them; all record decoding for event
//! delivery happens on that task, preserving wire order for subscribers.
//! Writers serialise through the write lock, and whole request/response
//! cycles serialise through the command lock — the protocol is strictly
//! request/response with the device acting as server.

use std::sync::{
    Arc, Mutex as StdMutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use meshcore_proto::{CommandCode, Frame, FrameCodec, ResponseCode};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, trace, warn};

use crate::{
    cancel::CancelToken,
    correlator::{Correlator, Routed, TagKey},
    error::{Result, TransportError},
    event::Event,
    stream::{ByteStream, Connector},
};

/// Tunables for a transport instance.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Size of the read buffer handed to each stream read.
    pub read_chunk: usize,
    /// Capacity of the typed-event broadcast channel. Laggards drop the
    /// oldest events; the reader never blocks on a slow subscriber.
    pub event_capacity: usize,
    /// Capacity of the raw-frame broadcast channel.
    pub frame_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { read_chunk: 1024, event_capacity: 64, frame_capacity: 64 }
    }
}

/// Per-request deadline and cancellation.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Absolute deadline for the reply.
    pub deadline: Instant,
    /// Caller's cancellation signal.
    pub cancel: CancelToken,
}

impl RequestOptions {
    /// Fallback timeout when the caller does not specify one.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Deadline `timeout` from now, fresh cancellation token.
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self { deadline: Instant::now() + timeout, cancel: CancelToken::new() }
    }

    /// Same deadline, caller-supplied cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::timeout(Self::DEFAULT_TIMEOUT)
    }
}

struct Inner {
    connector: Box<dyn Connector>,
    config: TransportConfig,
    writer: Mutex<Option<WriteHalf<Box<dyn ByteStream>>>>,
    reader_task: StdMutex<Option<JoinHandle<()>>>,
    command_lock: Mutex<()>,
    correlator: Correlator,
    events: broadcast::Sender<Event>,
    frames: broadcast::Sender<Frame>,
    connected: AtomicBool,
}

/// Frame-oriented interface to one radio node.
///
/// Cheap to clone; clones share the underlying link.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

impl Transport {
    /// Build a transport over `connector` with default tunables.
    #[must_use]
    pub fn new(connector: impl Connector) -> Self {
        Self::with_config(connector, TransportConfig::default())
    }

    /// Build a transport with explicit tunables.
    #[must_use]
    pub fn with_config(connector: impl Connector, config: TransportConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (frames, _) = broadcast::channel(config.frame_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(connector),
                config,
                writer: Mutex::new(None),
                reader_task: StdMutex::new(None),
                command_lock: Mutex::new(()),
                correlator: Correlator::default(),
                events,
                frames,
                connected: AtomicBool::new(false),
            }),
        }
    }

    /// Diagnostic identifier of the underlying link.
    #[must_use]
    pub fn link_id(&self) -> String {
        self.inner.connector.id()
    }

    /// True while the reader task is alive and the stream is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Open the stream and start the reader task. No-op when already
    /// connected.
    ///
    /// # Errors
    ///
    /// - `TransportError::ConnectionFailed` if the connector rejects the
    ///   open.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let stream = self.inner.connector.open().await.map_err(|e| {
            TransportError::ConnectionFailed {
                reason: format!("{}: {e}", self.inner.connector.id()),
            }
        })?;

        let (read_half, write_half) = tokio::io::split(stream);
        *self.inner.writer.lock().await = Some(write_half);
        self.inner.connected.store(true, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(read_loop(inner, read_half));
        if let Ok(mut task) = self.inner.reader_task.lock() {
            *task = Some(handle);
        }

        debug!(link = %self.link_id(), "transport connected");
        Ok(())
    }

    /// Stop the reader task and release the stream. Idempotent.
    pub async fn disconnect(&self) {
        let was_connected = self.inner.connected.swap(false, Ordering::SeqCst);

        let handle = self.inner.reader_task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            handle.abort();
        }
        *self.inner.writer.lock().await = None;
        self.inner.correlator.release();
        self.inner.correlator.clear_tags();

        if was_connected {
            debug!(link = %self.link_id(), "transport disconnected");
            let _ = self.inner.events.send(Event::Disconnected);
        }
    }

    /// Serialise a frame and write it to the stream.
    ///
    /// Writers are serialised by the write lock; bytes of concurrent
    /// frames never interleave.
    ///
    /// # Errors
    ///
    /// - `TransportError::NotConnected` when no stream is open.
    /// - `TransportError::Codec` if the frame exceeds the payload limit.
    /// - `TransportError::Io` on stream failure.
    pub async fn send_frame(&self, frame: &Frame) -> Result<()> {
        let bytes = frame.to_bytes()?;

        let mut guard = self.inner.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::NotConnected)?;
        writer.write_all(&bytes).await?;
        writer.flush().await?;

        trace!(len = bytes.len(), "frame written");
        Ok(())
    }

    /// Issue a command and await the device's reply.
    ///
    /// Whole request/response cycles are serialised: a second caller waits
    /// until the first completes, times out, or is cancelled. The reply is
    /// returned whatever its response code — interpreting error codes is
    /// the command surface's job.
    ///
    /// # Errors
    ///
    /// - `TransportError::NotConnected` when the link is down (including a
    ///   reader that died while we were waiting).
    /// - `TransportError::Timeout` when `opts.deadline` passes first.
    /// - `TransportError::Cancelled` when `opts.cancel` fires first.
    /// - Write-path errors from [`Transport::send_frame`].
    pub async fn send_command(
        &self,
        cmd: CommandCode,
        body: &[u8],
        opts: &RequestOptions,
    ) -> Result<Frame> {
        let _serial = self.inner.command_lock.lock().await;

        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let rx = self.inner.correlator.claim();
        let frame = Frame::host(cmd.to_u8(), body);

        if let Err(e) = self.send_frame(&frame).await {
            self.inner.correlator.release();
            return Err(e);
        }

        let started = Instant::now();
        tokio::select! {
            reply = rx => reply.map_err(|_| TransportError::NotConnected),
            () = tokio::time::sleep_until(opts.deadline) => {
                self.inner.correlator.release();
                Err(TransportError::Timeout { after: started.elapsed() })
            },
            () = opts.cancel.cancelled() => {
                self.inner.correlator.release();
                Err(TransportError::Cancelled)
            },
        }
    }

    /// Register for a tagged push reply (trace data, binary response)
    /// before sending the command that provokes it.
    #[must_use]
    pub fn watch_tagged(&self, code: ResponseCode, tag: u32) -> TaggedReply {
        let key = (code.to_u8(), tag);
        let rx = self.inner.correlator.register_tag(key);
        TaggedReply { inner: Arc::clone(&self.inner), key, rx: Some(rx) }
    }

    /// Subscribe to typed device events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    /// Subscribe to every parsed device→host frame, before correlator
    /// routing.
    #[must_use]
    pub fn subscribe_frames(&self) -> broadcast::Receiver<Frame> {
        self.inner.frames.subscribe()
    }
}

/// A registered wait for one tagged push frame.
///
/// Dropping the handle unregisters the tag; a push arriving afterwards is
/// delivered to event subscribers instead.
pub struct TaggedReply {
    inner: Arc<Inner>,
    key: TagKey,
    rx: Option<tokio::sync::oneshot::Receiver<Frame>>,
}

impl TaggedReply {
    /// Await the tagged push.
    ///
    /// # Errors
    ///
    /// - `TransportError::Timeout` when `deadline` passes first.
    /// - `TransportError::Cancelled` when `cancel` fires first.
    /// - `TransportError::NotConnected` if the transport goes down.
    pub async fn wait(mut self, deadline: Instant, cancel: &CancelToken) -> Result<Frame> {
        let Some(rx) = self.rx.take() else {
            return Err(TransportError::NotConnected);
        };

        let started = Instant::now();
        tokio::select! {
            reply = rx => reply.map_err(|_| TransportError::NotConnected),
            () = tokio::time::sleep_until(deadline) => {
                Err(TransportError::Timeout { after: started.elapsed() })
            },
            () = cancel.cancelled() => Err(TransportError::Cancelled),
        }
    }
}

impl Drop for TaggedReply {
    fn drop(&mut self) {
        self.inner.correlator.unregister_tag(self.key);
    }
}

/// Background reader: reassemble, hook, route, publish.
async fn read_loop(inner: Arc<Inner>, mut reader: ReadHalf<Box<dyn ByteStream>>) {
    let mut codec = FrameCodec::new();
    let mut buf = vec![0u8; inner.config.read_chunk.max(64)];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("stream closed by peer");
                break;
            },
            Ok(n) => {
                let outcome = codec.push(&buf[..n]);
                if outcome.dropped > 0 {
                    let err = TransportError::BufferOverflow { dropped: outcome.dropped };
                    warn!(dropped = outcome.dropped, "framing buffer overflow");
                    let _ = inner.events.send(Event::Error { reason: err.to_string() });
                }
                for frame in outcome.frames {
                    dispatch(&inner, frame);
                }
            },
            Err(e) => {
                warn!(error = %e, "stream read failed");
                let _ = inner.events.send(Event::Error { reason: format!("read failed: {e}") });
                break;
            },
        }
    }

    // Fail the pending caller and tagged waiters promptly rather than
    // letting them ride out their deadlines.
    inner.connected.store(false, Ordering::SeqCst);
    inner.correlator.release();
    inner.correlator.clear_tags();
    let _ = inner.events.send(Event::Disconnected);
}

/// Route one parsed frame: raw hook first, then the correlator, then the
/// event channel for whatever was not consumed (plus mirrored messages).
fn dispatch(inner: &Inner, frame: Frame) {
    let _ = inner.frames.send(frame.clone());

    let code = frame.code().map(ResponseCode::from_u8);
    let is_message = code.is_some_and(ResponseCode::is_message);
    let is_push = code.is_some_and(ResponseCode::is_push);

    let routed = inner.correlator.route(frame.clone());
    trace!(?code, ?routed, len = frame.payload.len(), "frame dispatched");

    match routed {
        Routed::Tagged => {},
        Routed::Pending if !is_message => {},
        // Mirror messages to subscribers even when they completed a
        // pending sync request, and publish everything unclaimed.
        _ => match Event::from_frame(&frame) {
            Some(event) => {
                let _ = inner.events.send(event);
            },
            None if is_push => {
                let _ = inner.events.send(Event::Error {
                    reason: format!(
                        "undecodable push frame: code {:#04x}, {} bytes",
                        frame.code().unwrap_or_default(),
                        frame.payload.len()
                    ),
                });
            },
            None => {
                // A stray plain reply with no pending caller; observers can
                // still see it on the raw frame hook.
                debug!(?code, "unclaimed reply dropped");
            },
        },
    }
}
