//! Scripted companion-radio node.
//!
//! `SimDevice` owns the device end of a duplex pipe and runs a task that
//! reassembles host frames with the real codec, hands each command to a
//! test-supplied handler, and writes the handler's replies back. Tests can
//! also inject unsolicited push frames at any point, interleaved with
//! scripted replies exactly as a radio would interleave them.

use meshcore_proto::{CommandCode, Frame, FrameCodec, ResponseCode};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, DuplexStream},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::debug;

use crate::PipeConnector;

/// Replies a handler produces for one command: complete device→host
/// payloads (response code first), written in order.
pub type Replies = Vec<Vec<u8>>;

/// Build a device payload from a response code and record body.
#[must_use]
pub fn payload(code: ResponseCode, body: &[u8]) -> Vec<u8> {
    let mut out = vec![code.to_u8()];
    out.extend_from_slice(body);
    out
}

/// A simulated device driving the far end of a pipe.
pub struct SimDevice {
    push_tx: mpsc::UnboundedSender<Vec<u8>>,
    task: JoinHandle<()>,
}

impl SimDevice {
    /// Spawn a device with the given command handler.
    ///
    /// Returns the device handle and a connector for the host side.
    /// The handler receives `(command, body)` for every host frame and
    /// returns the payloads to send back (possibly none).
    pub fn spawn<H>(handler: H) -> (Self, PipeConnector)
    where
        H: FnMut(CommandCode, &[u8]) -> Replies + Send + 'static,
    {
        let (host_side, device_side) = tokio::io::duplex(16 * 1024);
        let (push_tx, push_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(device_side, handler, push_rx));

        (Self { push_tx, task }, PipeConnector::new(host_side))
    }

    /// Inject an unsolicited device→host payload (a push frame, usually).
    pub fn push(&self, payload: Vec<u8>) {
        let _ = self.push_tx.send(payload);
    }

    /// Stop the device task, closing the pipe from the device end.
    pub fn stop(&self) {
        self.task.abort();
    }
}

async fn run<H>(
    mut stream: DuplexStream,
    mut handler: H,
    mut push_rx: mpsc::UnboundedReceiver<Vec<u8>>,
) where
    H: FnMut(CommandCode, &[u8]) -> Replies + Send + 'static,
{
    let mut codec = FrameCodec::new();
    let mut buf = [0u8; 1024];

    loop {
        tokio::select! {
            read = stream.read(&mut buf) => {
                let n = match read {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                for frame in codec.push(&buf[..n]).frames {
                    let Some(cmd) = frame.code().map(CommandCode::from_u8) else {
                        continue;
                    };
                    debug!(?cmd, "sim device received command");
                    for reply in handler(cmd, frame.body()) {
                        if write_payload(&mut stream, reply).await.is_err() {
                            return;
                        }
                    }
                }
            },
            pushed = push_rx.recv() => {
                let Some(payload) = pushed else { break };
                if write_payload(&mut stream, payload).await.is_err() {
                    return;
                }
            },
        }
    }
}

async fn write_payload(stream: &mut DuplexStream, payload: Vec<u8>) -> std::io::Result<()> {
    let mut wire = Vec::with_capacity(3 + payload.len());
    Frame::device(payload)
        .encode(&mut wire)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    stream.write_all(&wire).await
}

#[cfg(test)]
mod tests {
    use meshcore_core::{RequestOptions, Transport};

    use super::*;

    #[tokio::test]
    async fn scripted_reply_round_trip() {
        let (_device, connector) = SimDevice::spawn(|cmd, _body| match cmd {
            CommandCode::GetDeviceTime => {
                vec![payload(ResponseCode::CurrTime, &7u32.to_le_bytes())]
            },
            _ => vec![payload(ResponseCode::Err, &[0x01])],
        });

        let transport = Transport::new(connector);
        transport.connect().await.unwrap();

        let reply = transport
            .send_command(CommandCode::GetDeviceTime, &[], &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(reply.code(), Some(ResponseCode::CurrTime.to_u8()));
        assert_eq!(reply.body(), &7u32.to_le_bytes());
    }

    #[tokio::test]
    async fn injected_push_reaches_the_host() {
        let (device, connector) = SimDevice::spawn(|_, _| Vec::new());

        let transport = Transport::new(connector);
        transport.connect().await.unwrap();
        let mut frames = transport.subscribe_frames();

        device.push(payload(ResponseCode::PushMsgWaiting, &[]));

        let frame = frames.recv().await.unwrap();
        assert_eq!(frame.code(), Some(ResponseCode::PushMsgWaiting.to_u8()));
    }
}
