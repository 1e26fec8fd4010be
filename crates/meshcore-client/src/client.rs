//! Client core: command plumbing shared by every operation group.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use meshcore_core::{CancelToken, Event, RequestOptions, Transport};
use meshcore_proto::{
    CommandCode, ErrorStatus, Frame, ResponseCode,
    records::SentAck,
};
use tokio::{sync::broadcast, time::Instant};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Tunables for a client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for ordinary single-reply commands.
    pub response_timeout: Duration,
    /// Lower clamp for the second wait of a two-phase operation.
    pub two_phase_min: Duration,
    /// Upper clamp for the second wait of a two-phase operation.
    pub two_phase_max: Duration,
    /// How many channel slots the enumerator polls.
    pub max_channels: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            two_phase_min: Duration::from_secs(1),
            two_phase_max: Duration::from_secs(120),
            max_channels: 40,
        }
    }
}

/// Typed command surface over one transport.
///
/// Cheap to clone; clones share the transport and configuration.
#[derive(Clone)]
pub struct Client {
    pub(crate) transport: Transport,
    pub(crate) config: ClientConfig,
}

impl Client {
    /// Build a client with default configuration.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Build a client with explicit configuration.
    #[must_use]
    pub fn with_config(transport: Transport, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// The underlying transport (event subscriptions, raw frames).
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn options(&self) -> RequestOptions {
        RequestOptions::timeout(self.config.response_timeout)
    }

    /// Issue a command and surface device-reported errors as typed
    /// failures. Any other reply code is returned for the caller to
    /// interpret.
    pub(crate) async fn command(&self, cmd: CommandCode, body: &[u8]) -> Result<Frame> {
        let reply = self.transport.send_command(cmd, body, &self.options()).await?;
        reject_device_error(cmd, body, reply)
    }

    /// Issue a command and require a specific reply code.
    pub(crate) async fn command_expecting(
        &self,
        cmd: CommandCode,
        body: &[u8],
        expected: ResponseCode,
    ) -> Result<Frame> {
        let reply = self.command(cmd, body).await?;
        expect_code(cmd, reply, expected)
    }

    /// Issue a command whose only acceptable reply is `Ok`.
    pub(crate) async fn command_ok(&self, cmd: CommandCode, body: &[u8]) -> Result<()> {
        self.command_expecting(cmd, body, ResponseCode::Ok).await.map(|_| ())
    }

    /// First phase of a two-phase operation: issue the command, require a
    /// `Sent` ack, and derive the second-phase deadline from the device's
    /// suggested timeout scaled by `factor` (clamped to the configured
    /// range).
    pub(crate) async fn command_sent(
        &self,
        cmd: CommandCode,
        body: &[u8],
        factor: f64,
    ) -> Result<(SentAck, Instant)> {
        let reply = self.command_expecting(cmd, body, ResponseCode::Sent).await?;
        let ack = SentAck::decode(reply.body())?;
        let wait = self.scale_suggested(ack.suggested_timeout_ms, factor);
        debug!(?cmd, suggested_ms = ack.suggested_timeout_ms, ?wait, "two-phase ack");
        Ok((ack, Instant::now() + wait))
    }

    fn scale_suggested(&self, suggested_ms: u32, factor: f64) -> Duration {
        let scaled = Duration::from_millis((f64::from(suggested_ms) * factor).round() as u64);
        scaled.clamp(self.config.two_phase_min, self.config.two_phase_max)
    }

    /// Second phase: wait on the event stream until `matcher` claims an
    /// event or the deadline passes.
    pub(crate) async fn await_event<T>(
        &self,
        mut events: broadcast::Receiver<Event>,
        deadline: Instant,
        mut matcher: impl FnMut(&Event) -> Option<T>,
    ) -> Result<T> {
        let started = Instant::now();
        loop {
            let event = tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "event subscriber lagged during two-phase wait");
                        continue;
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(meshcore_core::TransportError::NotConnected.into());
                    },
                },
                () = tokio::time::sleep_until(deadline) => {
                    return Err(
                        meshcore_core::TransportError::Timeout { after: started.elapsed() }.into()
                    );
                },
            };
            if let Some(value) = matcher(&event) {
                return Ok(value);
            }
        }
    }

    /// Fresh correlation tag for binary and trace requests.
    pub(crate) fn new_tag(&self) -> u32 {
        rand::random()
    }

    /// Fresh cancellation token for internal waits.
    pub(crate) fn cancel_token(&self) -> CancelToken {
        CancelToken::new()
    }
}

/// Turn a `RESP_CODE_ERR` reply into a typed protocol error; pass anything
/// else through.
pub(crate) fn reject_device_error(cmd: CommandCode, sent_body: &[u8], reply: Frame) -> Result<Frame> {
    if reply.code() != Some(ResponseCode::Err.to_u8()) {
        return Ok(reply);
    }

    let status = ErrorStatus::from_err_payload(&reply.payload);
    let message = if status == ErrorStatus::InvalidCommand {
        // The firmware does not know this command. Preserve everything a
        // human needs to compare the call against the firmware revision.
        format!(
            "device does not recognise command {:#04x} (sent payload {}); \
             review the calling pattern against the firmware revision",
            cmd.to_u8(),
            hex::encode(sent_body),
        )
    } else {
        format!("device returned status {status}")
    };

    Err(ClientError::Protocol { command: cmd, status, message })
}

/// Require a specific reply code.
pub(crate) fn expect_code(cmd: CommandCode, reply: Frame, expected: ResponseCode) -> Result<Frame> {
    let got = reply.code().map(ResponseCode::from_u8);
    if got == Some(expected) {
        return Ok(reply);
    }

    Err(ClientError::Protocol {
        command: cmd,
        status: ErrorStatus::UnknownError,
        message: match got {
            Some(code) => format!("expected {expected}, device sent {code}"),
            None => format!("expected {expected}, device sent an empty frame"),
        },
    })
}

/// Current wall-clock time as protocol seconds.
pub(crate) fn unix_now() -> u32 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0)
}
