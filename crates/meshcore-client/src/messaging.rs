//! Messaging operations: direct text, channel text, queue sync, remote CLI.

use meshcore_core::Event;
use meshcore_proto::{
    CommandCode, ErrorStatus, ProtocolError, PublicKey, ResponseCode,
    records::{
        ContactMessage, IncomingMessage, OutgoingChannelMessage, OutgoingContactMessage, SentAck,
        TextKind,
    },
};

use crate::{
    client::{Client, unix_now},
    error::{ClientError, Result},
};

/// Second-phase multiplier for a remote CLI command: text replies ride the
/// normal message path and routinely exceed the device's estimate.
const REMOTE_COMMAND_TIMEOUT_FACTOR: f64 = 1.6;

fn validate_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(ClientError::InvalidArgument {
            name: "text",
            reason: "message text must not be empty".to_owned(),
        });
    }
    if text.contains('\0') {
        return Err(ClientError::InvalidArgument {
            name: "text",
            reason: "message text must not contain NUL".to_owned(),
        });
    }
    Ok(())
}

impl Client {
    /// Send a plain text message to a contact. Returns the queue ack with
    /// the expected delivery CRC.
    pub async fn send_message(&self, to: &PublicKey, text: &str) -> Result<SentAck> {
        self.send_text(to, TextKind::Plain, 0, text).await
    }

    /// Send a text message with explicit kind and attempt counter.
    pub async fn send_text(
        &self,
        to: &PublicKey,
        kind: TextKind,
        attempt: u8,
        text: &str,
    ) -> Result<SentAck> {
        validate_text(text)?;

        let msg = OutgoingContactMessage {
            kind,
            attempt,
            timestamp: unix_now(),
            pubkey_prefix: to.prefix(),
            text: text.to_owned(),
        };
        let reply = self
            .command_expecting(CommandCode::SendTxtMsg, &msg.encode(), ResponseCode::Sent)
            .await?;
        Ok(SentAck::decode(reply.body())?)
    }

    /// Send a text message to a channel slot.
    pub async fn send_channel_message(&self, channel_idx: u8, text: &str) -> Result<()> {
        validate_text(text)?;

        let msg = OutgoingChannelMessage {
            kind: TextKind::Plain,
            channel_idx,
            timestamp: unix_now(),
            text: text.to_owned(),
        };
        self.command_ok(CommandCode::SendChannelTxtMsg, &msg.encode()).await
    }

    /// Pull the next queued message off the device.
    ///
    /// `None` means the queue is empty. Applications typically call this in
    /// a loop after a `MessagesWaiting` event; the client does not own a
    /// periodic poller.
    pub async fn sync_next_message(&self) -> Result<Option<IncomingMessage>> {
        let reply = self.command(CommandCode::SyncNextMessage, &[]).await?;
        let code = reply.code().map(ResponseCode::from_u8);

        match code {
            Some(ResponseCode::NoMoreMessages) => Ok(None),
            Some(code) if code.is_message() => {
                match IncomingMessage::decode(code, reply.body()) {
                    Some(msg) => Ok(Some(msg)),
                    None => Err(ProtocolError::Malformed {
                        record: "message",
                        reason: format!(
                            "{code} frame too short at {} bytes",
                            reply.payload.len()
                        ),
                    }
                    .into()),
                }
            },
            other => Err(ClientError::Protocol {
                command: CommandCode::SyncNextMessage,
                status: ErrorStatus::UnknownError,
                message: format!("unexpected reply {other:?} to message sync"),
            }),
        }
    }

    /// Drain the device's offline message queue.
    pub async fn sync_all_messages(&self) -> Result<Vec<IncomingMessage>> {
        let mut messages = Vec::new();
        while let Some(msg) = self.sync_next_message().await? {
            messages.push(msg);
        }
        Ok(messages)
    }

    /// Run a CLI command on a remote node via a `CliCommand` text message
    /// and await its text reply (two-phase).
    pub async fn send_remote_command(
        &self,
        to: &PublicKey,
        command: &str,
    ) -> Result<ContactMessage> {
        validate_text(command)?;

        // Subscribe before sending so a fast reply cannot be missed.
        let events = self.transport.subscribe();

        let msg = OutgoingContactMessage {
            kind: TextKind::CliCommand,
            attempt: 0,
            timestamp: unix_now(),
            pubkey_prefix: to.prefix(),
            text: command.to_owned(),
        };
        let (_ack, deadline) = self
            .command_sent(CommandCode::SendTxtMsg, &msg.encode(), REMOTE_COMMAND_TIMEOUT_FACTOR)
            .await?;

        let prefix = to.prefix();
        self.await_event(events, deadline, move |event| match event {
            Event::MessageReceived(IncomingMessage::Contact(reply))
                if reply.pubkey_prefix == prefix =>
            {
                Some(reply.clone())
            },
            _ => None,
        })
        .await
    }
}
