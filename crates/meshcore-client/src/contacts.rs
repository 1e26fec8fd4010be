//! Contact operations and the enumeration state machine.
//!
//! Enumeration runs Idle → Requesting → Streaming → Done. The initial
//! `ContactListGet` may answer with a `ContactsStart` preamble or jump
//! straight to the first `Contact` record (older firmware); either way the
//! remaining records are pulled one `SyncNextMessage` at a time. The stream
//! ends on `EndOfContacts` (carrying the next `lastmod` cursor) or
//! `NoMoreMessages`. Unrelated frames arriving mid-stream — queued text
//! messages, mostly — are already mirrored to event subscribers by the
//! transport and simply do not advance the enumeration.

use meshcore_proto::{
    CommandCode, ErrorStatus, PublicKey, ResponseCode,
    records::{AutoAddConfig, Contact, ContactsStart, EndOfContacts},
};
use tracing::debug;

use crate::{
    client::{Client, reject_device_error},
    error::{ClientError, Result},
};

/// Result of one contact enumeration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactBook {
    /// Records received, in device order.
    pub contacts: Vec<Contact>,
    /// Cursor to pass to the next enumeration, when the device sent one.
    pub lastmod: Option<u32>,
}

impl Client {
    /// Enumerate the device's contact table.
    ///
    /// `since` resumes from a previous [`ContactBook::lastmod`] cursor;
    /// `None` fetches everything. A device with nothing to report may
    /// answer the initial request with an error status — that is an empty
    /// table, not a failure.
    pub async fn get_contacts(&self, since: Option<u32>) -> Result<ContactBook> {
        let mut body = Vec::new();
        if let Some(cursor) = since {
            body.extend_from_slice(&cursor.to_le_bytes());
        }

        let reply =
            self.transport.send_command(CommandCode::ContactListGet, &body, &self.options()).await?;

        let mut book = ContactBook::default();
        match reply.code().map(ResponseCode::from_u8) {
            Some(ResponseCode::Err) => {
                let status = ErrorStatus::from_err_payload(&reply.payload);
                if matches!(status, ErrorStatus::InvalidParameter | ErrorStatus::NotFound) {
                    // Nothing to enumerate.
                    return Ok(book);
                }
                return reject_device_error(CommandCode::ContactListGet, &body, reply)
                    .map(|_| book);
            },
            Some(ResponseCode::ContactsStart) => {
                let start = ContactsStart::decode(reply.body())?;
                debug!(count = start.count, "contact stream starting");
            },
            Some(ResponseCode::Contact) => {
                book.contacts.push(Contact::decode(reply.body())?);
            },
            Some(ResponseCode::EndOfContacts) => {
                book.lastmod = EndOfContacts::decode(reply.body()).lastmod;
                return Ok(book);
            },
            Some(ResponseCode::NoMoreMessages) => return Ok(book),
            other => {
                return Err(ClientError::Protocol {
                    command: CommandCode::ContactListGet,
                    status: ErrorStatus::UnknownError,
                    message: format!("unexpected reply {other:?} to contact enumeration"),
                });
            },
        }

        // Streaming: pull records until the device signals the end.
        loop {
            let reply = self.command(CommandCode::SyncNextMessage, &[]).await?;
            match reply.code().map(ResponseCode::from_u8) {
                Some(ResponseCode::Contact) => {
                    book.contacts.push(Contact::decode(reply.body())?);
                },
                Some(ResponseCode::EndOfContacts) => {
                    book.lastmod = EndOfContacts::decode(reply.body()).lastmod;
                    return Ok(book);
                },
                Some(ResponseCode::NoMoreMessages) => return Ok(book),
                other => {
                    // Queued messages or other unrelated replies; the
                    // transport already mirrored anything interesting to
                    // subscribers. Keep pulling.
                    debug!(?other, "unrelated frame during contact stream");
                },
            }
        }
    }

    /// Fetch a single contact by its full public key.
    pub async fn get_contact_by_key(&self, key: &PublicKey) -> Result<Contact> {
        let reply = self
            .command_expecting(
                CommandCode::GetContactByKey,
                key.as_bytes(),
                ResponseCode::Contact,
            )
            .await?;
        Ok(Contact::decode(reply.body())?)
    }

    /// Add a new contact or update an existing one (matched by key).
    pub async fn add_update_contact(&self, contact: &Contact) -> Result<()> {
        self.command_ok(CommandCode::AddUpdateContact, &contact.encode_for_update()).await
    }

    /// Remove a contact by its full public key.
    pub async fn remove_contact(&self, key: &PublicKey) -> Result<()> {
        self.command_ok(CommandCode::RemoveContact, key.as_bytes()).await
    }

    /// Forget the learned out-path to a contact; the next exchange floods.
    pub async fn reset_path(&self, key: &PublicKey) -> Result<()> {
        self.command_ok(CommandCode::ResetPath, key.as_bytes()).await
    }

    /// Read the contact auto-add configuration.
    pub async fn get_autoadd_config(&self) -> Result<AutoAddConfig> {
        let reply = self
            .command_expecting(
                CommandCode::GetAutoAddConfig,
                &[],
                ResponseCode::AutoAddConfig,
            )
            .await?;
        Ok(AutoAddConfig::decode(reply.body())?)
    }

    /// Write the contact auto-add configuration.
    pub async fn set_autoadd_config(&self, config: AutoAddConfig) -> Result<()> {
        self.command_ok(CommandCode::SetAutoAddConfig, &[config.flags]).await
    }

    /// Toggle automatic contact creation, preserving unrelated flags.
    pub async fn set_auto_add_enabled(&self, enabled: bool) -> Result<()> {
        let current = self.get_autoadd_config().await?;
        self.set_autoadd_config(current.with_auto_add(enabled)).await
    }
}
