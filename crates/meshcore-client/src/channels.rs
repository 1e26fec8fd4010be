//! Channel operations.

use meshcore_proto::{
    CHANNEL_SECRET_LEN, CommandCode, ErrorStatus, ResponseCode, derive_channel_secret,
    records::{CHANNEL_NAME_MAX, ChannelInfo},
};
use tracing::debug;

use crate::{
    client::Client,
    error::{ClientError, Result},
};

/// Frequency synthesised for the default public channel when a device
/// reports none (Hz).
pub const DEFAULT_PUBLIC_FREQ_HZ: u32 = 433_175_000;

/// A channel as the application sees it.
///
/// The wire record carries only `{index, name, secret}`; the frequency is
/// an application-level attribute used for validation and for the
/// synthesised default channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Slot index on the device.
    pub index: u8,
    /// Channel name (≤ 31 bytes UTF-8, non-empty).
    pub name: String,
    /// Channel frequency in Hz; zero when unknown. Hashtag channels may
    /// leave it zero because key derivation covers them.
    pub frequency_hz: u32,
    /// 16-byte secret; all-zero means unencrypted.
    pub secret: [u8; CHANNEL_SECRET_LEN],
}

impl Channel {
    /// True when the name marks this as a hashtag channel.
    #[must_use]
    pub fn is_hashtag(&self) -> bool {
        self.name.starts_with('#')
    }

    /// True when the secret is non-zero.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.secret != [0u8; CHANNEL_SECRET_LEN]
    }

    fn from_info(info: ChannelInfo) -> Self {
        Self { index: info.index, name: info.name, frequency_hz: 0, secret: info.secret }
    }

    fn to_info(&self) -> ChannelInfo {
        ChannelInfo { index: self.index, name: self.name.clone(), secret: self.secret }
    }
}

fn validate_channel(channel: &Channel) -> Result<()> {
    if channel.name.is_empty() {
        return Err(ClientError::InvalidArgument {
            name: "name",
            reason: "channel name must not be empty".to_owned(),
        });
    }
    if channel.name.len() > CHANNEL_NAME_MAX {
        return Err(ClientError::InvalidArgument {
            name: "name",
            reason: format!(
                "channel name is {} bytes, limit is {CHANNEL_NAME_MAX}",
                channel.name.len()
            ),
        });
    }
    if !channel.is_hashtag() && channel.frequency_hz == 0 {
        return Err(ClientError::InvalidArgument {
            name: "frequency",
            reason: "non-hashtag channels require a positive frequency".to_owned(),
        });
    }
    Ok(())
}

impl Client {
    /// Read one channel slot.
    pub async fn get_channel(&self, index: u8) -> Result<Channel> {
        let reply = self
            .command_expecting(CommandCode::GetChannel, &[index], ResponseCode::ChannelInfo)
            .await?;
        Ok(Channel::from_info(ChannelInfo::decode(reply.body())?))
    }

    /// Write one channel slot.
    pub async fn set_channel(&self, channel: &Channel) -> Result<()> {
        validate_channel(channel)?;
        let body = channel.to_info().encode()?;
        self.command_ok(CommandCode::SetChannel, &body).await
    }

    /// Enumerate channels by polling every slot index.
    ///
    /// Missing slots above zero are tolerated silently; a missing slot
    /// zero is an error — every device carries a default channel.
    pub async fn get_channels(&self) -> Result<Vec<Channel>> {
        let mut channels = Vec::new();
        for index in 0..self.config.max_channels {
            match self.get_channel(index).await {
                Ok(channel) => channels.push(channel),
                Err(e) if index > 0 && is_missing_slot(&e) => {
                    debug!(index, "channel slot empty");
                },
                Err(e) => return Err(e),
            }
        }
        Ok(channels)
    }

    /// The default public channel (slot zero).
    ///
    /// A device without one yields a synthesised stand-in rather than an
    /// error, mirroring long-standing client behaviour.
    pub async fn get_public_channel(&self) -> Result<Channel> {
        match self.get_channel(0).await {
            Ok(channel) => Ok(channel),
            Err(e) if is_missing_slot(&e) => Ok(Channel {
                index: 0,
                name: "All".to_owned(),
                frequency_hz: DEFAULT_PUBLIC_FREQ_HZ,
                secret: [0u8; CHANNEL_SECRET_LEN],
            }),
            Err(e) => Err(e),
        }
    }

    /// Find a hashtag channel by name, creating it at the first free slot
    /// (≥ 1) with its derived secret when absent.
    pub async fn ensure_hashtag_channel(&self, name: &str) -> Result<Channel> {
        if !name.starts_with('#') {
            return Err(ClientError::InvalidArgument {
                name: "name",
                reason: "hashtag channel names start with '#'".to_owned(),
            });
        }

        let existing = self.get_channels().await?;
        if let Some(found) = existing.iter().find(|c| c.name == name) {
            return Ok(found.clone());
        }

        let free_index = (1..self.config.max_channels)
            .find(|i| !existing.iter().any(|c| c.index == *i))
            .ok_or_else(|| ClientError::Protocol {
                command: CommandCode::SetChannel,
                status: ErrorStatus::TableFull,
                message: "no free channel slot".to_owned(),
            })?;

        let channel = Channel {
            index: free_index,
            name: name.to_owned(),
            frequency_hz: 0,
            secret: derive_channel_secret(name),
        };
        self.set_channel(&channel).await?;
        debug!(index = free_index, name, "hashtag channel created");
        Ok(channel)
    }
}

/// Device statuses that mean "this slot does not exist".
fn is_missing_slot(error: &ClientError) -> bool {
    matches!(
        error.device_status(),
        Some(ErrorStatus::NotFound | ErrorStatus::InvalidParameter)
    )
}
