//! Device operations: session start, identity, time, power, radio.

use meshcore_proto::{
    CommandCode, ResponseCode,
    records::{BatteryAndStorage, DeviceInfo, RadioParams, RadioStats, SelfInfo},
};

use crate::{
    client::Client,
    error::{ClientError, Result},
};

/// Companion protocol version sent in the `AppStart` preamble.
const APP_PROTOCOL_VERSION: u8 = 1;

impl Client {
    /// Start the companion session and fetch the node's self description.
    ///
    /// Firmware expects this once per connection before other traffic.
    pub async fn app_start(&self, app_name: &str) -> Result<SelfInfo> {
        let mut body = vec![APP_PROTOCOL_VERSION];
        body.extend_from_slice(&[0u8; 6]);
        body.extend_from_slice(app_name.as_bytes());

        let reply =
            self.command_expecting(CommandCode::AppStart, &body, ResponseCode::SelfInfo).await?;
        Ok(SelfInfo::decode(reply.body())?)
    }

    /// Query static device capabilities.
    ///
    /// `app_target_ver` tells the firmware which reply layout generation
    /// the host understands.
    pub async fn device_query(&self, app_target_ver: u8) -> Result<DeviceInfo> {
        let reply = self
            .command_expecting(
                CommandCode::DeviceQuery,
                &[app_target_ver],
                ResponseCode::DeviceInfo,
            )
            .await?;
        Ok(DeviceInfo::decode(reply.body())?)
    }

    /// Read the device clock (Unix seconds).
    pub async fn get_device_time(&self) -> Result<u32> {
        let reply = self
            .command_expecting(CommandCode::GetDeviceTime, &[], ResponseCode::CurrTime)
            .await?;
        let body = reply.body();
        let bytes: [u8; 4] = body.get(..4).and_then(|b| b.try_into().ok()).ok_or(
            meshcore_proto::ProtocolError::Truncated {
                record: "curr_time",
                expected: 4,
                actual: body.len(),
            },
        )?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Set the device clock (Unix seconds).
    pub async fn set_device_time(&self, epoch_secs: u32) -> Result<()> {
        self.command_ok(CommandCode::SetDeviceTime, &epoch_secs.to_le_bytes()).await
    }

    /// Reboot the node. The device acknowledges before restarting; the
    /// link will drop shortly after.
    pub async fn reboot(&self) -> Result<()> {
        self.command_ok(CommandCode::Reboot, &[]).await
    }

    /// Read the battery voltage in millivolts.
    pub async fn get_battery_voltage(&self) -> Result<u16> {
        let reply = self
            .command_expecting(
                CommandCode::GetBatteryVoltage,
                &[],
                ResponseCode::BatteryVoltage,
            )
            .await?;
        let body = reply.body();
        let bytes: [u8; 2] = body.get(..2).and_then(|b| b.try_into().ok()).ok_or(
            meshcore_proto::ProtocolError::Truncated {
                record: "battery_voltage",
                expected: 2,
                actual: body.len(),
            },
        )?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Read battery voltage and filesystem usage in one round trip.
    pub async fn get_battery_and_storage(&self) -> Result<BatteryAndStorage> {
        let reply = self
            .command_expecting(
                CommandCode::GetBattAndStorage,
                &[],
                ResponseCode::BattAndStorage,
            )
            .await?;
        Ok(BatteryAndStorage::decode(reply.body())?)
    }

    /// Read cumulative radio statistics.
    pub async fn get_radio_stats(&self) -> Result<RadioStats> {
        let reply = self
            .command_expecting(
                CommandCode::GetStats,
                &RadioStats::request_body(),
                ResponseCode::Stats,
            )
            .await?;
        Ok(RadioStats::decode(reply.body())?)
    }

    /// Reconfigure the radio. Validates ranges before touching the wire:
    /// `freq > 0`, `bw > 0`, `sf ∈ 6..=12`, `cr ∈ 5..=8`.
    pub async fn set_radio_params(&self, params: &RadioParams) -> Result<()> {
        if params.freq_khz == 0 {
            return Err(ClientError::InvalidArgument {
                name: "freq",
                reason: "frequency must be positive".to_owned(),
            });
        }
        if params.bw_khz == 0 {
            return Err(ClientError::InvalidArgument {
                name: "bw",
                reason: "bandwidth must be positive".to_owned(),
            });
        }
        if !(6..=12).contains(&params.spreading_factor) {
            return Err(ClientError::InvalidArgument {
                name: "sf",
                reason: format!("spreading factor {} outside 6..=12", params.spreading_factor),
            });
        }
        if !(5..=8).contains(&params.coding_rate) {
            return Err(ClientError::InvalidArgument {
                name: "cr",
                reason: format!("coding rate {} outside 5..=8", params.coding_rate),
            });
        }

        self.command_ok(CommandCode::SetRadioParams, &params.encode()).await
    }

    /// Set the radio transmit power in dBm.
    pub async fn set_tx_power(&self, dbm: u8) -> Result<()> {
        self.command_ok(CommandCode::SetRadioTxPower, &[dbm]).await
    }
}
