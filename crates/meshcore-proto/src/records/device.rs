//! Device-local records: identity, capabilities, power, radio.

use crate::{
    error::{ProtocolError, Result},
    key::PublicKey,
    wire::Reader,
};

/// Body of a `SelfInfo` reply (the `AppStart` response).
///
/// Layout: `[0 adv_type][1 tx_power][2 max_tx_power][3..35 public_key]
/// [35..39 adv_lat i32][39..43 adv_lon i32][43..46 reserved]
/// [46 manual_add][47..51 radio_freq_khz u32][51..55 radio_bw_khz u32]
/// [55 sf][56 cr][57.. name]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfInfo {
    /// Advert type byte of this node.
    pub adv_type: u8,
    /// Current TX power in dBm.
    pub tx_power_dbm: u8,
    /// Maximum TX power the hardware supports, in dBm.
    pub max_tx_power_dbm: u8,
    /// This node's public key.
    pub public_key: PublicKey,
    /// Advertised latitude in micro-degrees.
    pub adv_lat: i32,
    /// Advertised longitude in micro-degrees.
    pub adv_lon: i32,
    /// When set, the node only adds contacts manually (auto-add off).
    pub manual_add_contacts: bool,
    /// Radio centre frequency: `round(MHz × 1000)`.
    pub radio_freq_khz: u32,
    /// Radio bandwidth: `round(kHz × 1000)`.
    pub radio_bw_khz: u32,
    /// LoRa spreading factor.
    pub spreading_factor: u8,
    /// LoRa coding rate denominator.
    pub coding_rate: u8,
    /// Node display name.
    pub name: String,
}

impl SelfInfo {
    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if the fixed fields are incomplete.
    /// - `ProtocolError::InvalidText` if the name is not UTF-8.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("self_info", body);
        let adv_type = r.u8()?;
        let tx_power_dbm = r.u8()?;
        let max_tx_power_dbm = r.u8()?;
        let public_key = PublicKey::new(r.array()?);
        let adv_lat = r.i32()?;
        let adv_lon = r.i32()?;
        let _reserved = r.take(3)?;
        let manual_add_contacts = r.u8()? != 0;
        let radio_freq_khz = r.u32()?;
        let radio_bw_khz = r.u32()?;
        let spreading_factor = r.u8()?;
        let coding_rate = r.u8()?;
        let name = r.rest_str("name")?;

        Ok(Self {
            adv_type,
            tx_power_dbm,
            max_tx_power_dbm,
            public_key,
            adv_lat,
            adv_lon,
            manual_add_contacts,
            radio_freq_khz,
            radio_bw_khz,
            spreading_factor,
            coding_rate,
            name,
        })
    }

    /// Encode as a reply body (device side of the codec; used by tests and
    /// simulators).
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(57 + self.name.len());
        out.push(self.adv_type);
        out.push(self.tx_power_dbm);
        out.push(self.max_tx_power_dbm);
        out.extend_from_slice(self.public_key.as_bytes());
        out.extend_from_slice(&self.adv_lat.to_le_bytes());
        out.extend_from_slice(&self.adv_lon.to_le_bytes());
        out.extend_from_slice(&[0u8; 3]);
        out.push(u8::from(self.manual_add_contacts));
        out.extend_from_slice(&self.radio_freq_khz.to_le_bytes());
        out.extend_from_slice(&self.radio_bw_khz.to_le_bytes());
        out.push(self.spreading_factor);
        out.push(self.coding_rate);
        out.extend_from_slice(self.name.as_bytes());
        out
    }
}

/// Body of a `DeviceInfo` reply (the `DeviceQuery` response).
///
/// Layout: `[0 firmware_ver_code][1 max_contacts / 2][2 max_group_channels]
/// [3..7 ble_pin u32][7..19 firmware_build_date, 12]
/// [19..59 manufacturer_model, 40][59..79 firmware_version, 20]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Firmware protocol version code.
    pub firmware_ver_code: u8,
    /// Contact-table capacity (wire carries half this value).
    pub max_contacts: u16,
    /// Group-channel capacity.
    pub max_group_channels: u8,
    /// BLE pairing PIN.
    pub ble_pin: u32,
    /// Firmware build date, e.g. `19 Dec 2024`.
    pub firmware_build_date: String,
    /// Manufacturer and board model string.
    pub manufacturer_model: String,
    /// Firmware version string.
    pub firmware_version: String,
}

impl DeviceInfo {
    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if shorter than 79 bytes.
    /// - `ProtocolError::InvalidText` if a string field is not UTF-8.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("device_info", body);
        Ok(Self {
            firmware_ver_code: r.u8()?,
            max_contacts: u16::from(r.u8()?) * 2,
            max_group_channels: r.u8()?,
            ble_pin: r.u32()?,
            firmware_build_date: r.fixed_str(12, "firmware_build_date")?,
            manufacturer_model: r.fixed_str(40, "manufacturer_model")?,
            firmware_version: r.fixed_str(20, "firmware_version")?,
        })
    }

    /// Encode as a reply body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(79);
        out.push(self.firmware_ver_code);
        out.push((self.max_contacts / 2) as u8);
        out.push(self.max_group_channels);
        out.extend_from_slice(&self.ble_pin.to_le_bytes());
        crate::wire::put_fixed_str(&mut out, &self.firmware_build_date, 12);
        crate::wire::put_fixed_str(&mut out, &self.manufacturer_model, 40);
        crate::wire::put_fixed_str(&mut out, &self.firmware_version, 20);
        out
    }
}

/// Body of a `BattAndStorage` reply:
/// `[0..2 battery_mv u16][2..6 used_kb u32][6..10 total_kb u32]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryAndStorage {
    /// Battery voltage in millivolts.
    pub battery_mv: u16,
    /// Used filesystem space in KiB.
    pub used_kb: u32,
    /// Total filesystem space in KiB.
    pub total_kb: u32,
}

impl BatteryAndStorage {
    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 10 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("batt_and_storage", body);
        Ok(Self { battery_mv: r.u16()?, used_kb: r.u32()?, total_kb: r.u32()? })
    }

    /// Encode as a reply body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10);
        out.extend_from_slice(&self.battery_mv.to_le_bytes());
        out.extend_from_slice(&self.used_kb.to_le_bytes());
        out.extend_from_slice(&self.total_kb.to_le_bytes());
        out
    }
}

/// Radio statistics record type byte carried in `GetStats` requests and
/// `Stats` replies.
const STATS_TYPE_RADIO: u8 = 0x01;

/// Body of a `Stats` reply (13 bytes after the response code):
/// `[0 stats_type = 0x01][1..3 noise_floor i16][3 last_rssi i8]
/// [4 last_snr_scaled i8][5..9 tx_air_secs u32][9..13 rx_air_secs u32]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioStats {
    /// Measured noise floor in dBm.
    pub noise_floor_dbm: i16,
    /// RSSI of the most recent receive, in dBm.
    pub last_rssi: i8,
    /// SNR of the most recent receive, in quarter-dB.
    pub last_snr_scaled: i8,
    /// Cumulative transmit airtime in seconds.
    pub tx_air_secs: u32,
    /// Cumulative receive airtime in seconds.
    pub rx_air_secs: u32,
}

impl RadioStats {
    /// SNR of the most recent receive, in dB.
    #[must_use]
    pub fn last_snr_db(&self) -> f32 {
        f32::from(self.last_snr_scaled) / 4.0
    }

    /// Request body for `GetStats`.
    #[must_use]
    pub fn request_body() -> [u8; 1] {
        [STATS_TYPE_RADIO]
    }

    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 13 bytes.
    /// - `ProtocolError::Malformed` if the stats type is not radio stats.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("radio_stats", body);
        let stats_type = r.u8()?;
        if stats_type != STATS_TYPE_RADIO {
            return Err(ProtocolError::Malformed {
                record: "radio_stats",
                reason: format!("unexpected stats type {stats_type:#04x}"),
            });
        }
        Ok(Self {
            noise_floor_dbm: r.i16()?,
            last_rssi: r.i8()?,
            last_snr_scaled: r.i8()?,
            tx_air_secs: r.u32()?,
            rx_air_secs: r.u32()?,
        })
    }

    /// Encode as a reply body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(13);
        out.push(STATS_TYPE_RADIO);
        out.extend_from_slice(&self.noise_floor_dbm.to_le_bytes());
        out.push(self.last_rssi as u8);
        out.push(self.last_snr_scaled as u8);
        out.extend_from_slice(&self.tx_air_secs.to_le_bytes());
        out.extend_from_slice(&self.rx_air_secs.to_le_bytes());
        out
    }
}

/// Request body of `SetRadioParams`:
/// `[freq_khz u32][bw_khz u32][sf][cr]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioParams {
    /// Centre frequency: `round(MHz × 1000)`.
    pub freq_khz: u32,
    /// Bandwidth: `round(kHz × 1000)`.
    pub bw_khz: u32,
    /// Spreading factor, 6..=12.
    pub spreading_factor: u8,
    /// Coding rate denominator, 5..=8.
    pub coding_rate: u8,
}

impl RadioParams {
    /// Build from natural units, rounding the way the wire expects.
    #[must_use]
    pub fn from_natural(freq_mhz: f64, bw_khz: f64, sf: u8, cr: u8) -> Self {
        Self {
            freq_khz: (freq_mhz * 1000.0).round() as u32,
            bw_khz: (bw_khz * 1000.0).round() as u32,
            spreading_factor: sf,
            coding_rate: cr,
        }
    }

    /// Encode as a request body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10);
        out.extend_from_slice(&self.freq_khz.to_le_bytes());
        out.extend_from_slice(&self.bw_khz.to_le_bytes());
        out.push(self.spreading_factor);
        out.push(self.coding_rate);
        out
    }

    /// Decode from a request body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 10 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("radio_params", body);
        Ok(Self {
            freq_khz: r.u32()?,
            bw_khz: r.u32()?,
            spreading_factor: r.u8()?,
            coding_rate: r.u8()?,
        })
    }
}

/// Body of an `AutoAddConfig` reply: `[0 flags]`.
///
/// Bit 0 set means auto-add is disabled (contacts are added manually).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoAddConfig {
    /// Raw flag byte.
    pub flags: u8,
}

impl AutoAddConfig {
    const MANUAL_ADD: u8 = 0x01;

    /// True when the device adds heard contacts automatically.
    #[must_use]
    pub fn auto_add_enabled(self) -> bool {
        self.flags & Self::MANUAL_ADD == 0
    }

    /// Config with auto-add switched on or off, other bits preserved.
    #[must_use]
    pub fn with_auto_add(self, enabled: bool) -> Self {
        let flags = if enabled {
            self.flags & !Self::MANUAL_ADD
        } else {
            self.flags | Self::MANUAL_ADD
        };
        Self { flags }
    }

    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if empty.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("autoadd_config", body);
        Ok(Self { flags: r.u8()? })
    }
}
