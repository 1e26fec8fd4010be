//! Protocol code tables.
//!
//! Every frame's first payload byte is a code: a [`CommandCode`] on the
//! host→device direction, a [`ResponseCode`] on the device→host direction.
//! The tables below mirror the companion-radio firmware enumeration and must
//! never be renumbered.
//!
//! Unrecognised bytes map to `Unknown(byte)` rather than failing the parse;
//! a host talking to newer firmware must keep the link usable.

/// Start byte of a host→device frame (`<`).
pub const FRAME_START_HOST: u8 = 0x3C;

/// Start byte of a device→host frame (`>`).
pub const FRAME_START_DEVICE: u8 = 0x3E;

/// Command byte of a host→device frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // names mirror the firmware enumeration
pub enum CommandCode {
    AppStart,
    SendTxtMsg,
    SendChannelTxtMsg,
    ContactListGet,
    GetDeviceTime,
    SetDeviceTime,
    SendSelfAdvert,
    SetAdvertName,
    AddUpdateContact,
    SyncNextMessage,
    SetRadioParams,
    SetRadioTxPower,
    ResetPath,
    SetAdvertLatLon,
    RemoveContact,
    ShareContact,
    ExportContact,
    ImportContact,
    Reboot,
    GetBatteryVoltage,
    SetTuningParams,
    DeviceQuery,
    ExportPrivateKey,
    ImportPrivateKey,
    SendRawData,
    SendLogin,
    SendStatusReq,
    HasConnection,
    Logout,
    GetContactByKey,
    GetChannel,
    SetChannel,
    SignStart,
    SignData,
    SignFinish,
    SendTracePath,
    SetDevicePin,
    SetOtherParams,
    SendTelemetryReq,
    GetCustomVars,
    SetCustomVar,
    SendBinaryReq,
    SendPathDiscoveryReq,
    GetAdvertPath,
    GetBattAndStorage,
    GetStats,
    GetAutoAddConfig,
    SetAutoAddConfig,
    /// A command byte this host does not know about.
    Unknown(u8),
}

impl CommandCode {
    /// The on-wire command byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::AppStart => 1,
            Self::SendTxtMsg => 2,
            Self::SendChannelTxtMsg => 3,
            Self::ContactListGet => 4,
            Self::GetDeviceTime => 5,
            Self::SetDeviceTime => 6,
            Self::SendSelfAdvert => 7,
            Self::SetAdvertName => 8,
            Self::AddUpdateContact => 9,
            Self::SyncNextMessage => 10,
            Self::SetRadioParams => 11,
            Self::SetRadioTxPower => 12,
            Self::ResetPath => 13,
            Self::SetAdvertLatLon => 14,
            Self::RemoveContact => 15,
            Self::ShareContact => 16,
            Self::ExportContact => 17,
            Self::ImportContact => 18,
            Self::Reboot => 19,
            Self::GetBatteryVoltage => 20,
            Self::SetTuningParams => 21,
            Self::DeviceQuery => 22,
            Self::ExportPrivateKey => 23,
            Self::ImportPrivateKey => 24,
            Self::SendRawData => 25,
            Self::SendLogin => 26,
            Self::SendStatusReq => 27,
            Self::HasConnection => 28,
            Self::Logout => 29,
            Self::GetContactByKey => 30,
            Self::GetChannel => 31,
            Self::SetChannel => 32,
            Self::SignStart => 33,
            Self::SignData => 34,
            Self::SignFinish => 35,
            Self::SendTracePath => 36,
            Self::SetDevicePin => 37,
            Self::SetOtherParams => 38,
            Self::SendTelemetryReq => 39,
            Self::GetCustomVars => 40,
            Self::SetCustomVar => 41,
            Self::SendBinaryReq => 42,
            Self::SendPathDiscoveryReq => 43,
            Self::GetAdvertPath => 44,
            Self::GetBattAndStorage => 45,
            Self::GetStats => 46,
            Self::GetAutoAddConfig => 47,
            Self::SetAutoAddConfig => 48,
            Self::Unknown(b) => b,
        }
    }

    /// Decode an on-wire command byte. Never fails.
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            1 => Self::AppStart,
            2 => Self::SendTxtMsg,
            3 => Self::SendChannelTxtMsg,
            4 => Self::ContactListGet,
            5 => Self::GetDeviceTime,
            6 => Self::SetDeviceTime,
            7 => Self::SendSelfAdvert,
            8 => Self::SetAdvertName,
            9 => Self::AddUpdateContact,
            10 => Self::SyncNextMessage,
            11 => Self::SetRadioParams,
            12 => Self::SetRadioTxPower,
            13 => Self::ResetPath,
            14 => Self::SetAdvertLatLon,
            15 => Self::RemoveContact,
            16 => Self::ShareContact,
            17 => Self::ExportContact,
            18 => Self::ImportContact,
            19 => Self::Reboot,
            20 => Self::GetBatteryVoltage,
            21 => Self::SetTuningParams,
            22 => Self::DeviceQuery,
            23 => Self::ExportPrivateKey,
            24 => Self::ImportPrivateKey,
            25 => Self::SendRawData,
            26 => Self::SendLogin,
            27 => Self::SendStatusReq,
            28 => Self::HasConnection,
            29 => Self::Logout,
            30 => Self::GetContactByKey,
            31 => Self::GetChannel,
            32 => Self::SetChannel,
            33 => Self::SignStart,
            34 => Self::SignData,
            35 => Self::SignFinish,
            36 => Self::SendTracePath,
            37 => Self::SetDevicePin,
            38 => Self::SetOtherParams,
            39 => Self::SendTelemetryReq,
            40 => Self::GetCustomVars,
            41 => Self::SetCustomVar,
            42 => Self::SendBinaryReq,
            43 => Self::SendPathDiscoveryReq,
            44 => Self::GetAdvertPath,
            45 => Self::GetBattAndStorage,
            46 => Self::GetStats,
            47 => Self::GetAutoAddConfig,
            48 => Self::SetAutoAddConfig,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for CommandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({:#04x})", self.to_u8())
    }
}

/// Response code of a device→host frame.
///
/// Codes with the high bit set (`0x80..`) are push codes: the device emits
/// them unsolicited or as the delayed second phase of a long-running
/// operation. [`ResponseCode::is_push`] is the routing predicate the
/// correlator uses to keep push traffic away from the pending-request slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // names mirror the firmware enumeration
pub enum ResponseCode {
    Ok,
    Err,
    ContactsStart,
    Contact,
    EndOfContacts,
    SelfInfo,
    Sent,
    ContactMsgRecv,
    ChannelMsgRecv,
    CurrTime,
    NoMoreMessages,
    ExportContact,
    BatteryVoltage,
    DeviceInfo,
    PrivateKey,
    Disabled,
    ContactMsgRecvV3,
    ChannelMsgRecvV3,
    ChannelInfo,
    SignStart,
    Signature,
    CustomVars,
    BattAndStorage,
    Stats,
    AdvertPath,
    AutoAddConfig,
    PushAdvert,
    PushPathUpdated,
    PushSendConfirmed,
    PushMsgWaiting,
    PushRawData,
    PushLoginSuccess,
    PushLoginFail,
    PushStatusResponse,
    PushLogRxData,
    PushTraceData,
    PushNewAdvert,
    PushTelemetryResponse,
    PushBinaryResponse,
    PushPathResponse,
    /// A response code this host does not know about.
    Unknown(u8),
}

impl ResponseCode {
    /// The on-wire response byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Err => 1,
            Self::ContactsStart => 2,
            Self::Contact => 3,
            Self::EndOfContacts => 4,
            Self::SelfInfo => 5,
            Self::Sent => 6,
            Self::ContactMsgRecv => 7,
            Self::ChannelMsgRecv => 8,
            Self::CurrTime => 9,
            Self::NoMoreMessages => 10,
            Self::ExportContact => 11,
            Self::BatteryVoltage => 12,
            Self::DeviceInfo => 13,
            Self::PrivateKey => 14,
            Self::Disabled => 15,
            Self::ContactMsgRecvV3 => 16,
            Self::ChannelMsgRecvV3 => 17,
            Self::ChannelInfo => 18,
            Self::SignStart => 19,
            Self::Signature => 20,
            Self::CustomVars => 21,
            Self::BattAndStorage => 22,
            Self::Stats => 23,
            Self::AdvertPath => 24,
            Self::AutoAddConfig => 25,
            Self::PushAdvert => 0x80,
            Self::PushPathUpdated => 0x81,
            Self::PushSendConfirmed => 0x82,
            Self::PushMsgWaiting => 0x83,
            Self::PushRawData => 0x84,
            Self::PushLoginSuccess => 0x85,
            Self::PushLoginFail => 0x86,
            Self::PushStatusResponse => 0x87,
            Self::PushLogRxData => 0x88,
            Self::PushTraceData => 0x89,
            Self::PushNewAdvert => 0x8A,
            Self::PushTelemetryResponse => 0x8B,
            Self::PushBinaryResponse => 0x8C,
            Self::PushPathResponse => 0x8D,
            Self::Unknown(b) => b,
        }
    }

    /// Decode an on-wire response byte. Never fails.
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0 => Self::Ok,
            1 => Self::Err,
            2 => Self::ContactsStart,
            3 => Self::Contact,
            4 => Self::EndOfContacts,
            5 => Self::SelfInfo,
            6 => Self::Sent,
            7 => Self::ContactMsgRecv,
            8 => Self::ChannelMsgRecv,
            9 => Self::CurrTime,
            10 => Self::NoMoreMessages,
            11 => Self::ExportContact,
            12 => Self::BatteryVoltage,
            13 => Self::DeviceInfo,
            14 => Self::PrivateKey,
            15 => Self::Disabled,
            16 => Self::ContactMsgRecvV3,
            17 => Self::ChannelMsgRecvV3,
            18 => Self::ChannelInfo,
            19 => Self::SignStart,
            20 => Self::Signature,
            21 => Self::CustomVars,
            22 => Self::BattAndStorage,
            23 => Self::Stats,
            24 => Self::AdvertPath,
            25 => Self::AutoAddConfig,
            0x80 => Self::PushAdvert,
            0x81 => Self::PushPathUpdated,
            0x82 => Self::PushSendConfirmed,
            0x83 => Self::PushMsgWaiting,
            0x84 => Self::PushRawData,
            0x85 => Self::PushLoginSuccess,
            0x86 => Self::PushLoginFail,
            0x87 => Self::PushStatusResponse,
            0x88 => Self::PushLogRxData,
            0x89 => Self::PushTraceData,
            0x8A => Self::PushNewAdvert,
            0x8B => Self::PushTelemetryResponse,
            0x8C => Self::PushBinaryResponse,
            0x8D => Self::PushPathResponse,
            other => Self::Unknown(other),
        }
    }

    /// True for push/streaming codes: unsolicited or delayed device events
    /// that must bypass the pending-request slot.
    #[must_use]
    pub fn is_push(self) -> bool {
        self.to_u8() & 0x80 != 0
    }

    /// True for the four incoming-message codes.
    ///
    /// Message frames complete a pending `SyncNextMessage` request, but the
    /// transport also mirrors them to event subscribers so observers never
    /// miss traffic.
    #[must_use]
    pub fn is_message(self) -> bool {
        matches!(
            self,
            Self::ContactMsgRecv | Self::ChannelMsgRecv | Self::ContactMsgRecvV3 | Self::ChannelMsgRecvV3
        )
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({:#04x})", self.to_u8())
    }
}

/// Status byte carried in the payload of a `RESP_CODE_ERR` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// No status byte present, or the device reported no specific cause.
    UnknownError,
    /// The firmware does not implement the command.
    InvalidCommand,
    /// The referenced contact/channel/record does not exist.
    NotFound,
    /// The device-side table has no free slot.
    TableFull,
    /// The device is in a state that cannot service the command.
    DeviceError,
    /// An argument failed device-side validation.
    InvalidParameter,
    /// The mesh operation failed at the network layer.
    NetworkError,
    /// The device-side operation timed out.
    TimeoutError,
    /// A status byte this host does not know about.
    Unknown(u8),
}

impl ErrorStatus {
    /// The on-wire status byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::UnknownError => 0x00,
            Self::InvalidCommand => 0x01,
            Self::NotFound => 0x02,
            Self::TableFull => 0x03,
            Self::DeviceError => 0x04,
            Self::InvalidParameter => 0x05,
            Self::NetworkError => 0x06,
            Self::TimeoutError => 0x07,
            Self::Unknown(b) => b,
        }
    }

    /// Decode an on-wire status byte. Never fails.
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0x00 => Self::UnknownError,
            0x01 => Self::InvalidCommand,
            0x02 => Self::NotFound,
            0x03 => Self::TableFull,
            0x04 => Self::DeviceError,
            0x05 => Self::InvalidParameter,
            0x06 => Self::NetworkError,
            0x07 => Self::TimeoutError,
            other => Self::Unknown(other),
        }
    }

    /// Status of an error frame: byte 1 of the payload, or `UnknownError`
    /// when the device sent a bare error code.
    #[must_use]
    pub fn from_err_payload(payload: &[u8]) -> Self {
        payload.get(1).copied().map_or(Self::UnknownError, Self::from_u8)
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({:#04x})", self.to_u8())
    }
}

/// Request type byte of a `SendBinaryReq` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryReqType {
    /// Remote node status record.
    Status,
    /// Remote telemetry sample.
    Telemetry,
    /// Remote neighbour table.
    Neighbours,
    /// A request type this host does not know about.
    Unknown(u8),
}

impl BinaryReqType {
    /// The on-wire request-type byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Status => 1,
            Self::Telemetry => 2,
            Self::Neighbours => 3,
            Self::Unknown(b) => b,
        }
    }

    /// Decode an on-wire request-type byte. Never fails.
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            1 => Self::Status,
            2 => Self::Telemetry,
            3 => Self::Neighbours,
            other => Self::Unknown(other),
        }
    }
}
