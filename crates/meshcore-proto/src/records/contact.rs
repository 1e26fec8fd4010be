//! Contact records.
//!
//! The device's contact table is enumerated as a stream of fixed-layout
//! records. Body layout (147 bytes):
//!
//! ```text
//! [0..32  public_key]   [32 type]        [33 flags]      [34 out_path_len i8]
//! [35..99 out_path, 64] [99..131 adv_name, 32 NUL-padded]
//! [131..135 last_advert u32] [135..139 adv_lat i32] [139..143 adv_lon i32]
//! [143..147 lastmod u32]
//! ```
//!
//! The `AddUpdateContact` request body is the same layout without the
//! trailing `lastmod` cursor. Coordinates are micro-degrees (value =
//! degrees × 1e6).

use crate::{
    error::{ProtocolError, Result},
    key::PublicKey,
    wire::{Reader, put_fixed_str},
};

/// Fixed width of the on-wire out-path field.
pub const OUT_PATH_MAX: usize = 64;

/// Width of the on-wire contact name field (31 chars + NUL).
const NAME_FIELD: usize = 32;

/// What kind of node a contact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactType {
    /// Not yet identified.
    Unknown,
    /// A chat node (companion-app user).
    Chat,
    /// A repeater node.
    Repeater,
    /// A room server.
    RoomServer,
    /// A sensor node.
    Sensor,
    /// A type byte this host does not know about.
    Other(u8),
}

impl ContactType {
    /// The on-wire type byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Chat => 1,
            Self::Repeater => 2,
            Self::RoomServer => 3,
            Self::Sensor => 4,
            Self::Other(b) => b,
        }
    }

    /// Decode an on-wire type byte. Never fails.
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0 => Self::Unknown,
            1 => Self::Chat,
            2 => Self::Repeater,
            3 => Self::RoomServer,
            4 => Self::Sensor,
            other => Self::Other(other),
        }
    }
}

/// Per-contact flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContactFlags(u8);

impl ContactFlags {
    /// Contact is pinned as a favourite.
    pub const FAVOURITE: u8 = 0x01;
    /// Contact publishes base telemetry.
    pub const TELEMETRY_BASE: u8 = 0x02;
    /// Contact publishes location telemetry.
    pub const TELEMETRY_LOCATION: u8 = 0x04;
    /// Contact publishes environment telemetry.
    pub const TELEMETRY_ENVIRONMENT: u8 = 0x08;

    /// Wrap a raw flag byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw flag byte.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// True if the favourite bit is set.
    #[must_use]
    pub fn is_favourite(self) -> bool {
        self.0 & Self::FAVOURITE != 0
    }

    /// Return a copy with the favourite bit set or cleared.
    #[must_use]
    pub fn with_favourite(self, on: bool) -> Self {
        if on { Self(self.0 | Self::FAVOURITE) } else { Self(self.0 & !Self::FAVOURITE) }
    }
}

/// One entry of the device's contact table.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// The contact's full public key.
    pub public_key: PublicKey,
    /// Node kind.
    pub contact_type: ContactType,
    /// Flag bits.
    pub flags: ContactFlags,
    /// Advertised display name (≤ 31 bytes UTF-8).
    pub adv_name: String,
    /// Learned outbound path to the contact. `None` when unknown
    /// (wire `out_path_len = -1`); an empty path means direct reach.
    pub out_path: Option<Vec<u8>>,
    /// When the contact's advert was last heard (Unix seconds).
    pub last_advert: u32,
    /// Advertised latitude in micro-degrees.
    pub adv_lat: i32,
    /// Advertised longitude in micro-degrees.
    pub adv_lon: i32,
    /// Device-side last-modified stamp (Unix seconds); the enumeration
    /// cursor is derived from the maximum of these.
    pub lastmod: u32,
}

impl Contact {
    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        f64::from(self.adv_lat) / 1e6
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        f64::from(self.adv_lon) / 1e6
    }

    /// Decode a contact record body (the payload after the response code).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if the body is shorter than 147 bytes.
    /// - `ProtocolError::Malformed` if `out_path_len` exceeds the field.
    /// - `ProtocolError::InvalidText` if the name is not UTF-8.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("contact", body);

        let public_key = PublicKey::new(r.array()?);
        let contact_type = ContactType::from_u8(r.u8()?);
        let flags = ContactFlags::from_byte(r.u8()?);
        let out_path_len = r.i8()?;
        let out_path_field = r.take(OUT_PATH_MAX)?;
        let adv_name = r.fixed_str(NAME_FIELD, "adv_name")?;
        let last_advert = r.u32()?;
        let adv_lat = r.i32()?;
        let adv_lon = r.i32()?;
        let lastmod = r.u32()?;

        let out_path = if out_path_len < 0 {
            None
        } else {
            let len = out_path_len as usize;
            if len > OUT_PATH_MAX {
                return Err(ProtocolError::Malformed {
                    record: "contact",
                    reason: format!("out_path_len {len} exceeds field width {OUT_PATH_MAX}"),
                });
            }
            Some(out_path_field[..len].to_vec())
        };

        Ok(Self {
            public_key,
            contact_type,
            flags,
            adv_name,
            out_path,
            last_advert,
            adv_lat,
            adv_lon,
            lastmod,
        })
    }

    /// Encode as a full contact record body (147 bytes), `lastmod` included.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.encode_for_update();
        out.extend_from_slice(&self.lastmod.to_le_bytes());
        out
    }

    /// Encode as an `AddUpdateContact` request body (143 bytes, no
    /// `lastmod` — the device stamps it).
    #[must_use]
    pub fn encode_for_update(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(147);
        out.extend_from_slice(self.public_key.as_bytes());
        out.push(self.contact_type.to_u8());
        out.push(self.flags.to_byte());

        match &self.out_path {
            None => {
                out.push(-1i8 as u8);
                out.resize(out.len() + OUT_PATH_MAX, 0);
            },
            Some(path) => {
                let len = path.len().min(OUT_PATH_MAX);
                out.push(len as u8);
                out.extend_from_slice(&path[..len]);
                out.resize(out.len() + (OUT_PATH_MAX - len), 0);
            },
        }

        put_fixed_str(&mut out, &self.adv_name, NAME_FIELD);
        out.extend_from_slice(&self.last_advert.to_le_bytes());
        out.extend_from_slice(&self.adv_lat.to_le_bytes());
        out.extend_from_slice(&self.adv_lon.to_le_bytes());
        out
    }
}

/// Body of a `ContactsStart` reply: how many records will follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactsStart {
    /// Number of contact records the device is about to stream.
    pub count: u32,
}

impl ContactsStart {
    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 4 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("contacts_start", body);
        Ok(Self { count: r.u32()? })
    }
}

/// Body of an `EndOfContacts` reply: the resume cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfContacts {
    /// New `lastmod` cursor to pass to the next enumeration. `None` on
    /// older firmware that ends the stream with an empty body.
    pub lastmod: Option<u32>,
}

impl EndOfContacts {
    /// Decode from the reply body.
    #[must_use]
    pub fn decode(body: &[u8]) -> Self {
        let mut r = Reader::new("end_of_contacts", body);
        Self { lastmod: r.u32().ok() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Contact {
        Contact {
            public_key: PublicKey::new([0x42; 32]),
            contact_type: ContactType::Chat,
            flags: ContactFlags::from_byte(ContactFlags::FAVOURITE),
            adv_name: "Alice".to_owned(),
            out_path: Some(vec![0x11, 0x22, 0x33]),
            last_advert: 1_704_067_200,
            adv_lat: 52_520_000,
            adv_lon: 13_405_000,
            lastmod: 1_704_070_000,
        }
    }

    #[test]
    fn round_trip() {
        let contact = sample();
        let body = contact.encode();
        assert_eq!(body.len(), 147);
        assert_eq!(Contact::decode(&body).unwrap(), contact);
    }

    #[test]
    fn round_trip_unknown_path() {
        let contact = Contact { out_path: None, ..sample() };
        let body = contact.encode();
        assert_eq!(body[34], 0xFF); // -1
        assert_eq!(Contact::decode(&body).unwrap(), contact);
    }

    #[test]
    fn round_trip_direct_path() {
        let contact = Contact { out_path: Some(Vec::new()), ..sample() };
        let decoded = Contact::decode(&contact.encode()).unwrap();
        assert_eq!(decoded.out_path, Some(Vec::new()));
    }

    #[test]
    fn update_body_omits_lastmod() {
        let contact = sample();
        assert_eq!(contact.encode_for_update().len(), 143);
        assert_eq!(&contact.encode()[..143], &contact.encode_for_update()[..]);
    }

    #[test]
    fn short_body_is_truncated_error() {
        let err = Contact::decode(&[0u8; 50]).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { record: "contact", .. }));
    }

    #[test]
    fn bogus_out_path_len_is_malformed() {
        let mut body = sample().encode();
        body[34] = 65; // exceeds the 64-byte field
        assert!(matches!(
            Contact::decode(&body),
            Err(ProtocolError::Malformed { record: "contact", .. })
        ));
    }

    #[test]
    fn coordinates_scale_to_degrees() {
        let contact = sample();
        assert!((contact.latitude() - 52.52).abs() < 1e-6);
        assert!((contact.longitude() - 13.405).abs() < 1e-6);
    }

    #[test]
    fn end_of_contacts_cursor() {
        let end = EndOfContacts::decode(&1_704_070_000u32.to_le_bytes());
        assert_eq!(end.lastmod, Some(1_704_070_000));
        assert_eq!(EndOfContacts::decode(&[]).lastmod, None);
    }

    #[test]
    fn contacts_start_count() {
        assert_eq!(ContactsStart::decode(&7u32.to_le_bytes()).unwrap().count, 7);
        assert!(ContactsStart::decode(&[1]).is_err());
    }
}
