//! Mesh network records: adverts, paths, remote status, neighbours.
//!
//! Hop bytes inside paths are opaque single-byte node identifiers; trace
//! paths additionally interleave SNR annotations, which the host stores
//! without interpretation.

use crate::{
    codes::BinaryReqType,
    error::Result,
    key::PublicKey,
    wire::Reader,
};

/// Body of a `PushAdvert` / `PushNewAdvert` frame: the advertiser's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advertisement {
    /// Public key of the node that advertised.
    pub public_key: PublicKey,
}

impl Advertisement {
    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 32 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("advertisement", body);
        Ok(Self { public_key: PublicKey::new(r.array()?) })
    }
}

/// Body of a `PushPathUpdated` frame: whose out-path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathUpdated {
    /// Public-key prefix of the affected contact.
    pub pubkey_prefix: [u8; 6],
}

impl PathUpdated {
    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 6 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("path_updated", body);
        Ok(Self { pubkey_prefix: r.array()? })
    }
}

/// Body of a `PushSendConfirmed` frame: a delivery confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendConfirmed {
    /// CRC matching the `expected_ack` of the originating send.
    pub ack: u32,
    /// Measured round trip in milliseconds.
    pub round_trip_ms: u32,
}

impl SendConfirmed {
    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 8 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("send_confirmed", body);
        Ok(Self { ack: r.u32()?, round_trip_ms: r.u32()? })
    }
}

/// Body of a `PushLogRxData` frame: a raw receive log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxLogEntry {
    /// Receive SNR in quarter-dB.
    pub snr_scaled: i8,
    /// Receive RSSI in dBm.
    pub rssi: i8,
    /// Raw packet bytes.
    pub raw: Vec<u8>,
}

impl RxLogEntry {
    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 2 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("rx_log", body);
        Ok(Self { snr_scaled: r.i8()?, rssi: r.i8()?, raw: r.rest().to_vec() })
    }
}

/// Body of an `AdvertPath` reply: how this node's last advert travelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertPath {
    /// When the advert was received (Unix seconds).
    pub received_ts: u32,
    /// One byte per hop; empty means it was heard directly.
    pub path: Vec<u8>,
}

impl AdvertPath {
    /// Decode from the reply body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 4 bytes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("advert_path", body);
        Ok(Self { received_ts: r.u32()?, path: r.rest().to_vec() })
    }

    /// Encode as a reply body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.path.len());
        out.extend_from_slice(&self.received_ts.to_le_bytes());
        out.extend_from_slice(&self.path);
        out
    }
}

/// Round-trip path pair produced by path discovery and trace operations.
///
/// Each direction is length-prefixed on the wire; empty means direct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathDiscoveryResult {
    /// Hops from the remote node back to us.
    pub in_path: Vec<u8>,
    /// Hops from us out to the remote node.
    pub out_path: Vec<u8>,
}

impl PathDiscoveryResult {
    /// True when the node is reachable without intermediate hops.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.in_path.is_empty() && self.out_path.is_empty()
    }

    /// Decode `[in_len][in_path][out_len][out_path]` from a reader.
    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let in_len = r.u8()? as usize;
        let in_path = r.take(in_len)?.to_vec();
        let out_len = r.u8()? as usize;
        let out_path = r.take(out_len)?.to_vec();
        Ok(Self { in_path, out_path })
    }

    /// Decode a `PushPathResponse` body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if a length prefix overruns the body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        Self::read(&mut Reader::new("path_response", body))
    }

    /// Encode as a push body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.in_path.len() + self.out_path.len());
        out.push(self.in_path.len() as u8);
        out.extend_from_slice(&self.in_path);
        out.push(self.out_path.len() as u8);
        out.extend_from_slice(&self.out_path);
        out
    }
}

/// Body of a `PushTraceData` frame:
/// `[0 reserved][1..5 tag u32][5.. path pair]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceData {
    /// Tag of the originating `SendTracePath` command.
    pub tag: u32,
    /// Traversed paths, hop bytes SNR-annotated by the firmware.
    pub result: PathDiscoveryResult,
}

impl TraceData {
    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if the header or a path overruns.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("trace_data", body);
        let _reserved = r.u8()?;
        let tag = r.u32()?;
        let result = PathDiscoveryResult::read(&mut r)?;
        Ok(Self { tag, result })
    }

    /// Encode as a push body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8];
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&self.result.encode());
        out
    }
}

/// Request body of `SendTracePath`:
/// `[tag u32][auth_code u32][flags][path…]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePathRequest {
    /// Caller-chosen correlation tag.
    pub tag: u32,
    /// Repeater auth code, zero when unused.
    pub auth_code: u32,
    /// Trace flags.
    pub flags: u8,
    /// Hops to traverse, one byte each.
    pub path: Vec<u8>,
}

impl TracePathRequest {
    /// Encode as a request body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9 + self.path.len());
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&self.auth_code.to_le_bytes());
        out.push(self.flags);
        out.extend_from_slice(&self.path);
        out
    }
}

/// Request body of `SendBinaryReq`:
/// `[tag u32][pubkey_prefix, 6][req_type][params…]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRequest {
    /// Caller-chosen correlation tag, echoed by the response push.
    pub tag: u32,
    /// Target node's public-key prefix.
    pub pubkey_prefix: [u8; 6],
    /// What is being requested.
    pub req_type: BinaryReqType,
    /// Request-type-specific parameters.
    pub params: Vec<u8>,
}

impl BinaryRequest {
    /// Encode as a request body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(11 + self.params.len());
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&self.pubkey_prefix);
        out.push(self.req_type.to_u8());
        out.extend_from_slice(&self.params);
        out
    }
}

/// Body of a `PushBinaryResponse` frame:
/// `[0 reserved][1..5 tag u32][5.. payload]`.
///
/// The payload's shape depends on the originating request; the typed
/// decoder is selected by the caller that owns the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryResponse {
    /// Tag of the originating `SendBinaryReq` command.
    pub tag: u32,
    /// Opaque response payload.
    pub payload: Vec<u8>,
}

impl BinaryResponse {
    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if the 5-byte header is incomplete.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("binary_response", body);
        let _reserved = r.u8()?;
        let tag = r.u32()?;
        Ok(Self { tag, payload: r.rest().to_vec() })
    }

    /// Encode as a push body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8];
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// One entry of a remote node's neighbour table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighbourEntry {
    /// Truncated public key of the neighbour (request-chosen width).
    pub pubkey_prefix: Vec<u8>,
    /// Seconds since the neighbour was last heard.
    pub secs_ago: u16,
    /// Link SNR in quarter-dB.
    pub snr_scaled: i8,
}

impl NeighbourEntry {
    /// Link SNR in dB.
    #[must_use]
    pub fn snr_db(&self) -> f32 {
        f32::from(self.snr_scaled) / 4.0
    }
}

/// Neighbour-table excerpt carried in a binary response
/// (`BinaryReqType::Neighbours`).
///
/// Layout: `[0 results_count][1 neighbours_count]` followed by
/// `results_count` entries of `{prefix, secs_ago u16, snr i8}` where the
/// prefix width was chosen by the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighbourList {
    /// Total neighbours the remote node knows.
    pub neighbours_count: u8,
    /// Entries actually returned.
    pub entries: Vec<NeighbourEntry>,
}

impl NeighbourList {
    /// Request params for a neighbour binary request.
    #[must_use]
    pub fn request_params(prefix_len: u8, max_results: u8) -> [u8; 2] {
        [prefix_len, max_results]
    }

    /// Decode from a binary-response payload.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if an entry overruns the payload.
    pub fn decode(payload: &[u8], prefix_len: usize) -> Result<Self> {
        let mut r = Reader::new("neighbour_list", payload);
        let results_count = r.u8()?;
        let neighbours_count = r.u8()?;

        let mut entries = Vec::with_capacity(usize::from(results_count));
        for _ in 0..results_count {
            entries.push(NeighbourEntry {
                pubkey_prefix: r.take(prefix_len)?.to_vec(),
                secs_ago: r.u16()?,
                snr_scaled: r.i8()?,
            });
        }

        Ok(Self { neighbours_count, entries })
    }

    /// Encode as a binary-response payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.entries.len() as u8, self.neighbours_count];
        for entry in &self.entries {
            out.extend_from_slice(&entry.pubkey_prefix);
            out.extend_from_slice(&entry.secs_ago.to_le_bytes());
            out.push(entry.snr_scaled as u8);
        }
        out
    }
}

/// Body of a `PushStatusResponse` frame:
/// `[0 reserved][1..7 pubkey_prefix, 6][7.. status record, 48 bytes]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    /// Public-key prefix of the responding node.
    pub pubkey_prefix: [u8; 6],
    /// Battery voltage in millivolts.
    pub battery_mv: u16,
    /// Current transmit-queue depth.
    pub tx_queue_len: u16,
    /// Measured noise floor in dBm.
    pub noise_floor_dbm: i16,
    /// RSSI of the most recent receive, in dBm.
    pub last_rssi: i8,
    /// Packets received.
    pub nb_recv: u32,
    /// Packets sent.
    pub nb_sent: u32,
    /// Cumulative airtime in seconds.
    pub airtime_secs: u32,
    /// Uptime in seconds.
    pub uptime_secs: u32,
    /// Flood packets originated.
    pub sent_flood: u32,
    /// Direct packets originated.
    pub sent_direct: u32,
    /// Flood packets received.
    pub recv_flood: u32,
    /// Direct packets received.
    pub recv_direct: u32,
    /// Queue-full events.
    pub full_events: u16,
    /// SNR of the most recent receive, in quarter-dB.
    pub last_snr_scaled: i16,
    /// Duplicate direct packets seen.
    pub direct_dups: u16,
    /// Duplicate flood packets seen.
    pub flood_dups: u16,
}

impl RemoteStatus {
    /// SNR of the most recent receive, in dB.
    #[must_use]
    pub fn last_snr_db(&self) -> f32 {
        f32::from(self.last_snr_scaled) / 4.0
    }

    /// Decode from the push body.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if shorter than the 55-byte layout.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut r = Reader::new("remote_status", body);
        let _reserved = r.u8()?;
        let pubkey_prefix = r.array()?;
        let battery_mv = r.u16()?;
        let tx_queue_len = r.u16()?;
        let noise_floor_dbm = r.i16()?;
        let last_rssi = r.i8()?;
        let _pad = r.u8()?;
        Ok(Self {
            pubkey_prefix,
            battery_mv,
            tx_queue_len,
            noise_floor_dbm,
            last_rssi,
            nb_recv: r.u32()?,
            nb_sent: r.u32()?,
            airtime_secs: r.u32()?,
            uptime_secs: r.u32()?,
            sent_flood: r.u32()?,
            sent_direct: r.u32()?,
            recv_flood: r.u32()?,
            recv_direct: r.u32()?,
            full_events: r.u16()?,
            last_snr_scaled: r.i16()?,
            direct_dups: r.u16()?,
            flood_dups: r.u16()?,
        })
    }

    /// Encode as a push body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8];
        out.extend_from_slice(&self.pubkey_prefix);
        out.extend_from_slice(&self.battery_mv.to_le_bytes());
        out.extend_from_slice(&self.tx_queue_len.to_le_bytes());
        out.extend_from_slice(&self.noise_floor_dbm.to_le_bytes());
        out.push(self.last_rssi as u8);
        out.push(0); // alignment pad before the counter block
        out.extend_from_slice(&self.nb_recv.to_le_bytes());
        out.extend_from_slice(&self.nb_sent.to_le_bytes());
        out.extend_from_slice(&self.airtime_secs.to_le_bytes());
        out.extend_from_slice(&self.uptime_secs.to_le_bytes());
        out.extend_from_slice(&self.sent_flood.to_le_bytes());
        out.extend_from_slice(&self.sent_direct.to_le_bytes());
        out.extend_from_slice(&self.recv_flood.to_le_bytes());
        out.extend_from_slice(&self.recv_direct.to_le_bytes());
        out.extend_from_slice(&self.full_events.to_le_bytes());
        out.extend_from_slice(&self.last_snr_scaled.to_le_bytes());
        out.extend_from_slice(&self.direct_dups.to_le_bytes());
        out.extend_from_slice(&self.flood_dups.to_le_bytes());
        out
    }
}
