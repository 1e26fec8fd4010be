//! Mesh network operations: adverts, path discovery, traces, remote
//! status, neighbour tables.
//!
//! The long-latency operations here are two-phase: the device acks with
//! `Sent` and a suggested timeout, and the real result arrives later as a
//! push frame. Trace and binary requests are matched back by tag; status
//! responses by public-key prefix; path responses are unkeyed.

use meshcore_core::Event;
use meshcore_proto::{
    BinaryReqType, CommandCode, PublicKey, ResponseCode,
    records::{
        AdvertPath, BinaryRequest, BinaryResponse, NeighbourList, PathDiscoveryResult,
        RemoteStatus, TraceData, TracePathRequest,
    },
};

use crate::{
    client::Client,
    error::{ClientError, Result},
};

/// Second-phase multiplier for path discovery.
const PATH_DISCOVERY_TIMEOUT_FACTOR: f64 = 1.2;
/// Second-phase multiplier for a single-hop trace.
const TRACE_TIMEOUT_FACTOR: f64 = 1.2;
/// Second-phase multiplier for a remote status request.
const STATUS_TIMEOUT_FACTOR: f64 = 1.2;
/// Second-phase multiplier for a neighbour-table request.
const NEIGHBOURS_TIMEOUT_FACTOR: f64 = 1.2;

/// Advert name limit in UTF-8 bytes.
const ADVERT_NAME_MAX: usize = 31;

impl Client {
    /// Broadcast a self-advertisement. `flood` propagates across the mesh;
    /// otherwise the advert is zero-hop.
    pub async fn send_advert(&self, flood: bool) -> Result<()> {
        self.command_ok(CommandCode::SendSelfAdvert, &[u8::from(flood)]).await
    }

    /// How this node's most recent advert travelled.
    pub async fn get_advert_path(&self) -> Result<AdvertPath> {
        let reply = self
            .command_expecting(CommandCode::GetAdvertPath, &[], ResponseCode::AdvertPath)
            .await?;
        Ok(AdvertPath::decode(reply.body())?)
    }

    /// Set the advertised node name (≤ 31 bytes UTF-8, non-empty).
    pub async fn set_advert_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ClientError::InvalidArgument {
                name: "name",
                reason: "node name must not be empty".to_owned(),
            });
        }
        if name.len() > ADVERT_NAME_MAX {
            return Err(ClientError::InvalidArgument {
                name: "name",
                reason: format!("node name is {} bytes, limit is {ADVERT_NAME_MAX}", name.len()),
            });
        }
        self.command_ok(CommandCode::SetAdvertName, name.as_bytes()).await
    }

    /// Set the advertised position in micro-degrees.
    pub async fn set_advert_latlon(&self, lat: i32, lon: i32) -> Result<()> {
        let mut body = Vec::with_capacity(8);
        body.extend_from_slice(&lat.to_le_bytes());
        body.extend_from_slice(&lon.to_le_bytes());
        self.command_ok(CommandCode::SetAdvertLatLon, &body).await
    }

    /// Discover the round-trip path to a node (two-phase).
    pub async fn discover_path(&self, key: &PublicKey) -> Result<PathDiscoveryResult> {
        let events = self.transport.subscribe();

        let mut body = vec![0u8]; // flags
        body.extend_from_slice(key.as_bytes());
        let (_ack, deadline) = self
            .command_sent(
                CommandCode::SendPathDiscoveryReq,
                &body,
                PATH_DISCOVERY_TIMEOUT_FACTOR,
            )
            .await?;

        self.await_event(events, deadline, |event| match event {
            Event::PathResponse(result) => Some(result.clone()),
            _ => None,
        })
        .await
    }

    /// Trace a specific path hop by hop (two-phase, tag-matched).
    ///
    /// `auth_code` authenticates against repeaters that require it; zero
    /// when unused.
    pub async fn trace_path(&self, path: &[u8], auth_code: u32) -> Result<TraceData> {
        let tag = self.new_tag();
        let waiter = self.transport.watch_tagged(ResponseCode::PushTraceData, tag);

        let req =
            TracePathRequest { tag, auth_code, flags: 0, path: path.to_vec() };
        let (_ack, deadline) = self
            .command_sent(CommandCode::SendTracePath, &req.encode(), TRACE_TIMEOUT_FACTOR)
            .await?;

        let frame = waiter.wait(deadline, &self.cancel_token()).await?;
        Ok(TraceData::decode(frame.body())?)
    }

    /// Ask a remote node for its status record (two-phase, matched by
    /// public-key prefix).
    pub async fn request_status(&self, key: &PublicKey) -> Result<RemoteStatus> {
        let events = self.transport.subscribe();

        let (_ack, deadline) = self
            .command_sent(CommandCode::SendStatusReq, key.as_bytes(), STATUS_TIMEOUT_FACTOR)
            .await?;

        let prefix = key.prefix();
        self.await_event(events, deadline, move |event| match event {
            Event::StatusResponse(status) if status.pubkey_prefix == prefix => {
                Some(status.clone())
            },
            _ => None,
        })
        .await
    }

    /// Ask a remote node for its neighbour table (two-phase, tag-matched
    /// binary request).
    ///
    /// `prefix_len` chooses the key-prefix width of returned entries;
    /// `max_results` bounds the excerpt.
    pub async fn request_neighbours(
        &self,
        key: &PublicKey,
        prefix_len: u8,
        max_results: u8,
    ) -> Result<NeighbourList> {
        let tag = self.new_tag();
        let waiter = self.transport.watch_tagged(ResponseCode::PushBinaryResponse, tag);

        let req = BinaryRequest {
            tag,
            pubkey_prefix: key.prefix(),
            req_type: BinaryReqType::Neighbours,
            params: NeighbourList::request_params(prefix_len, max_results).to_vec(),
        };
        let (_ack, deadline) = self
            .command_sent(CommandCode::SendBinaryReq, &req.encode(), NEIGHBOURS_TIMEOUT_FACTOR)
            .await?;

        let frame = waiter.wait(deadline, &self.cancel_token()).await?;
        let response = BinaryResponse::decode(frame.body())?;
        Ok(NeighbourList::decode(&response.payload, usize::from(prefix_len))?)
    }
}
