//! Fuzz target for the record decoders.
//!
//! Every decoder must turn arbitrary bytes into a value or a structured
//! error — never a panic, never an over-read.

#![no_main]

use libfuzzer_sys::fuzz_target;
use meshcore_proto::{
    ResponseCode,
    records::{
        AdvertPath, BatteryAndStorage, BinaryResponse, ChannelInfo, Contact, DeviceInfo,
        IncomingMessage, NeighbourList, PathDiscoveryResult, RadioParams, RadioStats,
        RemoteStatus, SelfInfo, TraceData,
    },
};

fuzz_target!(|data: &[u8]| {
    let _ = Contact::decode(data);
    let _ = ChannelInfo::decode(data);
    let _ = DeviceInfo::decode(data);
    let _ = SelfInfo::decode(data);
    let _ = BatteryAndStorage::decode(data);
    let _ = RadioStats::decode(data);
    let _ = RadioParams::decode(data);
    let _ = AdvertPath::decode(data);
    let _ = PathDiscoveryResult::decode(data);
    let _ = TraceData::decode(data);
    let _ = BinaryResponse::decode(data);
    let _ = RemoteStatus::decode(data);
    let _ = NeighbourList::decode(data, 6);

    // Message decoding is code-driven; exercise all four flavours.
    for code in [
        ResponseCode::ContactMsgRecv,
        ResponseCode::ContactMsgRecvV3,
        ResponseCode::ChannelMsgRecv,
        ResponseCode::ChannelMsgRecvV3,
    ] {
        let _ = IncomingMessage::decode(code, data);
    }
});
