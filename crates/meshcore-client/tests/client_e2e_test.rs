//! End-to-end tests: a real `Client` over a real `Transport` against the
//! scripted harness device.
//!
//! The concrete byte scenarios (device-info round trip, set-time encoding,
//! default public channel, hashtag derivation, two-phase path discovery,
//! empty contact enumeration) live here alongside broader operation
//! coverage.

use std::sync::{Arc, Mutex};

use meshcore_client::{Channel, Client, ClientConfig, ClientError, DEFAULT_PUBLIC_FREQ_HZ};
use meshcore_core::{Event, Transport};
use meshcore_harness::{SimDevice, payload};
use meshcore_proto::{
    CommandCode, ErrorStatus, PUBLIC_CHANNEL_SECRET, PublicKey, ResponseCode,
    derive_channel_secret,
    records::{
        BatteryAndStorage, BinaryResponse, ChannelInfo, Contact, ContactFlags, ContactType,
        DeviceInfo, IncomingMessage, NeighbourEntry, NeighbourList, OutgoingContactMessage,
        PathDiscoveryResult, RadioParams, RadioStats, RemoteStatus, SelfInfo, TextKind,
        TraceData,
    },
};

/// Spawn a scripted device and a connected client over it.
async fn client_with<H>(handler: H) -> (SimDevice, Client)
where
    H: FnMut(CommandCode, &[u8]) -> Vec<Vec<u8>> + Send + 'static,
{
    let (device, connector) = SimDevice::spawn(handler);
    let transport = Transport::new(connector);
    transport.connect().await.unwrap();
    (device, Client::new(transport))
}

/// A `Sent` ack payload with the given suggested timeout.
fn sent_ack(suggested_ms: u32) -> Vec<u8> {
    let mut body = vec![0u8];
    body.extend_from_slice(&0xA1B2_C3D4u32.to_le_bytes());
    body.extend_from_slice(&suggested_ms.to_le_bytes());
    payload(ResponseCode::Sent, &body)
}

fn sample_device_info() -> DeviceInfo {
    DeviceInfo {
        firmware_ver_code: 3,
        max_contacts: 200,
        max_group_channels: 8,
        ble_pin: 123_456,
        firmware_build_date: "19 Dec 2024".to_owned(),
        manufacturer_model: "Heltec V3".to_owned(),
        firmware_version: "v1.5.1".to_owned(),
    }
}

fn sample_contact(byte: u8, name: &str) -> Contact {
    Contact {
        public_key: PublicKey::new([byte; 32]),
        contact_type: ContactType::Chat,
        flags: ContactFlags::default(),
        adv_name: name.to_owned(),
        out_path: Some(vec![0x11]),
        last_advert: 1_700_000_000,
        adv_lat: 0,
        adv_lon: 0,
        lastmod: 1_700_000_100,
    }
}

#[tokio::test]
async fn s1_device_info_round_trips_through_the_codec() {
    let info = sample_device_info();
    let wire_body = info.encode();

    let expected_body = wire_body.clone();
    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::DeviceQuery);
        assert_eq!(body, [0x08]);
        vec![payload(ResponseCode::DeviceInfo, &expected_body)]
    })
    .await;

    let decoded = client.device_query(8).await.unwrap();
    assert_eq!(decoded, info);
    // Round trip: re-encoding reproduces the device's bytes exactly.
    assert_eq!(decoded.encode(), wire_body);
}

#[tokio::test]
async fn s2_set_device_time_encodes_little_endian() {
    let (_device, client) = client_with(|cmd, body| {
        assert_eq!(cmd, CommandCode::SetDeviceTime);
        // 2024-01-01T00:00:00Z as LE bytes.
        assert_eq!(body, [0x80, 0x00, 0x92, 0x65]);
        vec![payload(ResponseCode::Ok, &[])]
    })
    .await;

    client.set_device_time(1_704_067_200).await.unwrap();
}

#[tokio::test]
async fn s3_channel_zero_carries_the_well_known_public_secret() {
    let (_device, client) = client_with(|cmd, body| {
        assert_eq!(cmd, CommandCode::GetChannel);
        assert_eq!(body, [0x00]);
        let info = ChannelInfo {
            index: 0,
            name: "public".to_owned(),
            secret: PUBLIC_CHANNEL_SECRET,
        };
        let body = info.encode().unwrap();
        assert_eq!(body.len(), 49);
        vec![payload(ResponseCode::ChannelInfo, &body)]
    })
    .await;

    let channel = client.get_channel(0).await.unwrap();
    assert_eq!(channel.index, 0);
    assert_eq!(channel.name, "public");
    assert_eq!(channel.secret, PUBLIC_CHANNEL_SECRET);
    assert!(channel.is_encrypted());
}

#[tokio::test]
async fn s4_ensure_hashtag_channel_creates_with_derived_secret() {
    let written: Arc<Mutex<Option<ChannelInfo>>> = Arc::new(Mutex::new(None));
    let written_in_handler = Arc::clone(&written);

    let (_device, client) = client_with(move |cmd, body| match cmd {
        CommandCode::GetChannel => {
            if body == [0] {
                let info = ChannelInfo {
                    index: 0,
                    name: "public".to_owned(),
                    secret: PUBLIC_CHANNEL_SECRET,
                };
                vec![payload(ResponseCode::ChannelInfo, &info.encode().unwrap())]
            } else {
                vec![payload(ResponseCode::Err, &[ErrorStatus::NotFound.to_u8()])]
            }
        },
        CommandCode::SetChannel => {
            let info = ChannelInfo::decode(body).unwrap();
            *written_in_handler.lock().unwrap() = Some(info);
            vec![payload(ResponseCode::Ok, &[])]
        },
        other => panic!("unexpected command {other:?}"),
    })
    .await;

    let client = Client::with_config(
        client.transport().clone(),
        ClientConfig { max_channels: 4, ..ClientConfig::default() },
    );

    let channel = client.ensure_hashtag_channel("#MyChannel").await.unwrap();
    assert_eq!(channel.index, 1, "first free slot above the default channel");
    assert_eq!(channel.secret, derive_channel_secret("#MyChannel"));
    // Verified against a reference SHA-256 implementation.
    assert_eq!(hex::encode(channel.secret), "a1b9a31def4405051310240a2b399177");

    let on_device = written.lock().unwrap().clone().expect("channel written to device");
    assert_eq!(on_device.index, 1);
    assert_eq!(on_device.name, "#MyChannel");
    assert_eq!(on_device.secret, channel.secret);
}

#[tokio::test]
async fn s5_two_phase_path_discovery() {
    let target = PublicKey::new([0x42; 32]);

    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::SendPathDiscoveryReq);
        // flags byte then the full public key.
        assert_eq!(body[0], 0x00);
        assert_eq!(&body[1..], [0x42; 32]);

        let result = PathDiscoveryResult { in_path: vec![0xA1, 0xA2], out_path: vec![0xB1] };
        vec![
            sent_ack(5000),
            payload(ResponseCode::PushPathResponse, &result.encode()),
        ]
    })
    .await;

    let result = client.discover_path(&target).await.unwrap();
    assert_eq!(result.in_path, vec![0xA1, 0xA2]);
    assert_eq!(result.out_path, vec![0xB1]);
    assert!(!result.is_direct());
}

#[tokio::test]
async fn s6_contact_enumeration_tolerates_initial_error() {
    let (_device, client) = client_with(|cmd, _body| {
        assert_eq!(cmd, CommandCode::ContactListGet);
        vec![payload(ResponseCode::Err, &[ErrorStatus::InvalidParameter.to_u8()])]
    })
    .await;

    let book = client.get_contacts(None).await.unwrap();
    assert!(book.contacts.is_empty());
    assert_eq!(book.lastmod, None);
}

#[tokio::test]
async fn contact_enumeration_streams_and_skips_interleaved_messages() {
    let c1 = sample_contact(0x01, "alice");
    let c2 = sample_contact(0x02, "bob");

    let replies = {
        let (c1, c2) = (c1.clone(), c2.clone());
        let mut step = 0u32;
        move |cmd: CommandCode, body: &[u8]| match cmd {
            CommandCode::ContactListGet => {
                assert_eq!(body, 1_700_000_000u32.to_le_bytes());
                vec![payload(ResponseCode::ContactsStart, &2u32.to_le_bytes())]
            },
            CommandCode::SyncNextMessage => {
                step += 1;
                match step {
                    1 => vec![payload(ResponseCode::Contact, &c1.encode())],
                    2 => {
                        // A queued text message lands mid-stream.
                        let msg = OutgoingContactMessage {
                            kind: TextKind::Plain,
                            attempt: 0,
                            timestamp: 99,
                            pubkey_prefix: [9; 6],
                            text: "interleaved".to_owned(),
                        };
                        vec![payload(ResponseCode::ContactMsgRecv, &msg.encode())]
                    },
                    3 => vec![payload(ResponseCode::Contact, &c2.encode())],
                    _ => vec![payload(
                        ResponseCode::EndOfContacts,
                        &1_700_000_100u32.to_le_bytes(),
                    )],
                }
            },
            other => panic!("unexpected command {other:?}"),
        }
    };

    let (_device, client) = client_with(replies).await;
    let mut events = client.transport().subscribe();

    let book = client.get_contacts(Some(1_700_000_000)).await.unwrap();
    assert_eq!(book.contacts, vec![c1, c2]);
    assert_eq!(book.lastmod, Some(1_700_000_100));

    // The interleaved message reached subscribers.
    loop {
        if let Event::MessageReceived(msg) = events.recv().await.unwrap() {
            assert_eq!(msg.text(), "interleaved");
            break;
        }
    }
}

#[tokio::test]
async fn contact_enumeration_direct_variant() {
    let c1 = sample_contact(0x05, "carol");

    let replies = {
        let c1 = c1.clone();
        move |cmd: CommandCode, _body: &[u8]| match cmd {
            CommandCode::ContactListGet => vec![payload(ResponseCode::Contact, &c1.encode())],
            CommandCode::SyncNextMessage => vec![payload(ResponseCode::NoMoreMessages, &[])],
            other => panic!("unexpected command {other:?}"),
        }
    };

    let (_device, client) = client_with(replies).await;
    let book = client.get_contacts(None).await.unwrap();
    assert_eq!(book.contacts, vec![c1]);
    assert_eq!(book.lastmod, None);
}

#[tokio::test]
async fn contact_crud_round_trips() {
    let contact = sample_contact(0x07, "dave");
    let key = contact.public_key;

    let replies = {
        let contact = contact.clone();
        move |cmd: CommandCode, body: &[u8]| match cmd {
            CommandCode::GetContactByKey => {
                assert_eq!(body, [0x07; 32]);
                vec![payload(ResponseCode::Contact, &contact.encode())]
            },
            CommandCode::AddUpdateContact => {
                assert_eq!(body.len(), 143, "update body has no lastmod");
                assert_eq!(&body[..32], [0x07; 32]);
                vec![payload(ResponseCode::Ok, &[])]
            },
            CommandCode::RemoveContact => {
                assert_eq!(body, [0x07; 32]);
                vec![payload(ResponseCode::Ok, &[])]
            },
            CommandCode::ResetPath => {
                assert_eq!(body, [0x07; 32]);
                vec![payload(ResponseCode::Ok, &[])]
            },
            other => panic!("unexpected command {other:?}"),
        }
    };

    let (_device, client) = client_with(replies).await;

    let fetched = client.get_contact_by_key(&key).await.unwrap();
    assert_eq!(fetched, contact);

    client.add_update_contact(&contact).await.unwrap();
    client.reset_path(&key).await.unwrap();
    client.remove_contact(&key).await.unwrap();
}

#[tokio::test]
async fn autoadd_toggle_preserves_unrelated_flags() {
    let flags = Arc::new(Mutex::new(0x80u8));
    let handler_flags = Arc::clone(&flags);

    let (_device, client) = client_with(move |cmd, body| match cmd {
        CommandCode::GetAutoAddConfig => {
            vec![payload(ResponseCode::AutoAddConfig, &[*handler_flags.lock().unwrap()])]
        },
        CommandCode::SetAutoAddConfig => {
            *handler_flags.lock().unwrap() = body[0];
            vec![payload(ResponseCode::Ok, &[])]
        },
        other => panic!("unexpected command {other:?}"),
    })
    .await;

    let config = client.get_autoadd_config().await.unwrap();
    assert!(config.auto_add_enabled());

    client.set_auto_add_enabled(false).await.unwrap();
    assert_eq!(*flags.lock().unwrap(), 0x81, "unrelated high bit preserved");

    client.set_auto_add_enabled(true).await.unwrap();
    assert_eq!(*flags.lock().unwrap(), 0x80);
}

#[tokio::test]
async fn channel_enumeration_tolerates_gaps_above_zero() {
    let (_device, client) = client_with(|cmd, body| {
        assert_eq!(cmd, CommandCode::GetChannel);
        let index = body[0];
        if index == 0 || index == 2 {
            let info = ChannelInfo {
                index,
                name: format!("ch{index}"),
                secret: [0u8; 16],
            };
            vec![payload(ResponseCode::ChannelInfo, &info.encode().unwrap())]
        } else {
            vec![payload(ResponseCode::Err, &[ErrorStatus::NotFound.to_u8()])]
        }
    })
    .await;

    let client = Client::with_config(
        client.transport().clone(),
        ClientConfig { max_channels: 4, ..ClientConfig::default() },
    );

    let channels = client.get_channels().await.unwrap();
    let indices: Vec<u8> = channels.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 2]);
}

#[tokio::test]
async fn missing_default_channel_is_synthesised_only_for_public_lookup() {
    let (_device, client) = client_with(|_cmd, _body| {
        vec![payload(ResponseCode::Err, &[ErrorStatus::NotFound.to_u8()])]
    })
    .await;

    // get_public_channel synthesises the historical default...
    let public = client.get_public_channel().await.unwrap();
    assert_eq!(public.index, 0);
    assert_eq!(public.name, "All");
    assert_eq!(public.frequency_hz, DEFAULT_PUBLIC_FREQ_HZ);
    assert!(!public.is_encrypted());

    // ...but plain enumeration treats a missing slot zero as an error.
    let err = client.get_channels().await.unwrap_err();
    assert_eq!(err.device_status(), Some(ErrorStatus::NotFound));
}

#[tokio::test]
async fn set_channel_validation() {
    let (_device, client) = client_with(|_cmd, _body| vec![payload(ResponseCode::Ok, &[])]).await;

    let no_freq =
        Channel { index: 1, name: "plain".to_owned(), frequency_hz: 0, secret: [0; 16] };
    assert!(matches!(
        client.set_channel(&no_freq).await,
        Err(ClientError::InvalidArgument { name: "frequency", .. })
    ));

    let hashtag = Channel {
        index: 1,
        name: "#ok".to_owned(),
        frequency_hz: 0,
        secret: derive_channel_secret("#ok"),
    };
    client.set_channel(&hashtag).await.unwrap();
}

#[tokio::test]
async fn send_message_packs_the_outgoing_record() {
    let target = PublicKey::new([0xAB; 32]);

    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::SendTxtMsg);
        assert_eq!(body[0], 0, "plain text kind");
        assert_eq!(body[1], 0, "first attempt");
        assert_eq!(&body[6..12], [0xAB; 6], "recipient prefix");
        assert_eq!(&body[12..], b"hello mesh");
        vec![sent_ack(3000)]
    })
    .await;

    let ack = client.send_message(&target, "hello mesh").await.unwrap();
    assert_eq!(ack.expected_ack, 0xA1B2_C3D4);
    assert_eq!(ack.suggested_timeout_ms, 3000);
}

#[tokio::test]
async fn message_text_validation() {
    let (_device, client) = client_with(|_cmd, _body| vec![sent_ack(1000)]).await;
    let target = PublicKey::new([1; 32]);

    assert!(matches!(
        client.send_message(&target, "").await,
        Err(ClientError::InvalidArgument { name: "text", .. })
    ));
    assert!(matches!(
        client.send_message(&target, "nul\0inside").await,
        Err(ClientError::InvalidArgument { name: "text", .. })
    ));
}

#[tokio::test]
async fn channel_message_has_trailing_nul_on_the_wire() {
    let (_device, client) = client_with(|cmd, body| {
        assert_eq!(cmd, CommandCode::SendChannelTxtMsg);
        assert_eq!(body[1], 3, "channel index");
        assert_eq!(body.last(), Some(&0u8));
        vec![payload(ResponseCode::Ok, &[])]
    })
    .await;

    client.send_channel_message(3, "to the room").await.unwrap();
}

#[tokio::test]
async fn sync_drains_the_offline_queue() {
    let mut queued = vec![
        {
            let msg = OutgoingContactMessage {
                kind: TextKind::Plain,
                attempt: 0,
                timestamp: 10,
                pubkey_prefix: [1; 6],
                text: "first".to_owned(),
            };
            payload(ResponseCode::ContactMsgRecv, &msg.encode())
        },
        {
            // A channel message, V3 layout with link stats.
            let mut body = vec![0xF8u8, 2, 0, 4];
            body.extend_from_slice(&20u32.to_le_bytes());
            body.extend_from_slice(b"second");
            payload(ResponseCode::ChannelMsgRecvV3, &body)
        },
    ];
    queued.reverse(); // pop() delivers in order

    let (_device, client) = client_with(move |cmd, _body| {
        assert_eq!(cmd, CommandCode::SyncNextMessage);
        match queued.pop() {
            Some(p) => vec![p],
            None => vec![payload(ResponseCode::NoMoreMessages, &[])],
        }
    })
    .await;

    let messages = client.sync_all_messages().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text(), "first");

    let IncomingMessage::Channel(chan) = &messages[1] else {
        panic!("expected channel message");
    };
    assert_eq!(chan.text, "second");
    assert_eq!(chan.channel_idx, 4);
    assert_eq!(chan.snr_scaled, Some(-8));
}

#[tokio::test]
async fn remote_command_waits_for_the_matching_reply() {
    let target = PublicKey::new([0x33; 32]);

    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::SendTxtMsg);
        assert_eq!(body[0], TextKind::CliCommand.to_u8());
        assert_eq!(&body[12..], b"ver");

        // A reply from an unrelated node first, then the real one.
        let unrelated = OutgoingContactMessage {
            kind: TextKind::Plain,
            attempt: 0,
            timestamp: 50,
            pubkey_prefix: [0xEE; 6],
            text: "noise".to_owned(),
        };
        let reply = OutgoingContactMessage {
            kind: TextKind::Plain,
            attempt: 0,
            timestamp: 51,
            pubkey_prefix: [0x33; 6],
            text: "fw v1.5.1".to_owned(),
        };
        vec![
            sent_ack(2000),
            payload(ResponseCode::ContactMsgRecv, &unrelated.encode()),
            payload(ResponseCode::ContactMsgRecv, &reply.encode()),
        ]
    })
    .await;

    let reply = client.send_remote_command(&target, "ver").await.unwrap();
    assert_eq!(reply.text, "fw v1.5.1");
    assert_eq!(reply.pubkey_prefix, [0x33; 6]);
}

#[tokio::test]
async fn trace_path_round_trips_by_tag() {
    let (_device, client) = client_with(|cmd, body| {
        assert_eq!(cmd, CommandCode::SendTracePath);
        let tag = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let auth = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        assert_eq!(auth, 0x00C0_FFEE);
        assert_eq!(body[8], 0, "flags");
        assert_eq!(&body[9..], [0x0A, 0x0B]);

        let trace = TraceData {
            tag,
            result: PathDiscoveryResult { in_path: vec![0x0B, 0x0A], out_path: vec![0x0A, 0x0B] },
        };
        vec![sent_ack(1500), payload(ResponseCode::PushTraceData, &trace.encode())]
    })
    .await;

    let trace = client.trace_path(&[0x0A, 0x0B], 0x00C0_FFEE).await.unwrap();
    assert_eq!(trace.result.out_path, vec![0x0A, 0x0B]);
    assert_eq!(trace.result.in_path, vec![0x0B, 0x0A]);
}

#[tokio::test]
async fn remote_status_is_matched_by_prefix() {
    let target = PublicKey::new([0x55; 32]);

    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::SendStatusReq);
        assert_eq!(body, [0x55; 32]);

        let mut status = RemoteStatus {
            pubkey_prefix: [0xEE; 6], // unrelated node answers first
            battery_mv: 100,
            tx_queue_len: 0,
            noise_floor_dbm: -100,
            last_rssi: -50,
            nb_recv: 0,
            nb_sent: 0,
            airtime_secs: 0,
            uptime_secs: 0,
            sent_flood: 0,
            sent_direct: 0,
            recv_flood: 0,
            recv_direct: 0,
            full_events: 0,
            last_snr_scaled: 0,
            direct_dups: 0,
            flood_dups: 0,
        };
        let unrelated = payload(ResponseCode::PushStatusResponse, &status.encode());

        status.pubkey_prefix = [0x55; 6];
        status.battery_mv = 4050;
        status.uptime_secs = 86_400;
        let ours = payload(ResponseCode::PushStatusResponse, &status.encode());

        vec![sent_ack(2000), unrelated, ours]
    })
    .await;

    let status = client.request_status(&target).await.unwrap();
    assert_eq!(status.pubkey_prefix, [0x55; 6]);
    assert_eq!(status.battery_mv, 4050);
    assert_eq!(status.uptime_secs, 86_400);
}

#[tokio::test]
async fn neighbours_ride_the_binary_request_path() {
    let target = PublicKey::new([0x77; 32]);

    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::SendBinaryReq);
        let tag = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        assert_eq!(&body[4..10], [0x77; 6], "target prefix");
        assert_eq!(body[10], 3, "neighbours request type");
        assert_eq!(&body[11..], [6, 10], "prefix_len, max_results");

        let list = NeighbourList {
            neighbours_count: 2,
            entries: vec![
                NeighbourEntry {
                    pubkey_prefix: vec![1, 1, 1, 1, 1, 1],
                    secs_ago: 12,
                    snr_scaled: 20,
                },
                NeighbourEntry {
                    pubkey_prefix: vec![2, 2, 2, 2, 2, 2],
                    secs_ago: 340,
                    snr_scaled: -6,
                },
            ],
        };
        let response = BinaryResponse { tag, payload: list.encode() };
        vec![sent_ack(2500), payload(ResponseCode::PushBinaryResponse, &response.encode())]
    })
    .await;

    let list = client.request_neighbours(&target, 6, 10).await.unwrap();
    assert_eq!(list.neighbours_count, 2);
    assert_eq!(list.entries.len(), 2);
    assert_eq!(list.entries[0].pubkey_prefix, vec![1, 1, 1, 1, 1, 1]);
    assert_eq!(list.entries[1].secs_ago, 340);
}

#[tokio::test]
async fn device_power_and_stats_queries() {
    let (_device, client) = client_with(|cmd, _body| match cmd {
        CommandCode::GetBatteryVoltage => {
            vec![payload(ResponseCode::BatteryVoltage, &4100u16.to_le_bytes())]
        },
        CommandCode::GetBattAndStorage => {
            let batt = BatteryAndStorage { battery_mv: 4100, used_kb: 200, total_kb: 8192 };
            vec![payload(ResponseCode::BattAndStorage, &batt.encode())]
        },
        CommandCode::GetStats => {
            let stats = RadioStats {
                noise_floor_dbm: -112,
                last_rssi: -90,
                last_snr_scaled: 18,
                tx_air_secs: 100,
                rx_air_secs: 900,
            };
            vec![payload(ResponseCode::Stats, &stats.encode())]
        },
        other => panic!("unexpected command {other:?}"),
    })
    .await;

    assert_eq!(client.get_battery_voltage().await.unwrap(), 4100);

    let batt = client.get_battery_and_storage().await.unwrap();
    assert_eq!(batt.total_kb, 8192);

    let stats = client.get_radio_stats().await.unwrap();
    assert_eq!(stats.noise_floor_dbm, -112);
    assert!((stats.last_snr_db() - 4.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn radio_params_are_validated_before_the_wire() {
    // The handler would fail the test if anything reached it.
    let (_device, client) =
        client_with(|cmd, _| panic!("no command expected, got {cmd:?}")).await;

    let bad_sf = RadioParams { freq_khz: 915_000, bw_khz: 250_000, spreading_factor: 13, coding_rate: 5 };
    assert!(matches!(
        client.set_radio_params(&bad_sf).await,
        Err(ClientError::InvalidArgument { name: "sf", .. })
    ));

    let bad_cr = RadioParams { freq_khz: 915_000, bw_khz: 250_000, spreading_factor: 9, coding_rate: 4 };
    assert!(matches!(
        client.set_radio_params(&bad_cr).await,
        Err(ClientError::InvalidArgument { name: "cr", .. })
    ));

    let no_freq = RadioParams { freq_khz: 0, bw_khz: 250_000, spreading_factor: 9, coding_rate: 5 };
    assert!(matches!(
        client.set_radio_params(&no_freq).await,
        Err(ClientError::InvalidArgument { name: "freq", .. })
    ));
}

#[tokio::test]
async fn set_radio_params_reaches_the_wire_when_valid() {
    let (_device, client) = client_with(|cmd, body| {
        assert_eq!(cmd, CommandCode::SetRadioParams);
        let params = RadioParams::decode(body).unwrap();
        assert_eq!(params.freq_khz, 915_000);
        assert_eq!(params.spreading_factor, 10);
        vec![payload(ResponseCode::Ok, &[])]
    })
    .await;

    let params = RadioParams::from_natural(915.0, 250.0, 10, 5);
    client.set_radio_params(&params).await.unwrap();
}

#[tokio::test]
async fn app_start_returns_self_info() {
    let info = SelfInfo {
        adv_type: 1,
        tx_power_dbm: 22,
        max_tx_power_dbm: 30,
        public_key: PublicKey::new([0x10; 32]),
        adv_lat: 0,
        adv_lon: 0,
        manual_add_contacts: false,
        radio_freq_khz: 869_525,
        radio_bw_khz: 250_000,
        spreading_factor: 11,
        coding_rate: 5,
        name: "test-node".to_owned(),
    };

    let reply_body = info.encode();
    let (_device, client) = client_with(move |cmd, body| {
        assert_eq!(cmd, CommandCode::AppStart);
        assert_eq!(body[0], 1, "app protocol version");
        assert_eq!(&body[7..], b"e2e-tests");
        vec![payload(ResponseCode::SelfInfo, &reply_body)]
    })
    .await;

    let self_info = client.app_start("e2e-tests").await.unwrap();
    assert_eq!(self_info, info);
    assert_eq!(self_info.name, "test-node");
}

#[tokio::test]
async fn advert_operations() {
    let (_device, client) = client_with(|cmd, body| match cmd {
        CommandCode::SendSelfAdvert => {
            assert_eq!(body, [1], "flood advert");
            vec![payload(ResponseCode::Ok, &[])]
        },
        CommandCode::SetAdvertName => {
            assert_eq!(body, b"relay-7");
            vec![payload(ResponseCode::Ok, &[])]
        },
        CommandCode::SetAdvertLatLon => {
            assert_eq!(&body[..4], (-33_868_800i32).to_le_bytes());
            assert_eq!(&body[4..], 151_209_300i32.to_le_bytes());
            vec![payload(ResponseCode::Ok, &[])]
        },
        CommandCode::GetAdvertPath => {
            let mut b = 1_700_000_000u32.to_le_bytes().to_vec();
            b.extend_from_slice(&[0x21, 0x22]);
            vec![payload(ResponseCode::AdvertPath, &b)]
        },
        other => panic!("unexpected command {other:?}"),
    })
    .await;

    client.send_advert(true).await.unwrap();
    client.set_advert_name("relay-7").await.unwrap();
    client.set_advert_latlon(-33_868_800, 151_209_300).await.unwrap();

    let path = client.get_advert_path().await.unwrap();
    assert_eq!(path.received_ts, 1_700_000_000);
    assert_eq!(path.path, vec![0x21, 0x22]);

    assert!(matches!(
        client.set_advert_name("").await,
        Err(ClientError::InvalidArgument { name: "name", .. })
    ));
}

#[tokio::test]
async fn invalid_command_is_surfaced_not_substituted() {
    let (_device, client) = client_with(|_cmd, _body| {
        vec![payload(ResponseCode::Err, &[ErrorStatus::InvalidCommand.to_u8()])]
    })
    .await;

    let err = client.get_advert_path().await.unwrap_err();
    assert_eq!(err.device_status(), Some(ErrorStatus::InvalidCommand));
    let text = err.to_string();
    assert!(text.contains("review the calling pattern"), "diagnostic note missing: {text}");
}
