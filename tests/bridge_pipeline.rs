//! Bridge pipeline integration tests — MIDI in, OSC datagrams out over real UDP.

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use midiosc::midi::MidiConfig;
use midiosc::osc::TransportConfig;
use midiosc::range::ValueRange;
use midiosc::Bridge;
use rosc::{decoder, OscMessage, OscPacket, OscType};

const SEED: u64 = 42;

fn receiver() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    socket
}

fn receive(socket: &UdpSocket) -> Option<OscMessage> {
    let mut buf = [0u8; 4096];
    let (size, _) = socket.recv_from(&mut buf).ok()?;
    match decoder::decode_udp(&buf[..size]).ok()?.1 {
        OscPacket::Message(msg) => Some(msg),
        OscPacket::Bundle(_) => None,
    }
}

fn bridge_to(socket: &UdpSocket, interval_ms: u64) -> Bridge {
    let port = socket.local_addr().unwrap().port();
    Bridge::with_seed(TransportConfig::new("127.0.0.1", port, interval_ms), SEED)
}

#[test]
fn note_on_produces_mapped_message() {
    let rx = receiver();
    let bridge = bridge_to(&rx, 100);

    bridge.add_mapping(60, "/oscvst").unwrap();
    bridge.update_mapping(60, |m| {
        m.knob_ranges[0] = ValueRange {
            in_use: true,
            is_integer: false,
            lo: 0.0,
            hi: 100.0,
        };
    });
    bridge.set_controller_value(0, 0.5);
    bridge.handle_midi(&[0x90, 60, 127], &MidiConfig::default());

    assert_eq!(bridge.tick(), 1);

    let msg = receive(&rx).unwrap();
    assert_eq!(msg.addr, "/oscvst");
    assert_eq!(
        msg.args,
        vec![OscType::Int(60), OscType::Float(1.0), OscType::Float(50.0)]
    );
}

#[test]
fn bare_mapping_sends_address_only() {
    let rx = receiver();
    let bridge = bridge_to(&rx, 100);

    bridge.add_mapping(48, "trigger").unwrap();
    bridge.update_mapping(48, |m| {
        m.use_note = false;
        m.use_velocity = false;
    });
    bridge.notify_note_on(48, 0.3);
    bridge.tick();

    let msg = receive(&rx).unwrap();
    assert_eq!(msg.addr, "/trigger");
    assert!(msg.args.is_empty());
}

#[test]
fn snapshot_is_shared_by_all_messages_of_a_tick() {
    let rx = receiver();
    let bridge = bridge_to(&rx, 100);

    for note in [60, 62] {
        bridge.add_mapping(note, "/knob").unwrap();
        bridge.update_mapping(note, |m| {
            m.use_note = false;
            m.use_velocity = false;
            m.knob_ranges[3] = ValueRange {
                in_use: true,
                is_integer: true,
                lo: 0.0,
                hi: 10.0,
            };
        });
    }
    bridge.set_controller_value(3, 0.45);
    bridge.notify_note_on(60, 1.0);
    bridge.notify_note_on(62, 1.0);

    assert_eq!(bridge.tick(), 2);
    assert_eq!(receive(&rx).unwrap().args, vec![OscType::Int(5)]);
    assert_eq!(receive(&rx).unwrap().args, vec![OscType::Int(5)]);
}

#[test]
fn reconfigured_destination_receives_later_sends() {
    let first = receiver();
    let second = receiver();
    let bridge = bridge_to(&first, 100);
    bridge.add_mapping(60, "/moved").unwrap();

    bridge.set_transport_config(TransportConfig::new(
        "127.0.0.1",
        second.local_addr().unwrap().port(),
        100,
    ));
    bridge.notify_note_on(60, 0.5);
    bridge.tick();

    assert_eq!(receive(&second).unwrap().addr, "/moved");
}

#[test]
fn unreachable_destination_does_not_stop_dispatch() {
    let bridge = Bridge::with_seed(TransportConfig::new("not a host name", 9000, 100), SEED);
    bridge.add_mapping(60, "/lost").unwrap();
    bridge.notify_note_on(60, 0.5);

    // Message is built and handed to the transport, which drops it.
    assert_eq!(bridge.tick(), 1);
    assert_eq!(bridge.tick(), 0);
}

#[test]
fn background_loop_dispatches_buffered_notes() {
    let rx = receiver();
    let bridge = bridge_to(&rx, 5);
    bridge.add_mapping(64, "/loop").unwrap();

    let mut dispatch_loop = bridge.start();
    bridge.notify_note_on(64, 0.8);

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut received = None;
    while received.is_none() && Instant::now() < deadline {
        received = receive(&rx);
    }
    dispatch_loop.stop();

    let msg = received.unwrap();
    assert_eq!(msg.addr, "/loop");
    assert_eq!(msg.args, vec![OscType::Int(64), OscType::Float(0.8)]);
}
