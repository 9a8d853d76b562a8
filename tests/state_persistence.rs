//! State persistence integration tests — file I/O through the bridge.

use midiosc::osc::TransportConfig;
use midiosc::range::ValueRange;
use midiosc::Bridge;

const SEED: u64 = 1;

fn populated_bridge() -> Bridge {
    let bridge = Bridge::with_seed(TransportConfig::new("127.0.0.1", 9500, 40), SEED);
    bridge.add_mapping(60, "/lead").unwrap();
    bridge.update_mapping(60, |m| {
        m.random_range = ValueRange {
            in_use: true,
            is_integer: true,
            lo: 1.0,
            hi: 4.0,
        };
        m.knob_ranges[9] = ValueRange {
            in_use: true,
            is_integer: false,
            lo: 200.0,
            hi: 20.0,
        };
    });
    bridge.add_mapping(36, "/kick").unwrap();
    bridge.update_mapping(36, |m| m.use_velocity = false);
    bridge
}

#[test]
fn state_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.yaml");

    let source = populated_bridge();
    source.save_state_file(&path).unwrap();

    let target = Bridge::with_seed(TransportConfig::default(), SEED);
    assert!(target.load_state_file(&path).unwrap());

    assert_eq!(target.mappings(), source.mappings());
    assert_eq!(target.transport_config(), source.transport_config());
}

#[test]
fn missing_state_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = populated_bridge();

    let loaded = bridge
        .load_state_file(&dir.path().join("absent.yaml"))
        .unwrap();
    assert!(!loaded);
    assert_eq!(bridge.mappings().len(), 2);
}

#[test]
fn document_without_map_keeps_existing_mappings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings-only.yaml");
    std::fs::write(
        &path,
        "oscSettings:\n  address: 127.0.0.1\n  port: 7000\n  interval: 10\n",
    )
    .unwrap();

    let bridge = populated_bridge();
    let before = bridge.mappings();
    bridge.load_state_file(&path).unwrap();

    assert_eq!(bridge.mappings(), before);
    assert_eq!(
        bridge.transport_config(),
        TransportConfig::new("127.0.0.1", 7000, 10)
    );
}

#[test]
fn saved_document_uses_stable_field_names() {
    let bridge = populated_bridge();
    let document = bridge.save_state().unwrap();

    for key in [
        "oscSettings",
        "address",
        "port",
        "interval",
        "oscMap",
        "path",
        "note",
        "useNote",
        "useVel",
        "randomRange",
        "inUse",
        "isInt",
        "lo",
        "hi",
        "knob1",
        "knob16",
    ] {
        assert!(document.contains(&format!("{key}:")), "missing {key}");
    }
}

#[test]
fn hand_written_document_loads() {
    let bridge = Bridge::with_seed(TransportConfig::default(), SEED);
    bridge
        .load_state(
            r#"
oscMap:
  - path: pad
    note: 72
    useNote: false
    knob2: { inUse: true, isInt: true, lo: 0, hi: 3 }
"#,
        )
        .unwrap();

    let mapping = bridge.mapping(72).unwrap();
    assert_eq!(mapping.path(), "/pad");
    assert!(!mapping.use_note);
    assert!(mapping.use_velocity);
    assert!(mapping.is_using_knob(1));
    assert_eq!(mapping.knob_ranges[1].hi, 3.0);
    assert_eq!(bridge.transport_config(), TransportConfig::default());
}
