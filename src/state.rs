//! State persistence — YAML document holding the transport settings and the mapping table.
//!
//! Document layout (key names are stable):
//!
//! ```yaml
//! oscSettings: { address: 127.0.0.1, port: 1234, interval: 100 }
//! oscMap:
//!   - path: /lead
//!     note: 60
//!     useNote: true
//!     useVel: true
//!     randomRange: { inUse: false, isInt: false, lo: 0.0, hi: 1.0 }
//!     knob1: { inUse: true, isInt: false, lo: 0.0, hi: 100.0 }
//!     # ... through knob16
//! ```
//!
//! Loading is lenient: a missing or malformed field falls back to its default
//! instead of failing the whole load. Only an unparseable document is an error.

use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::mapping::{MappingTable, NoteMapping, MAX_NOTE};
use crate::osc::config::{TransportConfig, DEFAULT_ADDRESS, DEFAULT_INTERVAL_MS, DEFAULT_PORT};
use crate::range::ValueRange;

const SETTINGS_KEY: &str = "oscSettings";
const MAP_KEY: &str = "oscMap";
const RANDOM_RANGE_KEY: &str = "randomRange";

/// Default path for the state document.
pub fn default_state_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".midiosc");
    path.push("state.yaml");
    path
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateDocument<'a> {
    osc_settings: SettingsDocument<'a>,
    osc_map: Vec<MappingDocument<'a>>,
}

#[derive(Serialize)]
struct SettingsDocument<'a> {
    address: &'a str,
    port: u16,
    interval: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingDocument<'a> {
    path: &'a str,
    note: u8,
    use_note: bool,
    #[serde(rename = "useVel")]
    use_velocity: bool,
    random_range: RangeDocument,
    #[serde(flatten)]
    knobs: KnobFields<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeDocument {
    in_use: bool,
    #[serde(rename = "isInt")]
    is_integer: bool,
    lo: f32,
    hi: f32,
}

/// Knob ranges written as `knob1` through `knob16`, in index order.
struct KnobFields<'a>(&'a [ValueRange]);

impl Serialize for KnobFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, range) in self.0.iter().enumerate() {
            map.serialize_entry(&knob_key(i), &RangeDocument::from(range))?;
        }
        map.end()
    }
}

impl From<&ValueRange> for RangeDocument {
    fn from(range: &ValueRange) -> Self {
        Self {
            in_use: range.in_use,
            is_integer: range.is_integer,
            lo: range.lo,
            hi: range.hi,
        }
    }
}

impl<'a> From<&'a NoteMapping> for MappingDocument<'a> {
    fn from(mapping: &'a NoteMapping) -> Self {
        Self {
            path: mapping.path(),
            note: mapping.note(),
            use_note: mapping.use_note,
            use_velocity: mapping.use_velocity,
            random_range: RangeDocument::from(&mapping.random_range),
            knobs: KnobFields(&mapping.knob_ranges),
        }
    }
}

/// Serialize the transport settings and every mapping.
pub fn encode(config: &TransportConfig, table: &MappingTable) -> Result<String> {
    let document = StateDocument {
        osc_settings: SettingsDocument {
            address: &config.address,
            port: config.port,
            interval: config.interval_ms,
        },
        osc_map: table.iter().map(MappingDocument::from).collect(),
    };
    Ok(serde_yaml::to_string(&document)?)
}

/// Result of decoding a document: each section is `None` when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    pub transport: Option<TransportConfig>,
    pub mappings: Option<MappingTable>,
}

/// Parse a document.
pub fn decode(text: &str) -> Result<DecodedState> {
    let root: Value = serde_yaml::from_str(text)?;
    if !root.is_mapping() {
        return Err(Error::Document("root is not a mapping".into()));
    }

    let transport = root
        .get(SETTINGS_KEY)
        .and_then(Value::as_mapping)
        .map(settings_from_value);

    let mappings = root.get(MAP_KEY).and_then(Value::as_sequence).map(|items| {
        let mut table = MappingTable::new();
        restore_mappings(&mut table, items);
        table
    });

    Ok(DecodedState {
        transport,
        mappings,
    })
}

/// Clear `table`, then re-create one entry per well-formed item.
///
/// Items without a valid note number are skipped.
pub fn restore_mappings(table: &mut MappingTable, items: &[Value]) {
    table.clear();
    for (index, item) in items.iter().enumerate() {
        let Some(fields) = item.as_mapping() else {
            warn!(index, "skipping persisted mapping: not a mapping");
            continue;
        };
        let Some(note) = get_int(fields, "note")
            .filter(|n| (0..=i64::from(MAX_NOTE)).contains(n))
            .map(|n| n as u8)
        else {
            warn!(index, "skipping persisted mapping: missing or invalid note");
            continue;
        };
        let path = get_str(fields, "path").unwrap_or_default();

        let entry = table.upsert(note, path);
        if let Some(use_note) = get_bool(fields, "useNote") {
            entry.use_note = use_note;
        }
        if let Some(use_velocity) = get_bool(fields, "useVel") {
            entry.use_velocity = use_velocity;
        }
        if let Some(range) = fields.get(RANDOM_RANGE_KEY).and_then(Value::as_mapping) {
            read_range(range, &mut entry.random_range);
        }
        for (i, knob) in entry.knob_ranges.iter_mut().enumerate() {
            if let Some(range) = fields.get(knob_key(i).as_str()).and_then(Value::as_mapping) {
                read_range(range, knob);
            }
        }
    }
    debug!(entries = table.len(), "restored mappings");
}

/// Save a document, creating parent directories as needed.
pub fn save_document(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, document)?;
    Ok(())
}

/// Read a document. Returns `None` if the file doesn't exist.
pub fn load_document(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}

fn knob_key(index: usize) -> String {
    format!("knob{}", index + 1)
}

fn read_range(fields: &Mapping, range: &mut ValueRange) {
    if let Some(in_use) = get_bool(fields, "inUse") {
        range.in_use = in_use;
    }
    if let Some(is_integer) = get_bool(fields, "isInt") {
        range.is_integer = is_integer;
    }
    if let Some(lo) = get_f32(fields, "lo") {
        range.lo = lo;
    }
    if let Some(hi) = get_f32(fields, "hi") {
        range.hi = hi;
    }
}

fn settings_from_value(fields: &Mapping) -> TransportConfig {
    let address = get_str(fields, "address")
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(DEFAULT_ADDRESS);
    let port = get_int(fields, "port")
        .map(|p| p.max(0))
        .and_then(|p| u16::try_from(p).ok())
        .unwrap_or(DEFAULT_PORT);
    let interval_ms = get_int(fields, "interval")
        .map(|ms| ms.max(1) as u64)
        .unwrap_or(DEFAULT_INTERVAL_MS);
    TransportConfig::new(address, port, interval_ms)
}

fn get_str<'a>(fields: &'a Mapping, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn get_bool(fields: &Mapping, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn get_int(fields: &Mapping, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn get_f32(fields: &Mapping, key: &str) -> Option<f32> {
    let value = match fields.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(value as f32).filter(|v| v.is_finite())
}
