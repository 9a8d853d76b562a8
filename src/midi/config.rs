//! MIDI configuration — device selection and knob controllers loaded from ~/.midiosc/midi.yaml.

use serde::{Deserialize, Serialize};

use crate::mapping::KNOB_COUNT;

/// MIDI configuration loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MidiConfig {
    /// Preferred MIDI device name (substring match). None = first available.
    #[serde(default)]
    pub device_name: Option<String>,
    /// Only accept messages on this MIDI channel (0-15). None = all channels.
    #[serde(default)]
    pub channel_filter: Option<u8>,
    /// Controller number driving each knob, by knob index.
    #[serde(default = "MidiConfig::default_knob_ccs")]
    pub knob_ccs: Vec<u8>,
}

impl MidiConfig {
    /// Load config from the standard path (~/.midiosc/midi.yaml).
    /// Returns None if the file doesn't exist (graceful fallback).
    pub fn load() -> Option<Self> {
        let home = dirs::home_dir()?;
        let path = home.join(".midiosc").join("midi.yaml");
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Default: CC1-16 → knob 0-15.
    fn default_knob_ccs() -> Vec<u8> {
        (1..=KNOB_COUNT as u8).collect()
    }

    /// Knob index driven by controller `cc`, if any.
    pub fn knob_for_cc(&self, cc: u8) -> Option<usize> {
        self.knob_ccs
            .iter()
            .take(KNOB_COUNT)
            .position(|&assigned| assigned == cc)
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            channel_filter: None,
            knob_ccs: Self::default_knob_ccs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MidiConfig::default();
        assert!(config.device_name.is_none());
        assert!(config.channel_filter.is_none());
        assert_eq!(config.knob_ccs.len(), KNOB_COUNT);
        assert_eq!(config.knob_for_cc(1), Some(0));
        assert_eq!(config.knob_for_cc(16), Some(15));
        assert_eq!(config.knob_for_cc(17), None);
    }

    #[test]
    fn serialize_deserialize() {
        let config = MidiConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: MidiConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn custom_config_deserialize() {
        let yaml = r#"
device_name: "Arturia"
channel_filter: 0
knob_ccs: [74, 71]
"#;
        let config: MidiConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.device_name.as_deref(), Some("Arturia"));
        assert_eq!(config.channel_filter, Some(0));
        assert_eq!(config.knob_for_cc(71), Some(1));
        assert_eq!(config.knob_for_cc(1), None);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: MidiConfig = serde_yaml::from_str("device_name: Keystep").unwrap();
        assert_eq!(config.knob_ccs, MidiConfig::default().knob_ccs);
    }

    #[test]
    fn extra_ccs_beyond_knob_count_are_ignored() {
        let config = MidiConfig {
            knob_ccs: (0..20).collect(),
            ..MidiConfig::default()
        };
        assert_eq!(config.knob_for_cc(15), Some(15));
        assert_eq!(config.knob_for_cc(18), None);
    }
}
