//! MIDI device input. Raw messages from the chosen port go straight to
//! [`Bridge::handle_midi`], which buffers note-ons and moves assigned knobs.

use std::sync::Arc;

use midir::{MidiInput as MidirInput, MidiInputConnection};
use tracing::{debug, info};

use super::config::MidiConfig;
use crate::bridge::Bridge;
use crate::error::{Error, Result};

const CLIENT_NAME: &str = "midiosc";

/// An open MIDI input port. The port closes when this is dropped.
pub struct MidiInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiInput {
    /// Connect to the port picked by [`select_port`] and route its messages to `bridge`.
    pub fn start(config: &MidiConfig, bridge: Arc<Bridge>) -> Result<Self> {
        let client = MidirInput::new(CLIENT_NAME)?;
        let ports = client.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| client.port_name(p).unwrap_or_default())
            .collect();
        debug!(?names, "MIDI input ports");

        let index = select_port(&names, config.device_name.as_deref())?;
        let port_name = names[index].clone();

        let routing = config.clone();
        let connection = client.connect(
            &ports[index],
            "midiosc-in",
            move |_stamp, message, _| bridge.handle_midi(message, &routing),
            (),
        )?;

        info!(port = %port_name, channel = ?config.channel_filter, "MIDI input connected");
        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Names of every MIDI input port; empty if the MIDI system is unavailable.
    pub fn list_devices() -> Vec<String> {
        match MidirInput::new(CLIENT_NAME) {
            Ok(client) => client
                .ports()
                .iter()
                .filter_map(|p| client.port_name(p).ok())
                .collect(),
            Err(e) => {
                debug!("MIDI unavailable: {e}");
                Vec::new()
            }
        }
    }
}

/// Index of the first port whose name contains `filter`, or of the first port
/// when there is no filter.
pub fn select_port(names: &[String], filter: Option<&str>) -> Result<usize> {
    if names.is_empty() {
        return Err(Error::MidiDevice("no MIDI input ports available".into()));
    }
    match filter {
        None => Ok(0),
        Some(filter) => names
            .iter()
            .position(|name| name.contains(filter))
            .ok_or_else(|| Error::MidiDevice(format!("no MIDI input port matches '{filter}'"))),
    }
}
