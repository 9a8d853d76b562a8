//! midiosc — standalone host: MIDI input in, OSC out.
//!
//! Loads the state file, connects a MIDI input device, runs the dispatch loop
//! until Ctrl-C, then saves the state back.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use midiosc::midi::{MidiConfig, MidiInput};
use midiosc::osc::TransportConfig;
use midiosc::state::default_state_path;
use midiosc::Bridge;

#[derive(Parser, Debug)]
#[command(name = "midiosc", version, about = "Send OSC messages from MIDI notes")]
struct Cli {
    /// State file holding OSC settings and note mappings.
    #[arg(long)]
    state: Option<PathBuf>,

    /// MIDI input device name (substring match). Defaults to the first port.
    #[arg(long)]
    device: Option<String>,

    /// Only accept MIDI on this channel (0-15).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..16))]
    channel: Option<u8>,

    /// Override the OSC destination address.
    #[arg(long)]
    address: Option<String>,

    /// Override the OSC destination port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the dispatch interval in milliseconds.
    #[arg(long)]
    interval: Option<u64>,

    /// List MIDI input devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Don't write the state file on exit.
    #[arg(long)]
    no_save: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        for name in MidiInput::list_devices() {
            println!("{name}");
        }
        return;
    }

    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> midiosc::Result<()> {
    let state_path = cli.state.clone().unwrap_or_else(default_state_path);
    let bridge = Arc::new(Bridge::default());

    if bridge.load_state_file(&state_path)? {
        info!(path = %state_path.display(), "loaded state");
    }
    apply_overrides(&bridge, &cli);

    let mut midi_config = MidiConfig::load().unwrap_or_default();
    if cli.device.is_some() {
        midi_config.device_name = cli.device.clone();
    }
    if cli.channel.is_some() {
        midi_config.channel_filter = cli.channel;
    }

    let input = MidiInput::start(&midi_config, bridge.clone())?;
    let config = bridge.transport_config();
    info!(
        midi = input.port_name(),
        destination = %format!("{}:{}", config.address, config.port),
        interval_ms = config.interval_ms,
        mappings = bridge.mappings().len(),
        "bridge running, Ctrl-C to stop"
    );

    let mut dispatch_loop = bridge.start();

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(std::io::Error::other)?;
    let _ = rx.recv();

    dispatch_loop.stop();
    drop(input);

    if !cli.no_save {
        bridge.save_state_file(&state_path)?;
        info!(path = %state_path.display(), "saved state");
    }
    Ok(())
}

fn apply_overrides(bridge: &Bridge, cli: &Cli) {
    if cli.address.is_none() && cli.port.is_none() && cli.interval.is_none() {
        return;
    }
    let current = bridge.transport_config();
    bridge.set_transport_config(TransportConfig::new(
        cli.address.clone().unwrap_or(current.address),
        cli.port.unwrap_or(current.port),
        cli.interval.unwrap_or(current.interval_ms),
    ));
}
