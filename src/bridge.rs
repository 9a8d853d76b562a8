//! The bridge — owns the mapping table, event buffer, controllers, transport
//! and random source, and exposes the commands a host or editor drives it with.
//!
//! All methods take `&self`; share the bridge behind an `Arc` between the MIDI
//! callback, the dispatch loop and whatever edits the configuration.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::controls::{ControllerSource, Controls};
use crate::dispatch::{DispatchLoop, Dispatcher};
use crate::error::{Error, Result};
use crate::mapping::{MappingTable, NoteMapping, MAX_NOTE};
use crate::midi::{parse_midi_message, EventBuffer, MidiConfig, MidiInputEvent, NoteEvent};
use crate::osc::{TransportConfig, UdpTransport};
use crate::state;

type StateLoadedHook = Box<dyn Fn() + Send + Sync>;

pub struct Bridge {
    table: Arc<Mutex<MappingTable>>,
    events: Arc<EventBuffer>,
    controls: Arc<Controls>,
    transport: Arc<UdpTransport>,
    config: RwLock<TransportConfig>,
    interval_ms: Arc<AtomicU64>,
    dispatcher: Arc<Dispatcher>,
    on_state_loaded: Mutex<Option<StateLoadedHook>>,
}

impl Bridge {
    /// Create a bridge sending to `config`'s destination, seeded from entropy.
    pub fn new(config: TransportConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Create a bridge with a fixed random seed.
    pub fn with_seed(config: TransportConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: TransportConfig, rng: ChaCha8Rng) -> Self {
        let config = config.sanitized();
        let table = Arc::new(Mutex::new(MappingTable::new()));
        let events = Arc::new(EventBuffer::new());
        let controls = Arc::new(Controls::new());
        let transport = Arc::new(UdpTransport::new());
        let dispatcher = Arc::new(Dispatcher::new(
            table.clone(),
            events.clone(),
            controls.clone(),
            transport.clone(),
            rng,
        ));

        let bridge = Self {
            table,
            events,
            controls,
            transport,
            interval_ms: Arc::new(AtomicU64::new(config.interval_ms)),
            config: RwLock::new(config.clone()),
            dispatcher,
            on_state_loaded: Mutex::new(None),
        };
        bridge.connect(&config);
        bridge
    }

    // --- MIDI input ---

    /// Buffer a note-on for the next tick. Velocity is normalized `[0,1]`.
    pub fn notify_note_on(&self, note: u8, velocity: f32) {
        self.events.push(NoteEvent { note, velocity });
    }

    /// Route a raw MIDI message: note-ons are buffered, assigned CCs move knobs.
    pub fn handle_midi(&self, msg: &[u8], config: &MidiConfig) {
        match parse_midi_message(msg, config.channel_filter) {
            Some(MidiInputEvent::NoteOn { note, velocity }) => self.notify_note_on(note, velocity),
            Some(MidiInputEvent::ControlChange { controller, value }) => {
                if let Some(knob) = config.knob_for_cc(controller) {
                    self.controls.set_from_cc(knob, value);
                }
            }
            None => {}
        }
    }

    // --- Controllers ---

    pub fn controller_value(&self, index: usize) -> f32 {
        self.controls.value(index)
    }

    /// Set knob `index`, clamped to `[0,1]`. Returns `false` for an out-of-range index.
    pub fn set_controller_value(&self, index: usize, value: f32) -> bool {
        self.controls.set(index, value)
    }

    // --- Mapping edits ---

    /// Create (or wholly replace) the mapping for `note`. Returns a copy of the new entry.
    pub fn add_mapping(&self, note: u8, path: &str) -> Result<NoteMapping> {
        if note > MAX_NOTE {
            return Err(Error::InvalidNote(note));
        }
        let mapping = self.table().upsert(note, path).clone();
        debug!(note, path = mapping.path(), "mapping added");
        Ok(mapping)
    }

    /// Edit the mapping for `note` in place. Returns `false` if there is none.
    pub fn update_mapping(&self, note: u8, edit: impl FnOnce(&mut NoteMapping)) -> bool {
        match self.table().lookup_mut(note) {
            Some(mapping) => {
                edit(mapping);
                true
            }
            None => false,
        }
    }

    pub fn remove_mapping(&self, note: u8) -> bool {
        let removed = self.table().remove(note);
        if removed {
            debug!(note, "mapping removed");
        }
        removed
    }

    pub fn mapping(&self, note: u8) -> Option<NoteMapping> {
        self.table().lookup(note).cloned()
    }

    /// Copies of every mapping in ascending note order.
    pub fn mappings(&self) -> Vec<NoteMapping> {
        self.table().iter().cloned().collect()
    }

    // --- Transport ---

    pub fn transport_config(&self) -> TransportConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a new destination and interval, reconnecting the transport.
    ///
    /// An unreachable destination leaves the transport disconnected; sends are
    /// dropped until a usable configuration is applied.
    pub fn set_transport_config(&self, config: TransportConfig) {
        let config = config.sanitized();
        // Held across all three steps so concurrent reconfigurations can't interleave.
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        self.interval_ms.store(config.interval_ms, Ordering::Relaxed);
        self.connect(&config);
        *current = config;
    }

    fn connect(&self, config: &TransportConfig) {
        if let Err(e) = self.transport.configure(&config.address, config.port) {
            warn!("OSC transport not connected: {e}");
        }
    }

    // --- Dispatch ---

    /// Run one dispatch tick now. Returns the number of messages sent.
    pub fn tick(&self) -> usize {
        self.dispatcher.tick()
    }

    /// Start ticking in the background at the configured interval.
    pub fn start(&self) -> DispatchLoop {
        DispatchLoop::start(self.dispatcher.clone(), self.interval_ms.clone())
    }

    // --- Persistence ---

    /// Serialize transport settings and all mappings.
    pub fn save_state(&self) -> Result<String> {
        let config = self.transport_config();
        state::encode(&config, &self.table())
    }

    /// Apply a persisted document.
    ///
    /// A present `oscSettings` section replaces the transport configuration;
    /// a present `oscMap` section replaces the whole table. Absent sections
    /// leave the current state untouched. An unparseable document changes nothing.
    pub fn load_state(&self, document: &str) -> Result<()> {
        let decoded = state::decode(document)?;

        if let Some(config) = decoded.transport {
            self.set_transport_config(config);
        }
        if let Some(mappings) = decoded.mappings {
            *self.table() = mappings;
        }
        info!(mappings = self.table().len(), "state loaded");

        if let Some(hook) = self
            .on_state_loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            hook();
        }
        Ok(())
    }

    pub fn save_state_file(&self, path: &Path) -> Result<()> {
        state::save_document(path, &self.save_state()?)
    }

    /// Load state from a file. Returns `false` if the file doesn't exist.
    pub fn load_state_file(&self, path: &Path) -> Result<bool> {
        match state::load_document(path)? {
            Some(document) => {
                self.load_state(&document)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Register a callback run after every successful state load.
    pub fn set_state_loaded_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .on_state_loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }

    fn table(&self) -> MutexGuard<'_, MappingTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}
