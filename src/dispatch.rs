//! Dispatcher — turns buffered note-ons into OSC messages once per tick.
//!
//! Each tick drains the event buffer; if anything was buffered it takes one
//! controller snapshot shared by every message of the tick, looks each event
//! up in the mapping table in arrival order and sends one message per mapped
//! note. Unmapped notes are skipped silently.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rosc::{OscMessage, OscType};
use tracing::{trace, warn};

use crate::controls::{ControllerSnapshot, ControllerSource};
use crate::mapping::{MappingTable, NoteMapping};
use crate::midi::EventBuffer;
use crate::osc::OscSink;

/// Build the message a mapping sends for one note-on.
///
/// Argument order: note (int32) if `use_note`, velocity (float32) if
/// `use_velocity`, one random draw if the random range is in use, then each
/// in-use knob range in index order evaluated at its snapshot value.
pub fn build_message<R: Rng + ?Sized>(
    mapping: &NoteMapping,
    velocity: f32,
    knobs: &ControllerSnapshot,
    rng: &mut R,
) -> OscMessage {
    let mut args = Vec::new();

    if mapping.use_note {
        args.push(OscType::Int(i32::from(mapping.note())));
    }
    if mapping.use_velocity {
        args.push(OscType::Float(velocity));
    }
    if mapping.random_range.in_use {
        let draw: f32 = rng.gen();
        args.push(mapping.random_range.evaluate(draw).to_osc());
    }
    for (range, &value) in mapping.knob_ranges.iter().zip(knobs.iter()) {
        if range.in_use {
            args.push(range.evaluate(value).to_osc());
        }
    }

    OscMessage {
        addr: mapping.path().to_string(),
        args,
    }
}

/// The drain-and-send cycle over the shared bridge state.
pub struct Dispatcher {
    table: Arc<Mutex<MappingTable>>,
    events: Arc<EventBuffer>,
    controls: Arc<dyn ControllerSource>,
    sink: Arc<dyn OscSink>,
    rng: Mutex<ChaCha8Rng>,
}

impl Dispatcher {
    pub fn new(
        table: Arc<Mutex<MappingTable>>,
        events: Arc<EventBuffer>,
        controls: Arc<dyn ControllerSource>,
        sink: Arc<dyn OscSink>,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            table,
            events,
            controls,
            sink,
            rng: Mutex::new(rng),
        }
    }

    /// Run one dispatch tick. Returns the number of messages sent.
    pub fn tick(&self) -> usize {
        let events = self.events.drain();
        if events.is_empty() {
            return 0;
        }

        let knobs = self.controls.snapshot();

        // Build under the table lock, send after releasing it.
        let messages: Vec<OscMessage> = {
            let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            events
                .iter()
                .filter_map(|event| {
                    let mapping = table.lookup(event.note)?;
                    Some(build_message(mapping, event.velocity, &knobs, &mut *rng))
                })
                .collect()
        };

        trace!(
            events = events.len(),
            messages = messages.len(),
            "dispatch tick"
        );
        for message in &messages {
            self.sink.send(message);
        }
        messages.len()
    }
}

/// Background thread ticking a [`Dispatcher`] at a configurable interval.
///
/// Ticks land on a fixed schedule of `interval_ms` steps. The interval is
/// re-read before every wait, so a change takes effect from the next tick.
/// Dropping the loop stops it.
pub struct DispatchLoop {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DispatchLoop {
    pub fn start(dispatcher: Arc<Dispatcher>, interval_ms: Arc<AtomicU64>) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();

        let thread = thread::spawn(move || {
            let mut next_tick = Instant::now();
            loop {
                let interval = Duration::from_millis(interval_ms.load(Ordering::Relaxed).max(1));
                // After a stall, resume from now instead of bursting missed ticks.
                next_tick = (next_tick + interval).max(Instant::now());
                if !park_until(next_tick, &stop_clone) {
                    break;
                }
                dispatcher.tick();
            }
        });

        Self {
            stop_flag,
            thread: Some(thread),
        }
    }

    /// Signal the loop to stop and wait for it.
    ///
    /// Returns `false` if the dispatch thread had died from a panic.
    pub fn stop(&mut self) -> bool {
        self.stop_flag.store(true, Ordering::Relaxed);
        let Some(thread) = self.thread.take() else {
            return true;
        };
        thread.thread().unpark();
        match thread.join() {
            Ok(()) => true,
            Err(_) => {
                warn!("dispatch thread panicked; no messages were sent after the panic");
                false
            }
        }
    }
}

/// Park until `deadline`, ignoring spurious wakeups. Returns `false` as soon
/// as `stop` is set.
fn park_until(deadline: Instant, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}

impl Drop for DispatchLoop {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
