//! OSC transport configuration — destination and dispatch interval.

use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// Where messages go and how often the dispatcher ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub address: String,
    pub port: u16,
    /// Dispatch tick period in milliseconds, never below 1.
    pub interval_ms: u64,
}

impl TransportConfig {
    pub fn new(address: impl Into<String>, port: u16, interval_ms: u64) -> Self {
        Self {
            address: address.into(),
            port,
            interval_ms,
        }
        .sanitized()
    }

    /// Build a config from free-text settings fields.
    ///
    /// An empty address becomes `127.0.0.1`; an empty or unparsable port
    /// becomes `1234` and a negative one `0`; an empty or unparsable interval
    /// becomes `100`. The interval is then clamped to at least 1 ms.
    pub fn from_inputs(address: &str, port: &str, interval: &str) -> Self {
        let address = address.trim();
        let address = if address.is_empty() {
            DEFAULT_ADDRESS
        } else {
            address
        };

        let port = match port.trim().parse::<i64>() {
            Ok(p) if p < 0 => 0,
            Ok(p) => u16::try_from(p).unwrap_or(DEFAULT_PORT),
            Err(_) => DEFAULT_PORT,
        };

        let interval_ms = match interval.trim().parse::<i64>() {
            Ok(ms) => ms.max(1) as u64,
            Err(_) => DEFAULT_INTERVAL_MS,
        };

        Self::new(address, port, interval_ms)
    }

    /// Apply the invariants: non-empty address, interval of at least 1 ms.
    pub fn sanitized(mut self) -> Self {
        if self.address.trim().is_empty() {
            self.address = DEFAULT_ADDRESS.to_string();
        }
        self.interval_ms = self.interval_ms.max(1);
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}
