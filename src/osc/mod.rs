//! OSC (Open Sound Control) output — transport configuration and the UDP sender.

pub mod config;
pub mod transport;

pub use config::TransportConfig;
pub use transport::{OscSink, UdpTransport};
