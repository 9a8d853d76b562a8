//! OSC transport — fire-and-forget UDP sender with a swappable destination.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::{PoisonError, RwLock};

use rosc::{encoder, OscMessage, OscPacket};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// Anything that accepts outgoing OSC messages. Delivery is best-effort.
pub trait OscSink: Send + Sync {
    fn send(&self, message: &OscMessage);
}

struct Connection {
    socket: UdpSocket,
    target: SocketAddr,
}

/// UDP transport to a single configured destination.
///
/// Reconfiguring replaces the socket; sends issued afterwards go to the new
/// destination. While unconfigured, sends are dropped.
pub struct UdpTransport {
    connection: RwLock<Option<Connection>>,
}

impl UdpTransport {
    /// A transport with no destination yet.
    pub fn new() -> Self {
        Self {
            connection: RwLock::new(None),
        }
    }

    /// Create a transport connected to `address:port`.
    pub fn connect(address: &str, port: u16) -> Result<Self> {
        let transport = Self::new();
        transport.configure(address, port)?;
        Ok(transport)
    }

    /// Tear down the current destination and open a socket for `address:port`.
    ///
    /// On failure the transport is left disconnected.
    pub fn configure(&self, address: &str, port: u16) -> Result<()> {
        self.disconnect();

        let target = (address, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| Error::Destination {
                address: address.to_string(),
                port,
            })?;
        let bind_addr = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr)?;

        info!(destination = %target, "OSC transport connected");
        *self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Connection { socket, target });
        Ok(())
    }

    pub fn disconnect(&self) {
        self.connection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Current destination, if connected.
    pub fn destination(&self) -> Option<SocketAddr> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.target)
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl OscSink for UdpTransport {
    fn send(&self, message: &OscMessage) {
        let guard = self
            .connection
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(connection) = guard.as_ref() else {
            trace!(addr = %message.addr, "no OSC destination, message dropped");
            return;
        };

        let packet = match encoder::encode(&OscPacket::Message(message.clone())) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(addr = %message.addr, "failed to encode OSC message: {e}");
                return;
            }
        };

        if let Err(e) = connection.socket.send_to(&packet, connection.target) {
            debug!(destination = %connection.target, "OSC send failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{decoder, OscType};
    use std::time::Duration;

    fn receiver() -> UdpSocket {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        socket
    }

    fn receive(socket: &UdpSocket) -> Option<OscMessage> {
        let mut buf = [0u8; 1024];
        let (size, _) = socket.recv_from(&mut buf).ok()?;
        match decoder::decode_udp(&buf[..size]).ok()?.1 {
            OscPacket::Message(msg) => Some(msg),
            OscPacket::Bundle(_) => None,
        }
    }

    fn message(addr: &str) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args: vec![OscType::Int(60), OscType::Float(0.5)],
        }
    }

    #[test]
    fn unconfigured_send_is_dropped() {
        let transport = UdpTransport::new();
        assert!(transport.destination().is_none());
        transport.send(&message("/nowhere"));
    }

    #[test]
    fn send_and_receive() {
        let rx = receiver();
        let port = rx.local_addr().unwrap().port();
        let transport = UdpTransport::connect("127.0.0.1", port).unwrap();

        transport.send(&message("/lead"));

        let received = receive(&rx).unwrap();
        assert_eq!(received, message("/lead"));
    }

    #[test]
    fn reconfigure_switches_destination() {
        let first = receiver();
        let second = receiver();
        let transport =
            UdpTransport::connect("127.0.0.1", first.local_addr().unwrap().port()).unwrap();

        transport
            .configure("127.0.0.1", second.local_addr().unwrap().port())
            .unwrap();
        transport.send(&message("/moved"));

        assert_eq!(receive(&second).unwrap().addr, "/moved");
        first
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();
        assert!(receive(&first).is_none());
    }

    #[test]
    fn unresolvable_destination_leaves_transport_disconnected() {
        let rx = receiver();
        let transport =
            UdpTransport::connect("127.0.0.1", rx.local_addr().unwrap().port()).unwrap();

        let result = transport.configure("not a host name", 9000);
        assert!(matches!(result, Err(Error::Destination { .. })));
        assert!(transport.destination().is_none());
        transport.send(&message("/dropped"));
    }
}
