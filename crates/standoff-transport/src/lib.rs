//! WebSocket transport for Standoff.
//!
//! A player connection has two independent jobs: reading requests, and
//! writing replies plus server-initiated pushes that can arrive at any
//! time. [`WebSocketConnection::split`] hands each job its own half so a
//! slow reader never holds up a push and vice versa.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{
    FrameReader, FrameWriter, WebSocketConnection, WebSocketListener,
};

use std::fmt;

/// Opaque identifier for a connection, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_round_trips_inner_value() {
        assert_eq!(ConnectionId::new(42).into_inner(), 42);
    }
}
