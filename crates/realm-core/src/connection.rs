//! The transport seam: how the core talks back to a client.
//!
//! Framing and socket lifecycle live outside the core. A [`Connection`]
//! only needs ordered, fire-and-forget delivery and a way to hang up.

use realm_types::ServerMessage;
use tokio::sync::mpsc;

/// A client connection as seen by the simulation.
pub trait Connection: Send + Sync + core::fmt::Debug {
    /// Queue a message for delivery. Never blocks; delivery order matches
    /// call order.
    fn send(&self, message: ServerMessage);

    /// Terminate the connection.
    fn close(&self);
}

/// What a [`ChannelConnection`] hands to the transport task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A message to deliver.
    Message(ServerMessage),
    /// The core closed the connection.
    Close,
}

/// A connection backed by an unbounded tokio channel. The receiving half
/// is drained by whatever owns the socket.
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelConnection {
    /// Create a connection and the receiver its transport drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Connection for ChannelConnection {
    fn send(&self, message: ServerMessage) {
        // A dropped receiver means the transport is gone; the disconnect
        // reaches the world separately.
        let _ = self.tx.send(Outbound::Message(message));
    }

    fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}
