//! Transport abstraction between the channel state machine and the network.
//!
//! A [`Transport`] opens, closes and writes; everything it observes flows
//! back as [`TransportEvent`]s through the [`TransportSink`] handed to
//! [`Transport::open`]. Each sink is stamped with the id of the connection
//! attempt it belongs to, so events from a superseded attempt can be told
//! apart from the live one.

mod websocket;

#[cfg(test)]
pub(crate) mod mock;

pub use websocket::WebSocketTransport;

use resolvinator_core::error::NetworkError;
use tokio::sync::mpsc;

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is open.
    Opened,
    /// The connection is closed, or could not be established.
    Closed {
        /// Close reason, if one is known.
        reason: Option<String>,
    },
    /// The transport failed.
    Error(NetworkError),
    /// A text frame arrived.
    Text(String),
}

/// A [`TransportEvent`] tagged with the connection attempt it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSignal {
    /// Connection attempt id.
    pub connection: u64,
    /// What happened.
    pub event: TransportEvent,
}

/// Delivers events of one connection attempt to the channel state machine.
#[derive(Debug, Clone)]
pub struct TransportSink {
    connection: u64,
    tx: mpsc::UnboundedSender<TransportSignal>,
}

impl TransportSink {
    /// Creates a sink for connection attempt `connection`.
    #[must_use]
    pub fn new(connection: u64, tx: mpsc::UnboundedSender<TransportSignal>) -> Self {
        Self { connection, tx }
    }

    /// Returns the connection attempt id.
    #[must_use]
    pub fn connection(&self) -> u64 {
        self.connection
    }

    /// Forwards an event. Dropped silently once the client has shut down.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(TransportSignal {
            connection: self.connection,
            event,
        });
    }
}

/// Full-duplex text transport.
///
/// Implementations must not block: `open` starts the connection in the
/// background and reports the outcome through the sink.
pub trait Transport: Send {
    /// Starts connecting to `url`, replacing any previous connection.
    fn open(&mut self, url: &str, headers: &[(String, String)], sink: TransportSink);

    /// Closes the connection or abandons a pending attempt.
    fn close(&mut self);

    /// Queues a text frame for sending.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::ConnectionClosed` if no connection is open.
    fn send(&mut self, text: String) -> Result<(), NetworkError>;

    /// Returns true while the connection is open.
    fn is_open(&self) -> bool;
}
