//! Fan-out of client events to any number of consumers.

use resolvinator_core::events::{ClientEvent, EventCategory};
use std::collections::HashSet;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

/// Broadcasts every [`ClientEvent`] to all live subscribers.
///
/// Emitting with no subscribers is not an error; the event is dropped.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventEmitter {
    /// Creates an emitter whose subscribers may lag by up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Delivers `event` to every subscriber.
    pub fn emit(&self, event: impl Into<ClientEvent>) {
        let _ = self.sender.send(event.into());
    }

    /// Opens a stream receiving every event emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            categories: None,
        }
    }

    /// Returns a subscribe-only handle that does not keep the stream open.
    #[must_use]
    pub fn source(&self) -> EventSource {
        EventSource {
            sender: self.sender.downgrade(),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Opens streams on an [`EventEmitter`] without owning it.
///
/// Streams end once the emitter is dropped, even while sources remain.
#[derive(Debug, Clone)]
pub struct EventSource {
    sender: broadcast::WeakSender<ClientEvent>,
}

impl EventSource {
    /// Opens a stream receiving every event emitted from now on.
    ///
    /// After the emitter is gone the stream is already closed.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        match self.sender.upgrade() {
            Some(sender) => EventStream {
                receiver: sender.subscribe(),
                categories: None,
            },
            None => EventStream::closed(),
        }
    }
}

/// A consumer's view of the event stream, optionally limited to some categories.
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<ClientEvent>,
    categories: Option<HashSet<EventCategory>>,
}

impl EventStream {
    fn closed() -> Self {
        let (_, receiver) = broadcast::channel(1);
        Self {
            receiver,
            categories: None,
        }
    }

    /// Restricts the stream to the given categories.
    #[must_use]
    pub fn filtered(mut self, categories: impl IntoIterator<Item = EventCategory>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    fn wants(&self, event: &ClientEvent) -> bool {
        self.categories
            .as_ref()
            .is_none_or(|set| set.contains(&event.category()))
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the client has shut down. Events missed because
    /// this stream fell behind are skipped with a warning.
    pub async fn recv(&mut self) -> Option<ClientEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event stream lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<ClientEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event stream lagged, events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains every buffered event.
    pub fn drain(&mut self) -> Vec<ClientEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
