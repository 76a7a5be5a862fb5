use crate::events::EventPriority;

/// Sink for application-level news broadcasts.
///
/// # Example
///
/// ```
/// use resolvinator_core::events::EventPriority;
/// use resolvinator_core::traits::EventBroadcaster;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl EventBroadcaster for Recorder {
///     fn broadcast_news(&self, title: &str, message: &str, _priority: EventPriority) {
///         self.0.lock().unwrap().push(format!("{title}: {message}"));
///     }
/// }
///
/// let recorder = Recorder::default();
/// recorder.broadcast_news("WebSocket Error", "reset by peer", EventPriority::High);
/// assert_eq!(recorder.0.lock().unwrap().len(), 1);
/// ```
pub trait EventBroadcaster: Send + Sync {
    /// Publishes a news item to every interested party.
    fn broadcast_news(&self, title: &str, message: &str, priority: EventPriority);
}

/// Broadcaster that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBroadcaster;

impl EventBroadcaster for NoopBroadcaster {
    fn broadcast_news(&self, _title: &str, _message: &str, _priority: EventPriority) {}
}
