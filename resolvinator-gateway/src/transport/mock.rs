//! Recording transport for tests.

use parking_lot::Mutex;
use resolvinator_core::error::NetworkError;
use serde_json::Value;
use std::sync::Arc;

use super::{Transport, TransportEvent, TransportSink};

#[derive(Debug, Default)]
struct MockState {
    opened: Vec<String>,
    headers: Vec<(String, String)>,
    sent: Vec<String>,
    sink: Option<TransportSink>,
    open: bool,
    closes: usize,
}

/// Transport that records what it is asked to do. Opening never completes
/// on its own; tests drive the outcome through [`MockHandle`].
#[derive(Debug, Default, Clone)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Test-side view of a [`MockTransport`].
#[derive(Debug, Clone)]
pub(crate) struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> (Self, MockHandle) {
        let transport = Self::default();
        let handle = MockHandle {
            state: Arc::clone(&transport.state),
        };
        (transport, handle)
    }
}

impl Transport for MockTransport {
    fn open(&mut self, url: &str, headers: &[(String, String)], sink: TransportSink) {
        let mut state = self.state.lock();
        state.opened.push(url.to_string());
        state.headers = headers.to_vec();
        state.sink = Some(sink);
        state.open = false;
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.open = false;
        state.closes += 1;
    }

    fn send(&mut self, text: String) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(NetworkError::ConnectionClosed {
                reason: "mock not open".to_string(),
            });
        }
        state.sent.push(text);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }
}

impl MockHandle {
    /// Number of `open` calls so far.
    pub(crate) fn open_count(&self) -> usize {
        self.state.lock().opened.len()
    }

    pub(crate) fn last_url(&self) -> Option<String> {
        self.state.lock().opened.last().cloned()
    }

    pub(crate) fn headers(&self) -> Vec<(String, String)> {
        self.state.lock().headers.clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Id of the most recent connection attempt.
    pub(crate) fn connection(&self) -> Option<u64> {
        self.state.lock().sink.as_ref().map(TransportSink::connection)
    }

    /// Reports an event for the most recent connection attempt.
    pub(crate) fn emit(&self, event: TransportEvent) {
        let mut state = self.state.lock();
        match &event {
            TransportEvent::Opened => state.open = true,
            TransportEvent::Closed { .. } => state.open = false,
            _ => {}
        }
        if let Some(sink) = &state.sink {
            sink.emit(event);
        }
    }

    /// Drains the frames written so far, parsed as JSON.
    pub(crate) fn take_sent(&self) -> Vec<Value> {
        std::mem::take(&mut self.state.lock().sent)
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }
}
