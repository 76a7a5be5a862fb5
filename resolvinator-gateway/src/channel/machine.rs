//! Connection state machine.
//!
//! [`ChannelCore`] is the single writer of the connection state and the
//! channel registry. It is driven from one loop that feeds it consumer
//! commands, transport signals and reconnect ticks one at a time, so a
//! subscribe can never interleave with a replay.

use parking_lot::RwLock;
use resolvinator_core::events::{EventPriority, LifecycleEvent};
use resolvinator_core::traits::EventBroadcaster;
use resolvinator_core::types::{ChannelTopic, ConnectionState, ProjectId, StreamChannel};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::ChannelConfig;
use super::emitter::EventEmitter;
use super::frame::OutboundFrame;
use super::registry::{ChannelRegistry, SubscriptionSnapshot};
use super::router::MessageRouter;
use super::scheduler::ReconnectScheduler;
use super::validator::FrameValidator;
use crate::transport::{Transport, TransportEvent, TransportSignal, TransportSink};

/// Title of the broadcast raised for transport errors.
const ERROR_BROADCAST_TITLE: &str = "WebSocket Error";

pub(crate) struct ChannelCore {
    config: ChannelConfig,
    transport: Box<dyn Transport>,
    scheduler: Box<dyn ReconnectScheduler>,
    registry: ChannelRegistry,
    validator: FrameValidator,
    router: MessageRouter,
    emitter: EventEmitter,
    broadcaster: Option<Arc<dyn EventBroadcaster>>,
    state: ConnectionState,
    shared_state: Arc<RwLock<ConnectionState>>,
    attempts: u32,
    halted: bool,
    exhausted_notified: bool,
    signals: mpsc::UnboundedSender<TransportSignal>,
    last_connection: u64,
    current: Option<u64>,
}

impl ChannelCore {
    pub(crate) fn new(
        config: ChannelConfig,
        transport: Box<dyn Transport>,
        scheduler: Box<dyn ReconnectScheduler>,
        router: MessageRouter,
        signals: mpsc::UnboundedSender<TransportSignal>,
    ) -> Self {
        let validator = FrameValidator::new(
            config.rate_limit_max,
            config.rate_limit_window(),
            config.max_payload_bytes,
        );
        let emitter = EventEmitter::new(config.event_buffer);
        Self {
            config,
            transport,
            scheduler,
            registry: ChannelRegistry::new(),
            validator,
            router,
            emitter,
            broadcaster: None,
            state: ConnectionState::Disconnected,
            shared_state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            attempts: 0,
            halted: false,
            exhausted_notified: false,
            signals,
            last_connection: 0,
            current: None,
        }
    }

    pub(crate) fn with_broadcaster(mut self, broadcaster: Option<Arc<dyn EventBroadcaster>>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub(crate) fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub(crate) fn state_handle(&self) -> Arc<RwLock<ConnectionState>> {
        Arc::clone(&self.shared_state)
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "Connection state changed");
        self.state = state;
        *self.shared_state.write() = state;
        self.emitter.emit(LifecycleEvent::StateChanged { state });
    }

    /// Consumer-initiated connect: re-arms reconnection with a fresh budget.
    pub(crate) fn connect(&mut self) {
        self.halted = false;
        self.attempts = 0;
        self.exhausted_notified = false;
        self.open_transport();
    }

    fn open_transport(&mut self) {
        if self.is_connected() {
            debug!("Already connected");
            return;
        }
        self.set_state(ConnectionState::Connecting);

        let url = match self.config.connection_url() {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Cannot build connection URL");
                self.emitter.emit(LifecycleEvent::Error {
                    message: e.to_string(),
                });
                self.set_state(ConnectionState::Error);
                return;
            }
        };

        self.last_connection += 1;
        let connection = self.last_connection;
        self.current = Some(connection);
        info!(
            url = %self.config.masked_connection_url(),
            connection,
            "Connecting to channel server"
        );
        let sink = TransportSink::new(connection, self.signals.clone());
        self.transport.open(url.as_str(), &self.config.headers(), sink);
    }

    /// Stops reconnection and closes the transport.
    pub(crate) fn disconnect(&mut self) {
        self.halted = true;
        self.scheduler.stop();
        self.transport.close();
        self.current = None;
        self.registry.connection_lost();
        if self.state != ConnectionState::Disconnected {
            info!("Disconnected by client");
            self.set_state(ConnectionState::Disconnected);
            self.emitter.emit(LifecycleEvent::Disconnected);
        }
    }

    pub(crate) fn handle_transport(&mut self, signal: TransportSignal) {
        if self.current != Some(signal.connection) {
            debug!(connection = signal.connection, "Ignoring event from stale connection");
            return;
        }

        match signal.event {
            TransportEvent::Opened => self.on_opened(),
            TransportEvent::Closed { reason } => self.on_closed(reason),
            TransportEvent::Error(e) => self.on_error(&e.to_string()),
            TransportEvent::Text(text) => self.on_text(&text),
        }
    }

    fn on_opened(&mut self) {
        info!("Connected to channel server");
        self.set_state(ConnectionState::Connected);
        self.emitter.emit(LifecycleEvent::Connected);
        self.attempts = 0;
        self.exhausted_notified = false;
        self.scheduler.stop();

        for frame in self.registry.replay() {
            self.write(&frame);
        }
    }

    fn on_closed(&mut self, reason: Option<String>) {
        info!(reason = reason.as_deref().unwrap_or("none"), "Connection closed");
        self.current = None;
        self.registry.connection_lost();
        self.set_state(ConnectionState::Disconnected);
        self.emitter.emit(LifecycleEvent::Disconnected);

        if self.halted {
            return;
        }
        if self.attempts < self.config.max_reconnect_attempts {
            info!(
                attempt = self.attempts + 1,
                max_attempts = self.config.max_reconnect_attempts,
                delay = ?self.config.reconnect_interval(),
                "Scheduling reconnect"
            );
            self.scheduler.start();
        } else {
            self.exhaust();
        }
    }

    fn on_error(&mut self, message: &str) {
        error!(error = message, "Transport error");
        self.set_state(ConnectionState::Error);
        self.emitter.emit(LifecycleEvent::Error {
            message: message.to_string(),
        });
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast_news(ERROR_BROADCAST_TITLE, message, EventPriority::High);
        }
    }

    fn on_text(&mut self, text: &str) {
        let frame = match self.validator.validate(text, Instant::now()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping inbound frame");
                return;
            }
        };
        for event in self.router.route(frame) {
            self.emitter.emit(event);
        }
    }

    pub(crate) fn on_reconnect_tick(&mut self) {
        if self.halted || !self.scheduler.is_running() {
            return;
        }
        if self.state == ConnectionState::Connecting {
            debug!("Reconnect attempt still in flight");
            return;
        }
        if self.attempts >= self.config.max_reconnect_attempts {
            self.exhaust();
            return;
        }
        self.attempts += 1;
        info!(
            attempt = self.attempts,
            max_attempts = self.config.max_reconnect_attempts,
            "Reconnecting"
        );
        self.open_transport();
    }

    fn exhaust(&mut self) {
        self.scheduler.stop();
        if self.exhausted_notified {
            return;
        }
        self.exhausted_notified = true;
        warn!(attempts = self.attempts, "Max reconnection attempts reached");
        self.emitter.emit(LifecycleEvent::ReconnectExhausted {
            attempts: self.attempts,
        });
    }

    fn write(&mut self, frame: &OutboundFrame) {
        if let Err(e) = self.transport.send(frame.encode()) {
            warn!(topic = %frame.topic, event = %frame.event, error = %e, "Failed to send frame");
        }
    }

    fn write_all(&mut self, frames: Vec<OutboundFrame>) {
        for frame in frames {
            self.write(&frame);
        }
    }

    pub(crate) fn subscribe_project(&mut self, id: ProjectId) {
        let frames = self.registry.subscribe_project(id, self.is_connected());
        self.write_all(frames);
    }

    pub(crate) fn unsubscribe_project(&mut self, id: ProjectId) {
        let frames = self.registry.unsubscribe_project(id, self.is_connected());
        self.write_all(frames);
    }

    pub(crate) fn subscribe_stream(&mut self, stream: StreamChannel, params: Value) {
        let frame = self.registry.subscribe_stream(stream, params, self.is_connected());
        self.write_all(frame.into_iter().collect());
    }

    pub(crate) fn subscribe_all(&mut self) {
        for stream in StreamChannel::ALL {
            self.subscribe_stream(stream, Value::Object(Map::new()));
        }
    }

    pub(crate) fn join(&mut self, topic: ChannelTopic, params: Value) {
        let frame = self.registry.join(topic, params, self.is_connected());
        self.write_all(frame.into_iter().collect());
    }

    pub(crate) fn leave(&mut self, topic: &ChannelTopic) {
        let frame = self.registry.leave(topic, self.is_connected());
        self.write_all(frame.into_iter().collect());
    }

    /// Sends an arbitrary frame; returns its ref, or `None` if not connected.
    pub(crate) fn send(&mut self, topic: &ChannelTopic, event: &str, payload: Value) -> Option<String> {
        if !self.is_connected() {
            debug!(topic = %topic, event, "Not connected, dropping send");
            return None;
        }
        let reference = self.registry.next_ref();
        let frame = OutboundFrame::new(topic.as_str(), event, payload, reference.clone());
        self.write(&frame);
        Some(reference)
    }

    pub(crate) fn subscriptions(&self) -> SubscriptionSnapshot {
        self.registry.snapshot()
    }

    /// Tears everything down when the client loop exits.
    pub(crate) fn shutdown(&mut self) {
        self.halted = true;
        self.scheduler.stop();
        self.transport.close();
        self.current = None;
    }
}
