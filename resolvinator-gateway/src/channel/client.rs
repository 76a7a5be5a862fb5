//! Public façade over the connection loop.

use parking_lot::RwLock;
use resolvinator_core::config::Validatable;
use resolvinator_core::error::{ConfigError, NetworkError};
use resolvinator_core::traits::EventBroadcaster;
use resolvinator_core::types::{ChannelTopic, ConnectionState, ProjectId, StreamChannel};
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::config::ChannelConfig;
use super::emitter::{EventSource, EventStream};
use super::machine::ChannelCore;
use super::registry::SubscriptionSnapshot;
use super::router::MessageRouter;
use super::scheduler::IntervalScheduler;
use crate::transport::{Transport, TransportSignal, WebSocketTransport};

enum Command {
    Connect,
    Disconnect,
    SubscribeProject(ProjectId),
    UnsubscribeProject(ProjectId),
    SubscribeStream {
        stream: StreamChannel,
        params: Value,
    },
    SubscribeAll,
    Join {
        topic: ChannelTopic,
        params: Value,
    },
    Leave(ChannelTopic),
    Send {
        topic: ChannelTopic,
        event: String,
        payload: Value,
        reply: oneshot::Sender<Option<String>>,
    },
    Subscriptions(oneshot::Sender<SubscriptionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running channel client.
///
/// All operations are forwarded to a single task that owns the connection,
/// so they are applied in the order they were issued. Handles are cheap to
/// clone; the task stops on [`shutdown`](Self::shutdown) or when the last
/// handle is dropped. Event streams end when the task stops.
///
/// # Examples
///
/// ```no_run
/// use resolvinator_core::types::ProjectId;
/// use resolvinator_gateway::channel::{ChannelClient, ChannelConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ChannelConfig::builder()
///     .base_url("api.example.com")
///     .token("t0k3n")
///     .build();
/// let client = ChannelClient::builder(config).spawn()?;
///
/// let mut events = client.events();
/// client.subscribe_project(ProjectId::new(42)).await?;
/// client.connect().await?;
///
/// while let Some(event) = events.recv().await {
///     println!("{}: {event:?}", event.category());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelClient {
    commands: mpsc::Sender<Command>,
    events: EventSource,
    state: Arc<RwLock<ConnectionState>>,
}

impl ChannelClient {
    /// Starts building a client.
    #[must_use]
    pub fn builder(config: ChannelConfig) -> ChannelClientBuilder {
        ChannelClientBuilder::new(config)
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Returns true while connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Opens a stream of every event emitted from now on.
    ///
    /// The stream yields `None` once the client task has stopped.
    #[must_use]
    pub fn events(&self) -> EventStream {
        self.events.subscribe()
    }

    async fn command(&self, command: Command) -> Result<(), NetworkError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| NetworkError::NotRunning)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, NetworkError> {
        let (tx, rx) = oneshot::channel();
        self.command(command(tx)).await?;
        rx.await.map_err(|_| NetworkError::NotRunning)
    }

    /// Connects, resetting the reconnect budget. No-op if already connected.
    pub async fn connect(&self) -> Result<(), NetworkError> {
        self.command(Command::Connect).await
    }

    /// Closes the connection and stops reconnecting. Subscriptions are kept.
    pub async fn disconnect(&self) -> Result<(), NetworkError> {
        self.command(Command::Disconnect).await
    }

    /// Subscribes to a project's `risks:` and `project:` topics.
    pub async fn subscribe_project(&self, id: ProjectId) -> Result<(), NetworkError> {
        self.command(Command::SubscribeProject(id)).await
    }

    /// Leaves both topics of a project and forgets it.
    pub async fn unsubscribe_project(&self, id: ProjectId) -> Result<(), NetworkError> {
        self.command(Command::UnsubscribeProject(id)).await
    }

    /// Subscribes to one of the singleton streams.
    ///
    /// While disconnected the join is deferred to the next connection.
    pub async fn subscribe_channel(
        &self,
        stream: StreamChannel,
        params: Value,
    ) -> Result<(), NetworkError> {
        self.command(Command::SubscribeStream { stream, params }).await
    }

    /// Subscribes to news, events and system.
    pub async fn subscribe_all(&self) -> Result<(), NetworkError> {
        self.command(Command::SubscribeAll).await
    }

    /// Joins an arbitrary topic.
    pub async fn join(&self, topic: ChannelTopic, params: Value) -> Result<(), NetworkError> {
        self.command(Command::Join { topic, params }).await
    }

    /// Leaves an arbitrary topic.
    pub async fn leave(&self, topic: ChannelTopic) -> Result<(), NetworkError> {
        self.command(Command::Leave(topic)).await
    }

    /// Sends a frame with a fresh ref.
    ///
    /// Returns `Ok(None)` when not connected; the frame is dropped, not queued.
    pub async fn send(
        &self,
        topic: ChannelTopic,
        event: impl Into<String>,
        payload: Value,
    ) -> Result<Option<String>, NetworkError> {
        let event = event.into();
        self.request(|reply| Command::Send {
            topic,
            event,
            payload,
            reply,
        })
        .await
    }

    /// Copies the current subscription state.
    pub async fn subscriptions(&self) -> Result<SubscriptionSnapshot, NetworkError> {
        self.request(Command::Subscriptions).await
    }

    /// Closes the connection and stops the client task.
    pub async fn shutdown(&self) -> Result<(), NetworkError> {
        self.request(Command::Shutdown).await
    }
}

/// Builder for [`ChannelClient`].
pub struct ChannelClientBuilder {
    config: ChannelConfig,
    router: MessageRouter,
    broadcaster: Option<Arc<dyn EventBroadcaster>>,
    transport: Option<Box<dyn Transport>>,
}

impl ChannelClientBuilder {
    fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            router: MessageRouter::standard(),
            broadcaster: None,
            transport: None,
        }
    }

    /// Replaces the standard router.
    #[must_use]
    pub fn router(mut self, router: MessageRouter) -> Self {
        self.router = router;
        self
    }

    /// Sets the broadcaster notified of transport errors.
    #[must_use]
    pub fn broadcaster(mut self, broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Replaces the WebSocket transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Validates the configuration and starts the client task.
    ///
    /// Must be called within a tokio runtime. The client starts disconnected.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn spawn(self) -> Result<ChannelClient, ConfigError> {
        self.config.validate()?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer.max(1));

        let transport = self
            .transport
            .unwrap_or_else(|| Box::new(WebSocketTransport::new(self.config.connect_timeout())));
        let scheduler = IntervalScheduler::new(self.config.reconnect_interval(), tick_tx);
        let core = ChannelCore::new(
            self.config,
            transport,
            Box::new(scheduler),
            self.router,
            signal_tx,
        )
        .with_broadcaster(self.broadcaster);

        let client = ChannelClient {
            commands: command_tx,
            events: core.emitter().source(),
            state: core.state_handle(),
        };
        tokio::spawn(run(core, command_rx, signal_rx, tick_rx));
        Ok(client)
    }
}

impl std::fmt::Debug for ChannelClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClientBuilder")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("broadcaster", &self.broadcaster.is_some())
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

async fn run(
    mut core: ChannelCore,
    mut commands: mpsc::Receiver<Command>,
    mut signals: mpsc::UnboundedReceiver<TransportSignal>,
    mut ticks: mpsc::UnboundedReceiver<()>,
) {
    debug!("Channel client task started");
    loop {
        // Transport signals drain before commands so a command always sees
        // every event reported ahead of it.
        tokio::select! {
            biased;
            Some(signal) = signals.recv() => core.handle_transport(signal),
            Some(()) = ticks.recv() => core.on_reconnect_tick(),
            command = commands.recv() => match command {
                Some(command) => {
                    if apply(&mut core, command).is_break() {
                        break;
                    }
                }
                None => {
                    core.shutdown();
                    break;
                }
            },
        }
    }
    info!(state = %core.state(), "Channel client task stopped");
}

fn apply(core: &mut ChannelCore, command: Command) -> ControlFlow<()> {
    match command {
        Command::Connect => core.connect(),
        Command::Disconnect => core.disconnect(),
        Command::SubscribeProject(id) => core.subscribe_project(id),
        Command::UnsubscribeProject(id) => core.unsubscribe_project(id),
        Command::SubscribeStream { stream, params } => core.subscribe_stream(stream, params),
        Command::SubscribeAll => core.subscribe_all(),
        Command::Join { topic, params } => core.join(topic, params),
        Command::Leave(topic) => core.leave(&topic),
        Command::Send {
            topic,
            event,
            payload,
            reply,
        } => {
            let _ = reply.send(core.send(&topic, &event, payload));
        }
        Command::Subscriptions(reply) => {
            let _ = reply.send(core.subscriptions());
        }
        Command::Shutdown(reply) => {
            core.shutdown();
            let _ = reply.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportEvent;
    use crate::transport::mock::{MockHandle, MockTransport};
    use resolvinator_core::events::{ClientEvent, DomainEvent, LifecycleEvent};
    use serde_json::json;

    fn spawn() -> (ChannelClient, MockHandle) {
        let config = ChannelConfig::builder()
            .base_url("ws://localhost:4000")
            .token("secret")
            .build();
        let (transport, mock) = MockTransport::new();
        let client = ChannelClient::builder(config)
            .transport(transport)
            .spawn()
            .unwrap();
        (client, mock)
    }

    async fn next_lifecycle(events: &mut EventStream) -> LifecycleEvent {
        loop {
            if let Some(ClientEvent::Lifecycle(event)) = events.recv().await {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_config() {
        let err = ChannelClient::builder(ChannelConfig::default()).spawn().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[tokio::test]
    async fn test_connect_subscribe_and_receive() {
        let (client, mock) = spawn();
        let mut events = client.events();

        client.subscribe_project(ProjectId::new(42)).await.unwrap();
        client.connect().await.unwrap();
        client.subscriptions().await.unwrap();
        assert_eq!(mock.open_count(), 1);
        assert_eq!(
            mock.last_url().unwrap(),
            "ws://localhost:4000/socket/websocket?token=secret&vsn=2.0.0&client_version=1.0.0"
        );

        mock.emit(TransportEvent::Opened);
        client.subscriptions().await.unwrap();
        assert!(client.is_connected());
        let joins = mock.take_sent();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0]["topic"], "risks:42");

        mock.emit(TransportEvent::Text(
            json!({"topic": "risks:42", "event": "risk:deleted", "payload": {"id": 5}, "ref": null})
                .to_string(),
        ));
        let deleted = loop {
            if let Some(ClientEvent::Domain(event)) = events.recv().await {
                break event;
            }
        };
        assert_eq!(deleted, DomainEvent::ResourceDeleted { id: 5 });
    }

    #[tokio::test]
    async fn test_subscribe_while_disconnected_is_deferred() {
        let (client, mock) = spawn();
        client
            .subscribe_channel(StreamChannel::System, json!({}))
            .await
            .unwrap();
        let snapshot = client.subscriptions().await.unwrap();
        assert_eq!(snapshot.streams, vec![StreamChannel::System]);
        assert!(mock.take_sent().is_empty());

        client.connect().await.unwrap();
        client.subscriptions().await.unwrap();
        mock.emit(TransportEvent::Opened);
        client.subscriptions().await.unwrap();
        let sent = mock.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["topic"], "system");
    }

    #[tokio::test]
    async fn test_send_when_disconnected_is_dropped() {
        let (client, mock) = spawn();
        let topic = ChannelTopic::new("user:1").unwrap();
        assert_eq!(client.send(topic, "new_message", json!({})).await.unwrap(), None);
        assert!(mock.take_sent().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_reports_lifecycle() {
        let (client, mock) = spawn();
        let mut events = client.events();
        client.connect().await.unwrap();
        client.subscriptions().await.unwrap();
        mock.emit(TransportEvent::Opened);

        assert_eq!(
            next_lifecycle(&mut events).await,
            LifecycleEvent::StateChanged {
                state: ConnectionState::Connecting
            }
        );
        assert_eq!(
            next_lifecycle(&mut events).await,
            LifecycleEvent::StateChanged {
                state: ConnectionState::Connected
            }
        );
        assert_eq!(next_lifecycle(&mut events).await, LifecycleEvent::Connected);

        client.disconnect().await.unwrap();
        assert_eq!(
            next_lifecycle(&mut events).await,
            LifecycleEvent::StateChanged {
                state: ConnectionState::Disconnected
            }
        );
        assert_eq!(next_lifecycle(&mut events).await, LifecycleEvent::Disconnected);
        assert_eq!(mock.close_count(), 1);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let (client, mock) = spawn();
        client.shutdown().await.unwrap();
        assert_eq!(mock.close_count(), 1);
        assert!(matches!(client.connect().await, Err(NetworkError::NotRunning)));
    }

    #[tokio::test]
    async fn test_event_stream_ends_after_shutdown() {
        let (client, _mock) = spawn();
        let mut events = client.events();
        client.shutdown().await.unwrap();

        let drained = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while events.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
        assert!(client.events().recv().await.is_none());
    }
}
