//! WebSocket transport over tokio-tungstenite.

use futures::{SinkExt, StreamExt};
use resolvinator_core::error::NetworkError;
use resolvinator_telemetry::masking::SensitiveDataMasker;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use super::{Transport, TransportEvent, TransportSink};

/// One live or pending connection.
struct Link {
    outgoing: mpsc::UnboundedSender<String>,
    shutdown: Option<oneshot::Sender<()>>,
    open: Arc<AtomicBool>,
}

/// [`Transport`] backed by a tokio-tungstenite WebSocket.
///
/// Each `open` spawns a task that owns the socket; frames queued through
/// `send` are written by that task. Must be used from within a tokio runtime.
pub struct WebSocketTransport {
    connect_timeout: Duration,
    link: Option<Link>,
}

impl WebSocketTransport {
    /// Creates a transport that gives up on a handshake after `connect_timeout`.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            link: None,
        }
    }

    fn build_request(url: &str, headers: &[(String, String)]) -> Result<Request, NetworkError> {
        let invalid = |reason: String| NetworkError::InvalidUrl {
            url: SensitiveDataMasker::new().mask_url_param(url, "token"),
            reason,
        };

        let mut request = url.into_client_request().map_err(|e| invalid(e.to_string()))?;
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("header '{name}': {e}")))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| invalid(format!("header '{name}': {e}")))?;
            request.headers_mut().insert(name, value);
        }
        Ok(request)
    }

    async fn run_connection(
        request: Request,
        connect_timeout: Duration,
        sink: TransportSink,
        mut outgoing: mpsc::UnboundedReceiver<String>,
        mut shutdown: oneshot::Receiver<()>,
        open: Arc<AtomicBool>,
    ) {
        let connect = timeout(connect_timeout, connect_async(request));
        let ws_stream = tokio::select! {
            _ = &mut shutdown => {
                debug!(connection = sink.connection(), "Connection attempt abandoned");
                return;
            }
            result = connect => match result {
                Ok(Ok((stream, _response))) => stream,
                Ok(Err(e)) => {
                    warn!(connection = sink.connection(), error = %e, "WebSocket connect failed");
                    sink.emit(TransportEvent::Error(NetworkError::ConnectionFailed {
                        reason: e.to_string(),
                    }));
                    sink.emit(TransportEvent::Closed { reason: Some(e.to_string()) });
                    return;
                }
                Err(_) => {
                    let timeout_ms = u64::try_from(connect_timeout.as_millis()).unwrap_or(u64::MAX);
                    warn!(connection = sink.connection(), timeout_ms, "WebSocket connect timed out");
                    sink.emit(TransportEvent::Error(NetworkError::Timeout { timeout_ms }));
                    sink.emit(TransportEvent::Closed { reason: Some("connect timeout".to_string()) });
                    return;
                }
            }
        };

        open.store(true, Ordering::SeqCst);
        info!(connection = sink.connection(), "WebSocket connected");
        sink.emit(TransportEvent::Opened);

        let (mut writer, mut reader) = ws_stream.split();

        let reason = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!(connection = sink.connection(), "Shutdown signal received");
                    let _ = writer.close().await;
                    break Some("closed by client".to_string());
                }

                Some(text) = outgoing.recv() => {
                    if let Err(e) = writer.send(Message::Text(text)).await {
                        error!(error = %e, "Failed to send frame");
                        sink.emit(TransportEvent::Error(NetworkError::WebSocket {
                            reason: e.to_string(),
                        }));
                        break Some(e.to_string());
                    }
                }

                incoming = reader.next() => match incoming {
                    Some(Ok(Message::Text(text))) => sink.emit(TransportEvent::Text(text)),
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = writer.send(Message::Pong(data)).await {
                            warn!(error = %e, "Failed to send pong");
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(connection = sink.connection(), "Server sent close frame");
                        break frame.map(|f| f.reason.to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        sink.emit(TransportEvent::Error(NetworkError::WebSocket {
                            reason: e.to_string(),
                        }));
                        break Some(e.to_string());
                    }
                    None => break None,
                }
            }
        };

        open.store(false, Ordering::SeqCst);
        sink.emit(TransportEvent::Closed { reason });
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, url: &str, headers: &[(String, String)], sink: TransportSink) {
        self.close();

        let request = match Self::build_request(url, headers) {
            Ok(request) => request,
            Err(e) => {
                sink.emit(TransportEvent::Error(e));
                sink.emit(TransportEvent::Closed { reason: None });
                return;
            }
        };

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let open = Arc::new(AtomicBool::new(false));

        tokio::spawn(Self::run_connection(
            request,
            self.connect_timeout,
            sink,
            outgoing_rx,
            shutdown_rx,
            Arc::clone(&open),
        ));

        self.link = Some(Link {
            outgoing: outgoing_tx,
            shutdown: Some(shutdown_tx),
            open,
        });
    }

    fn close(&mut self) {
        if let Some(mut link) = self.link.take()
            && let Some(shutdown) = link.shutdown.take()
        {
            let _ = shutdown.send(());
        }
    }

    fn send(&mut self, text: String) -> Result<(), NetworkError> {
        let link = self
            .link
            .as_ref()
            .filter(|link| link.open.load(Ordering::SeqCst))
            .ok_or(NetworkError::ConnectionClosed {
                reason: "Not connected".to_string(),
            })?;

        link.outgoing
            .send(text)
            .map_err(|_| NetworkError::ConnectionClosed {
                reason: "Send channel closed".to_string(),
            })
    }

    fn is_open(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| link.open.load(Ordering::SeqCst))
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportSignal;
    use tokio::net::TcpListener;

    fn sink() -> (TransportSink, mpsc::UnboundedReceiver<TransportSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TransportSink::new(1, tx), rx)
    }

    #[test]
    fn test_build_request_sets_headers() {
        let headers = vec![
            ("Authorization".to_string(), "Bearer abc".to_string()),
            ("X-Client-Version".to_string(), "1.0.0".to_string()),
        ];
        let request =
            WebSocketTransport::build_request("wss://example.com/socket/websocket", &headers)
                .unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer abc");
        assert_eq!(request.headers()["x-client-version"], "1.0.0");
    }

    #[test]
    fn test_build_request_masks_token_on_error() {
        let err = WebSocketTransport::build_request("not a url?token=supersecret123", &[])
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl { .. }));
        assert!(!err.to_string().contains("supersecret123"));
    }

    #[tokio::test]
    async fn test_invalid_url_reports_error_then_closed() {
        let mut transport = WebSocketTransport::new(Duration::from_secs(1));
        let (sink, mut rx) = sink();
        transport.open("not a url", &[], sink);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.event, TransportEvent::Error(NetworkError::InvalidUrl { .. })));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.event, TransportEvent::Closed { reason: None });
        assert!(!transport.is_open());
    }

    #[test]
    fn test_send_without_connection_fails() {
        let mut transport = WebSocketTransport::new(Duration::from_secs(1));
        let err = transport.send("{}".to_string()).unwrap_err();
        assert!(matches!(err, NetworkError::ConnectionClosed { .. }));
    }

    #[tokio::test]
    async fn test_loopback_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(r#"{"topic":"system"}"#.to_string()))
                .await
                .unwrap();
            // Echo one frame back, then close.
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                ws.send(Message::Text(text)).await.unwrap();
            }
            ws.close(None).await.unwrap();
        });

        let mut transport = WebSocketTransport::new(Duration::from_secs(5));
        let (sink, mut rx) = sink();
        transport.open(&format!("ws://{addr}/socket/websocket"), &[], sink);

        assert_eq!(rx.recv().await.unwrap().event, TransportEvent::Opened);
        assert!(transport.is_open());
        assert_eq!(
            rx.recv().await.unwrap().event,
            TransportEvent::Text(r#"{"topic":"system"}"#.to_string())
        );

        transport.send("ping-frame".to_string()).unwrap();
        assert_eq!(
            rx.recv().await.unwrap().event,
            TransportEvent::Text("ping-frame".to_string())
        );

        let closed = rx.recv().await.unwrap();
        assert!(matches!(closed.event, TransportEvent::Closed { .. }));
        server.await.unwrap();
    }
}
