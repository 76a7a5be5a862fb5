//! Channel client configuration.

use resolvinator_core::config::{Configurable, EnvOverride, Validatable, ValidationContext, Validator};
use resolvinator_core::error::{ConfigError, NetworkError};
use resolvinator_telemetry::masking::SensitiveDataMasker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Configuration for [`ChannelClient`](crate::channel::ChannelClient).
///
/// # Examples
///
/// ```
/// use resolvinator_gateway::channel::ChannelConfig;
///
/// let config = ChannelConfig::builder()
///     .base_url("api.example.com")
///     .token("t0k3n")
///     .build();
///
/// let url = config.connection_url().unwrap();
/// assert_eq!(
///     url.as_str(),
///     "wss://api.example.com/socket/websocket?token=t0k3n&vsn=2.0.0&client_version=1.0.0"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Server host or WebSocket base URL.
    pub base_url: String,

    /// Authentication token.
    #[serde(default)]
    pub token: String,

    /// Client version sent in the query string and headers.
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Channel protocol version (`vsn`).
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Path of the socket endpoint.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Handshake timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Fixed delay between reconnection attempts in milliseconds.
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Automatic reconnection attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Length of the inbound rate window in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Inbound frames accepted per rate window.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,

    /// Ceiling on the serialized payload of an inbound frame.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Capacity of the command queue into the client task.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Extra handshake headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_client_version() -> String {
    "1.0.0".to_string()
}

fn default_protocol_version() -> String {
    "2.0.0".to_string()
}

fn default_socket_path() -> String {
    "/socket/websocket".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_interval_ms() -> u64 {
    5_000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024
}

fn default_event_buffer() -> usize {
    1024
}

fn default_command_buffer() -> usize {
    100
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            client_version: default_client_version(),
            protocol_version: default_protocol_version(),
            socket_path: default_socket_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            rate_limit_max: default_rate_limit_max(),
            max_payload_bytes: default_max_payload_bytes(),
            event_buffer: default_event_buffer(),
            command_buffer: default_command_buffer(),
            headers: BTreeMap::new(),
        }
    }
}

impl ChannelConfig {
    /// Creates a new builder for `ChannelConfig`.
    #[must_use]
    pub fn builder() -> ChannelConfigBuilder {
        ChannelConfigBuilder::default()
    }

    /// Returns the handshake timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the reconnection interval.
    #[must_use]
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Returns the inbound rate window.
    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// Returns the base URL with a secure scheme.
    ///
    /// A bare host gets `wss://`; `ws://` is upgraded to `wss://` unless
    /// the host is `localhost`. Trailing slashes are dropped.
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("ws://") {
            if is_localhost(rest) {
                base.to_string()
            } else {
                format!("wss://{rest}")
            }
        } else if base.starts_with("wss://") {
            base.to_string()
        } else {
            format!("wss://{base}")
        }
    }

    /// Builds the socket URL carrying the token and version parameters.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if the base URL does not parse.
    pub fn connection_url(&self) -> Result<Url, NetworkError> {
        let raw = format!("{}{}", self.normalized_base_url(), self.socket_path);
        let mut url = Url::parse(&raw).map_err(|e| NetworkError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("token", &self.token)
            .append_pair("vsn", &self.protocol_version)
            .append_pair("client_version", &self.client_version);
        Ok(url)
    }

    /// Returns the connection URL with the token masked, for logging.
    #[must_use]
    pub fn masked_connection_url(&self) -> String {
        let url = self
            .connection_url()
            .map_or_else(|_| self.normalized_base_url(), String::from);
        SensitiveDataMasker::new().mask_url_param(&url, "token")
    }

    /// Returns the handshake headers: bearer authorization, client version,
    /// content type, then any extras.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {}", self.token)),
            ("X-Client-Version".to_string(), self.client_version.clone()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        headers
    }

    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        let mut validator = Validator::new(ctx);
        validator
            .require_non_empty("base_url", &self.base_url)
            .websocket_url("base_url", &self.base_url)
            .require_non_empty("token", &self.token)
            .require_non_empty("protocol_version", &self.protocol_version)
            .custom(
                "socket_path",
                || self.socket_path.starts_with('/'),
                "Must start with '/'",
            )
            .positive("connect_timeout_ms", &self.connect_timeout_ms)
            .positive("reconnect_interval_ms", &self.reconnect_interval_ms)
            .in_range("max_reconnect_attempts", &self.max_reconnect_attempts, &0, &1_000)
            .positive("rate_limit_window_ms", &self.rate_limit_window_ms)
            .positive("rate_limit_max", &self.rate_limit_max)
            .positive("max_payload_bytes", &self.max_payload_bytes)
            .positive("event_buffer", &self.event_buffer)
            .positive("command_buffer", &self.command_buffer);
    }
}

fn is_localhost(rest: &str) -> bool {
    let host = rest.split(['/', '?']).next().unwrap_or_default();
    let host = host.rsplit_once(':').map_or(host, |(host, _port)| host);
    host.eq_ignore_ascii_case("localhost")
}

impl Validatable for ChannelConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();
        ctx.enter("channel");
        self.validate_with_context(&mut ctx);
        ctx.exit();
        ctx.into_result()
    }
}

impl Configurable for ChannelConfig {
    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_BASE_URL"), &mut self.base_url);
        EnvOverride::apply_string(&format!("{prefix}_TOKEN"), &mut self.token);
        EnvOverride::apply_string(&format!("{prefix}_CLIENT_VERSION"), &mut self.client_version);
        EnvOverride::apply_number(
            &format!("{prefix}_RECONNECT_INTERVAL_MS"),
            &mut self.reconnect_interval_ms,
        );
        EnvOverride::apply_number(
            &format!("{prefix}_MAX_RECONNECT_ATTEMPTS"),
            &mut self.max_reconnect_attempts,
        );
        EnvOverride::apply_map(&format!("{prefix}_HEADERS"), &mut self.headers);
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        [
            "BASE_URL",
            "TOKEN",
            "CLIENT_VERSION",
            "RECONNECT_INTERVAL_MS",
            "MAX_RECONNECT_ATTEMPTS",
            "HEADERS",
        ]
        .iter()
        .map(|name| format!("{prefix}_{name}"))
        .collect()
    }
}

/// Builder for `ChannelConfig`.
#[derive(Debug, Default)]
pub struct ChannelConfigBuilder {
    config: ChannelConfig,
}

impl ChannelConfigBuilder {
    /// Sets the server host or base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the authentication token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Sets the client version.
    #[must_use]
    pub fn client_version(mut self, version: impl Into<String>) -> Self {
        self.config.client_version = version.into();
        self
    }

    /// Sets the socket path.
    #[must_use]
    pub fn socket_path(mut self, path: impl Into<String>) -> Self {
        self.config.socket_path = path.into();
        self
    }

    /// Sets the handshake timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = duration_ms(timeout);
        self
    }

    /// Sets the reconnection interval.
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval_ms = duration_ms(interval);
        self
    }

    /// Sets the number of automatic reconnection attempts.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the inbound rate limit.
    #[must_use]
    pub fn rate_limit(mut self, max_frames: u32, window: Duration) -> Self {
        self.config.rate_limit_max = max_frames;
        self.config.rate_limit_window_ms = duration_ms(window);
        self
    }

    /// Sets the inbound payload ceiling.
    #[must_use]
    pub fn max_payload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_payload_bytes = bytes;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.config.event_buffer = capacity;
        self
    }

    /// Adds a handshake header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Builds the `ChannelConfig`.
    #[must_use]
    pub fn build(self) -> ChannelConfig {
        self.config
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
