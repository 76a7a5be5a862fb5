//! Settings file of the command-line client.

use resolvinator_core::config::{ConfigLoader, Configurable, EnvOverride, Validatable};
use resolvinator_core::error::ConfigError;
use std::path::Path;
use resolvinator_gateway::channel::ChannelConfig;
use resolvinator_telemetry::logging::LogConfig;
use serde::{Deserialize, Serialize};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "RESOLVINATOR";

/// Channel and logging settings, loadable from YAML, TOML or JSON.
///
/// ```yaml
/// channel:
///   base_url: api.example.com
///   token: t0k3n
/// logging:
///   level: debug
///   format: pretty
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Channel client configuration.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,
}

impl Settings {
    /// Loads settings from `path`, or starts from defaults when no file is
    /// given. Environment overrides apply either way.
    ///
    /// Validation is left to the caller so command-line flags can fill in
    /// missing fields first.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => ConfigLoader::new()
                .with_env_prefix(ENV_PREFIX)
                .with_validation(false)
                .load_file(path),
            None => {
                let mut settings = Self::default();
                settings.apply_env_overrides(ENV_PREFIX);
                Ok(settings)
            }
        }
    }

    /// Applies `--base-url` and `--token` on top of the loaded values.
    pub fn override_connection(&mut self, base_url: Option<String>, token: Option<String>) {
        if let Some(url) = base_url {
            self.channel.base_url = url;
        }
        if let Some(token) = token {
            self.channel.token = token;
        }
    }
}

impl Validatable for Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        self.channel.validate()
    }
}

impl Configurable for Settings {
    fn apply_env_overrides(&mut self, prefix: &str) {
        self.channel.apply_env_overrides(prefix);
        EnvOverride::apply_string(&format!("{prefix}_LOG_LEVEL"), &mut self.logging.level);
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        let mut names = ChannelConfig::env_var_names(prefix);
        names.push(format!("{prefix}_LOG_LEVEL"));
        names
    }
}
