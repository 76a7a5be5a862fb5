//! Format-aware configuration loading.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use super::traits::{Configurable, Validatable};
use crate::error::ConfigError;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    #[default]
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Returns the canonical file extension.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Loads a configuration, applies environment overrides, then validates it.
///
/// # Example
///
/// ```rust,ignore
/// let config: ChannelConfig = ConfigLoader::new()
///     .with_env_prefix("RESOLVINATOR")
///     .load_file("client.toml")?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    validate: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that validates and applies no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            validate: true,
        }
    }

    /// Applies `<prefix>_*` environment overrides after parsing.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Turns validation after loading on or off.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Returns the environment prefix, if set.
    #[must_use]
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Loads a configuration file, detecting the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFormat` for an unknown extension or
    /// unparsable content, `ConfigError::FileReadError` if the file cannot
    /// be read, or the first validation failure.
    pub fn load_file<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = parse(&content, format, &path.display().to_string())?;
        self.finish(config)
    }

    /// Loads a configuration from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFormat` if the content cannot be parsed,
    /// or the first validation failure.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable,
    {
        let config = parse(content, format, "<string>")?;
        self.finish(config)
    }

    /// Renders a configuration in the given format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFormat` if serialization fails.
    pub fn serialize<T: Serialize>(config: &T, format: ConfigFormat) -> Result<String, ConfigError> {
        let rendered = match format {
            ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        rendered.map_err(|reason| ConfigError::InvalidFormat {
            path: "<serialize>".to_string(),
            reason: format!("{} serialization error: {reason}", format.extension()),
        })
    }

    fn finish<T>(&self, mut config: T) -> Result<T, ConfigError>
    where
        T: Configurable + Validatable,
    {
        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix);
        }
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }
}

fn parse<T: DeserializeOwned>(
    content: &str,
    format: ConfigFormat,
    origin: &str,
) -> Result<T, ConfigError> {
    let parsed = match format {
        ConfigFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
        }
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| format!("TOML parse error: {e}")),
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
        }
    };
    parsed.map_err(|reason| ConfigError::InvalidFormat {
        path: origin.to_string(),
        reason,
    })
}
