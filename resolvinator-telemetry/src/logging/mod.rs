//! Structured logging system for Resolvinator.
//!
//! Provides configurable logging with support for:
//! - JSON and pretty-print formats
//! - Multiple output targets (stdout, file)
//! - Log rotation
//! - Sensitive data masking

mod config;
mod writer;

pub use config::{LogConfig, LogFormat, LogOutput, RotationConfig};
pub use writer::{MaskingMakeWriter, MaskingWriter};

use crate::masking::SensitiveDataMasker;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, MakeWriter, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// File name prefix of rolling log files.
const LOG_FILE_NAME: &str = "resolvinator.log";

/// Initialize the logging system with the given configuration.
///
/// Returns guards that must be kept alive for the duration of the program
/// to ensure all file logs are flushed.
///
/// # Example
///
/// ```no_run
/// use resolvinator_telemetry::logging::{init_logging, LogConfig};
///
/// let config = LogConfig::default();
/// let _guards = init_logging(&config).expect("Failed to initialize logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<Vec<WorkerGuard>, LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| LoggingError::InvalidConfig(format!("level '{}': {e}", config.level)))?,
    };

    let masker = Arc::new(SensitiveDataMasker::new());
    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

    for output in &config.outputs {
        match output {
            LogOutput::Stdout => {
                let writer = masked(config, std::io::stdout, &masker);
                layers.push(create_layer(config, config.format, writer, true));
            }
            LogOutput::File { path, rotation } => {
                std::fs::create_dir_all(path)?;
                let appender = match rotation.unwrap_or(RotationConfig::Daily) {
                    RotationConfig::Hourly => tracing_appender::rolling::hourly(path, LOG_FILE_NAME),
                    RotationConfig::Daily => tracing_appender::rolling::daily(path, LOG_FILE_NAME),
                    RotationConfig::Never => tracing_appender::rolling::never(path, LOG_FILE_NAME),
                };
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                let writer = masked(config, non_blocking, &masker);
                // Files are always JSON so they stay machine-readable.
                layers.push(create_layer(config, LogFormat::Json, writer, false));
                guards.push(guard);
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guards)
}

fn masked<M>(config: &LogConfig, writer: M, masker: &Arc<SensitiveDataMasker>) -> BoxMakeWriter
where
    M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if config.mask_sensitive {
        BoxMakeWriter::new(MaskingMakeWriter::new(writer, Arc::clone(masker)))
    } else {
        BoxMakeWriter::new(writer)
    }
}

fn create_layer<S>(
    config: &LogConfig,
    format: LogFormat,
    writer: BoxMakeWriter,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info);

    match format {
        LogFormat::Json => base.json().flatten_event(true).boxed(),
        LogFormat::Pretty => base.with_ansi(ansi).pretty().boxed(),
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid logging configuration: {0}")]
    InvalidConfig(String),

    /// A global subscriber is already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}
