//! Configuration check.

use anyhow::{Context, Result};
use clap::Parser;
use resolvinator_core::config::{ConfigFormat, ConfigLoader, Configurable, Validatable};
use resolvinator_telemetry::masking::SensitiveDataMasker;

use crate::settings::{ENV_PREFIX, Settings};

/// Arguments for the check-config command
#[derive(Parser)]
pub struct CheckArgs {
    /// Also print the effective settings as YAML, secrets masked
    #[arg(long)]
    pub dump: bool,
}

/// Validates the settings and prints what the client would use.
pub fn run(args: &CheckArgs, settings: &Settings) -> Result<()> {
    settings.validate().context("Configuration is invalid")?;

    let channel = &settings.channel;
    let masker = SensitiveDataMasker::new();

    println!("Configuration OK");
    println!();
    println!("Endpoint: {}", channel.masked_connection_url());
    println!("Headers:");
    for (name, value) in channel.headers() {
        let shown = match value.strip_prefix("Bearer ") {
            Some(token) if name.eq_ignore_ascii_case("authorization") => {
                format!("Bearer {}", masker.mask_value(token))
            }
            _ => masker.mask_string(&value).into_owned(),
        };
        println!("  {name}: {shown}");
    }
    println!(
        "Reconnect: every {} ms, at most {} attempts",
        channel.reconnect_interval_ms, channel.max_reconnect_attempts
    );
    println!(
        "Rate limit: {} frames per {} ms",
        channel.rate_limit_max, channel.rate_limit_window_ms
    );
    println!("Log level: {}", settings.logging.level);
    println!();
    println!("Environment overrides:");
    for name in Settings::env_var_names(ENV_PREFIX) {
        let status = if std::env::var_os(&name).is_some() { "set" } else { "unset" };
        println!("  {name} ({status})");
    }

    if args.dump {
        let mut redacted = settings.clone();
        redacted.channel.token = masker.mask_value(&redacted.channel.token);
        println!();
        println!("{}", ConfigLoader::serialize(&redacted, ConfigFormat::Yaml)?);
    }

    Ok(())
}
