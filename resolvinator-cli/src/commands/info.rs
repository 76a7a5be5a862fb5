//! Client information.

use resolvinator_core::types::StreamChannel;
use resolvinator_gateway::channel::ChannelConfig;

/// Prints version and protocol defaults.
pub fn run() {
    let defaults = ChannelConfig::default();

    println!("Resolvinator Channel Client");
    println!("===========================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Protocol vsn: {}", defaults.protocol_version);
    println!("Socket path: {}", defaults.socket_path);
    println!();
    println!("Defaults:");
    println!("  Connect timeout: {} ms", defaults.connect_timeout_ms);
    println!(
        "  Reconnect: every {} ms, at most {} attempts",
        defaults.reconnect_interval_ms, defaults.max_reconnect_attempts
    );
    println!(
        "  Rate limit: {} frames per {} ms",
        defaults.rate_limit_max, defaults.rate_limit_window_ms
    );
    println!("  Max payload: {} bytes", defaults.max_payload_bytes);
    println!();
    println!("Topics:");
    println!("  risks:<project>    risk changes");
    println!("  project:<project>  mitigations and tasks");
    println!("  user:<user>        chat and presence");
    for stream in StreamChannel::ALL {
        println!("  {stream}");
    }
}
