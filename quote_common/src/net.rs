//! Shared networking constants and helpers used by client and server.
use std::time::Duration;

/// TCP port of the bidirectional price stream.
pub const STREAM_PORT: u16 = 50051;
/// Host the client connects to when none is given.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Interface the server binds when none is given.
pub const BIND_HOST: &str = "0.0.0.0";
/// Period of the server broadcast tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(2000);
/// Delay the client waits after each subscription it sends.
pub const PACING_DELAY: Duration = Duration::from_millis(500);

/// Helper to format an IPv4 address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
