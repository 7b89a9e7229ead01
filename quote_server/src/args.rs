//! Command-line arguments for the Quote Server.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::time::Duration;

use clap::Parser;
use quote_common::net::{BIND_HOST, STREAM_PORT, TICK_INTERVAL, addr};
use quote_common::{Result, StreamError};

use crate::listener::ServerConfig;
use crate::model::price::GeneratorKind;
use crate::session::SessionConfig;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on for price stream connections.
    #[clap(long, default_value_t = addr(BIND_HOST, STREAM_PORT))]
    pub bind: String,

    /// Broadcast period in milliseconds.
    #[clap(long, default_value_t = TICK_INTERVAL.as_millis() as u64)]
    pub tick_ms: u64,

    /// Close each session after this many seconds, even if the client is still connected.
    #[clap(long)]
    pub max_session_secs: Option<u64>,

    /// Price generator used for every session.
    #[clap(long, value_enum, default_value_t = GeneratorKind::Uniform)]
    pub generator: GeneratorKind,
}

impl Args {
    /// Validate and convert into the listener configuration.
    pub fn to_config(&self) -> Result<ServerConfig> {
        if self.tick_ms == 0 {
            return Err(StreamError::Config("--tick-ms must be positive".to_string()));
        }
        if self.max_session_secs == Some(0) {
            return Err(StreamError::Config(
                "--max-session-secs must be positive".to_string(),
            ));
        }
        Ok(ServerConfig {
            session: SessionConfig {
                tick_interval: Duration::from_millis(self.tick_ms),
                max_lifetime: self.max_session_secs.map(Duration::from_secs),
            },
            generator: self.generator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_server() {
        let args = Args::try_parse_from(["quote_server"]).unwrap();
        assert_eq!(args.bind, "0.0.0.0:50051");
        let config = args.to_config().unwrap();
        assert_eq!(config.session.tick_interval, Duration::from_secs(2));
        assert_eq!(config.session.max_lifetime, None);
        assert_eq!(config.generator, GeneratorKind::Uniform);
    }

    #[test]
    fn overrides_are_applied() {
        let args = Args::try_parse_from([
            "quote_server",
            "--bind",
            "127.0.0.1:6000",
            "--tick-ms",
            "250",
            "--max-session-secs",
            "30",
            "--generator",
            "walk",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.session.tick_interval, Duration::from_millis(250));
        assert_eq!(config.session.max_lifetime, Some(Duration::from_secs(30)));
        assert_eq!(config.generator, GeneratorKind::Walk);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let args = Args::try_parse_from(["quote_server", "--tick-ms", "0"]).unwrap();
        assert!(matches!(args.to_config(), Err(StreamError::Config(_))));
    }
}
