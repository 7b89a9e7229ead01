//! Command-line arguments for the Quote Client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quote_common::net::{DEFAULT_HOST, PACING_DELAY, STREAM_PORT, addr};

use crate::session::ClientConfig;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address of the price stream server.
    #[clap(long, default_value_t = addr(DEFAULT_HOST, STREAM_PORT))]
    pub server: String,

    /// Delay in milliseconds after each subscription sent.
    #[clap(long, default_value_t = PACING_DELAY.as_millis() as u64)]
    pub pacing_ms: u64,

    /// Read symbols from this file (one per line) instead of stdin.
    /// The sending side is closed when the file ends or an `exit` line is read.
    #[clap(long)]
    pub symbols_file: Option<String>,
}

impl Args {
    /// Session settings derived from the arguments.
    pub fn to_config(&self) -> ClientConfig {
        ClientConfig {
            pacing: Duration::from_millis(self.pacing_ms),
        }
    }

    /// Normalized symbols file path, if one was given.
    pub fn symbols_path(&self) -> Option<PathBuf> {
        self.symbols_file.as_deref().map(normalize_path)
    }

    /// Server address without stray quotes or whitespace.
    pub fn server_addr(&self) -> String {
        self.server.trim().replace('"', "")
    }
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
