//! Price stream server binary.
//!
//! Listens on a TCP socket (`0.0.0.0:50051` by default) and serves one bidirectional
//! session per connection: the client streams `{"symbol": ...}` subscription lines,
//! the server pushes a price update line for every subscribed symbol on each tick.
//! The session ends when the client half-closes its sending direction or the
//! connection fails; the server keeps accepting other clients either way.
//!
//! Usage example (CLI):
//! ```bash
//! RUST_LOG=debug quote_server --bind 127.0.0.1:50051 --tick-ms 2000 --generator walk
//! ```
use clap::Parser;
use log::info;
use quote_common::Result;
use quote_server::QuoteListener;
use quote_server::args::Args;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let config = args.to_config()?;
    let listener = QuoteListener::bind(&args.bind, config)?;
    info!("Price stream server listening on {}", listener.local_addr()?);
    listener.serve()
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
