//! Quote Client — connects to the price stream server, sends a subscription for every
//! symbol typed on stdin (or read from a file), and logs every price update the server
//! pushes back. Typing `exit` (or reaching the end of the input) closes the sending
//! side; updates keep arriving until the server ends the stream.
//!
//! Usage example (CLI):
//! ```bash
//! quote_client --server 127.0.0.1:50051
//! quote_client --server 127.0.0.1:50051 --symbols-file ./symbols.txt --pacing-ms 0
//! ```
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::TcpStream;

use clap::Parser;
use crossbeam_channel::unbounded;
use log::{error, info};
use quote_client::args::Args;
use quote_client::{ClientSession, log_update};
use quote_common::transport::tcp::{JsonLineSink, JsonLineSource, split_stream};
use quote_common::{PriceUpdate, Result, StreamError, SubscriptionRequest};

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let (interrupt_tx, interrupt_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down client...");
        let _ = interrupt_tx.send(());
    })
    .map_err(|e| StreamError::Config(format!("Error setting Ctrl+C handler: {}", e)))?;

    let input: Box<dyn BufRead + Send> = match args.symbols_path() {
        Some(path) => {
            info!("Reading symbols from {}", path.display());
            Box::new(BufReader::new(File::open(path)?))
        }
        None => {
            info!("Enter stock symbols to subscribe (e.g., AAPL). Type 'exit' to quit:");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    let server = args.server_addr();
    info!("Connecting to price stream server at {}", server);
    let stream = TcpStream::connect(&server)?;
    let (sink, source): (JsonLineSink<SubscriptionRequest>, JsonLineSource<PriceUpdate>) =
        split_stream(stream)?;

    let session = ClientSession::new(sink, source, args.to_config()).with_interrupt(interrupt_rx);
    match session.run(input, log_update) {
        Ok(summary) => {
            info!(
                "Done: {} subscription(s) sent, {} update(s) received",
                summary.sent, summary.received
            );
            Ok(())
        }
        Err(e) => {
            error!("Client session failed: {}", e);
            Err(e)
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
