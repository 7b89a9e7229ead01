//! Line source for the outbound loop.
//!
//! Reading stdin blocks without a timeout, so lines are read on a dedicated thread and
//! handed over through a rendezvous channel. The outbound loop can then `select!` on
//! input together with shutdown signals instead of being stuck in `read_line`.
use std::io::BufRead;
use std::thread;

use crossbeam_channel::{Receiver, bounded};
use log::{debug, warn};
use quote_common::Result;

/// Spawn a reader thread over `input`.
///
/// The returned receiver yields one line at a time and disconnects once `input` is
/// exhausted or fails. The thread also stops as soon as the receiver is dropped.
pub fn spawn_line_reader<I>(input: I) -> Result<Receiver<String>>
where
    I: BufRead + Send + 'static,
{
    let (tx, rx) = bounded::<String>(0);
    thread::Builder::new()
        .name("input-reader".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            debug!("Outbound loop finished, input reader stopping");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        return;
                    }
                }
            }
            debug!("Input exhausted");
        })?;
    Ok(rx)
}
