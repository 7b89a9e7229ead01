//! Full client/server sessions: in-memory and over loopback TCP.

use std::collections::HashMap;
use std::io::{self, BufReader, Read};
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use quote_client::{ClientConfig, ClientSession, OutboundEnd};
use quote_common::transport::memory::duplex;
use quote_common::transport::tcp::{JsonLineSink, JsonLineSource, split_stream};
use quote_common::{PriceUpdate, StreamState, SubscriptionRequest};
use quote_server::{GeneratorKind, QuoteListener, ServerConfig, ServerSession, SessionConfig};

/// Input source the test types into line by line.
struct TypedInput(Receiver<Vec<u8>>);

impl Read for TypedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.recv() {
            Ok(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(_) => Ok(0),
        }
    }
}

fn keyboard() -> (Sender<Vec<u8>>, BufReader<TypedInput>) {
    let (tx, rx) = unbounded();
    (tx, BufReader::new(TypedInput(rx)))
}

fn type_line(keys: &Sender<Vec<u8>>, line: &str) {
    keys.send(format!("{}\n", line).into_bytes()).unwrap();
}

fn no_pacing() -> ClientConfig {
    ClientConfig {
        pacing: Duration::ZERO,
    }
}

fn fast_server_config() -> SessionConfig {
    SessionConfig {
        tick_interval: Duration::from_millis(50),
        max_lifetime: None,
    }
}

/// Collect rendered updates until every symbol was seen `at_least` times.
fn wait_for_updates(rendered: &Receiver<PriceUpdate>, symbols: &[&str], at_least: usize) -> Vec<PriceUpdate> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    loop {
        let counts = count_by_symbol(&seen);
        if symbols.iter().all(|s| counts.get(*s).copied().unwrap_or(0) >= at_least) {
            return seen;
        }
        let left = deadline.saturating_duration_since(Instant::now());
        seen.push(rendered.recv_timeout(left).expect("updates stopped arriving"));
    }
}

fn count_by_symbol(updates: &[PriceUpdate]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for update in updates {
        *counts.entry(update.symbol.clone()).or_default() += 1;
    }
    counts
}

fn assert_timestamps_non_decreasing(updates: &[PriceUpdate]) {
    let mut last: HashMap<&str, &str> = HashMap::new();
    for update in updates {
        if let Some(previous) = last.insert(update.symbol.as_str(), update.timestamp.as_str()) {
            assert!(previous <= update.timestamp.as_str(), "{} went back in time", update.symbol);
        }
    }
}

#[test]
fn subscribe_two_symbols_then_exit_in_memory() {
    let ((client_tx, client_rx), (server_tx, server_rx)) = duplex::<SubscriptionRequest, PriceUpdate>();
    let server = ServerSession::new(server_tx, server_rx, GeneratorKind::Uniform.build(), fast_server_config());
    let server_lifecycle = server.lifecycle();
    let registry = server.registry();
    let server = thread::spawn(move || server.run());

    let client = ClientSession::new(client_tx, client_rx, no_pacing());
    let client_lifecycle = client.lifecycle();
    let (rendered_tx, rendered) = unbounded();
    let (keys, input) = keyboard();
    let client = thread::spawn(move || {
        client.run(input, move |update: &PriceUpdate| {
            rendered_tx.send(update.clone()).unwrap();
        })
    });

    type_line(&keys, "AAPL");
    type_line(&keys, "GOOG");
    let mut updates = wait_for_updates(&rendered, &["AAPL", "GOOG"], 2);
    type_line(&keys, "exit");

    let summary = client.join().unwrap().unwrap();
    server.join().unwrap().unwrap();
    updates.extend(rendered.try_iter());

    assert_eq!(summary.sent, 2);
    assert_eq!(summary.outbound_end, OutboundEnd::Exit);
    assert_eq!(summary.received, updates.len());
    let counts = count_by_symbol(&updates);
    assert_eq!(counts.len(), 2, "unexpected symbols: {:?}", counts.keys());
    for symbol in ["AAPL", "GOOG"] {
        let n = counts[symbol];
        assert!((2..=10).contains(&n), "{} updates for {}", n, symbol);
    }
    assert_timestamps_non_decreasing(&updates);
    assert_eq!(registry.snapshot().unwrap(), vec!["AAPL", "GOOG"]);
    assert_eq!(client_lifecycle.state(), StreamState::Closed);
    assert_eq!(server_lifecycle.state(), StreamState::Closed);
}

#[test]
fn immediate_exit_ends_both_sides_cleanly() {
    let ((client_tx, client_rx), (server_tx, server_rx)) = duplex::<SubscriptionRequest, PriceUpdate>();
    let server = ServerSession::new(server_tx, server_rx, GeneratorKind::Uniform.build(), fast_server_config());
    let server_lifecycle = server.lifecycle();
    let registry = server.registry();
    let server = thread::spawn(move || server.run());

    let client = ClientSession::new(client_tx, client_rx, no_pacing());
    let summary = client
        .run(io::Cursor::new("exit\nAAPL\n"), |_: &PriceUpdate| {
            panic!("no updates expected");
        })
        .unwrap();

    server.join().unwrap().unwrap();
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.received, 0);
    assert!(registry.is_empty().unwrap());
    assert_eq!(server_lifecycle.state(), StreamState::Closed);
}

#[test]
fn exhausted_input_half_closes_like_exit() {
    let ((client_tx, client_rx), (server_tx, server_rx)) = duplex::<SubscriptionRequest, PriceUpdate>();
    let server = ServerSession::new(server_tx, server_rx, GeneratorKind::Walk.build(), fast_server_config());
    let registry = server.registry();
    let server = thread::spawn(move || server.run());

    let client = ClientSession::new(client_tx, client_rx, no_pacing());
    let summary = client.run(io::Cursor::new("MSFT\nMSFT\n"), |_: &PriceUpdate| {}).unwrap();

    server.join().unwrap().unwrap();
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.outbound_end, OutboundEnd::Exhausted);
    assert_eq!(registry.snapshot().unwrap(), vec!["MSFT"]);
}

#[test]
fn subscribe_then_exit_over_tcp() {
    let config = ServerConfig {
        session: fast_server_config(),
        generator: GeneratorKind::Uniform,
    };
    let listener = QuoteListener::bind("127.0.0.1:0", config).unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || listener.serve());

    let (sink, source): (JsonLineSink<SubscriptionRequest>, JsonLineSource<PriceUpdate>) =
        split_stream(TcpStream::connect(addr).unwrap()).unwrap();
    let client = ClientSession::new(sink, source, ClientConfig {
        pacing: Duration::from_millis(10),
    });
    let lifecycle = client.lifecycle();
    let (rendered_tx, rendered) = unbounded();
    let (keys, input) = keyboard();
    let client = thread::spawn(move || {
        client.run(input, move |update: &PriceUpdate| {
            rendered_tx.send(update.clone()).unwrap();
        })
    });

    type_line(&keys, "AAPL");
    type_line(&keys, "  ");
    type_line(&keys, "GOOG");
    let mut updates = wait_for_updates(&rendered, &["AAPL", "GOOG"], 2);
    type_line(&keys, "exit");

    let summary = client.join().unwrap().unwrap();
    updates.extend(rendered.try_iter());
    assert_eq!(summary.sent, 2);
    assert_eq!(lifecycle.state(), StreamState::Closed);
    let counts = count_by_symbol(&updates);
    assert_eq!(counts.len(), 2);
    assert_timestamps_non_decreasing(&updates);
}
