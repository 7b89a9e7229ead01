//! Client side of one bidirectional price stream.
//!
//! Two loops share the stream:
//!
//! - Inbound loop (spawned thread) — receives `PriceUpdate`s and hands each one to the
//!   render callback. End-of-stream ends only this loop; a receive error is fatal and
//!   moves the session to `Failed`.
//! - Outbound loop (calling thread) — see [`crate::sender`]. Once it stops, the client
//!   half-closes its sending direction and waits for the server to end the stream,
//!   while the inbound loop keeps rendering updates.
//!
//! State: `Open → OutboundClosed → Closed` on the normal path, `Failed` on a receive
//! error, a send error, or a failed half-close.
use std::fmt;
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, never, select};
use log::{error, info, warn};
use quote_common::net::PACING_DELAY;
use quote_common::{
    Lifecycle, MessageSink, MessageSource, PriceUpdate, Result, StreamError, SubscriptionRequest,
    TerminationSignal,
};

use crate::input::spawn_line_reader;
use crate::sender::{OutboundEnd, OutboundSignals, SubscriptionSender};

/// Client session settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Delay after each subscription sent.
    pub pacing: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pacing: PACING_DELAY,
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Subscription requests sent.
    pub sent: usize,
    /// Price updates rendered.
    pub received: usize,
    /// Why the outbound loop stopped.
    pub outbound_end: OutboundEnd,
}

/// Raises the signal when dropped, also when the inbound loop panics.
struct RaiseOnDrop(TerminationSignal);

impl Drop for RaiseOnDrop {
    fn drop(&mut self) {
        self.0.raise();
    }
}

/// One client-side stream session.
pub struct ClientSession<S, R> {
    sink: S,
    source: R,
    lifecycle: Lifecycle,
    config: ClientConfig,
    interrupt: Receiver<()>,
}

impl<S, R> fmt::Debug for ClientSession<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("state", &self.lifecycle.state())
            .field("config", &self.config)
            .finish()
    }
}

impl<S, R> ClientSession<S, R>
where
    S: MessageSink<SubscriptionRequest>,
    R: MessageSource<PriceUpdate> + 'static,
{
    /// Session over an already split stream.
    pub fn new(sink: S, source: R, config: ClientConfig) -> Self {
        Self {
            sink,
            source,
            lifecycle: Lifecycle::new(),
            config,
            interrupt: never(),
        }
    }

    /// Channel whose messages interrupt the session (e.g., fed by a Ctrl+C handler).
    ///
    /// The first interrupt ends the outbound loop like `exit`; one received while
    /// waiting for the server to finish aborts the stream.
    pub fn with_interrupt(mut self, interrupt: Receiver<()>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Handle to the session's lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Run the session: send symbols read from `input`, render every update with
    /// `render`, and return once the server has ended the stream.
    pub fn run<I, F>(self, input: I, render: F) -> Result<SessionSummary>
    where
        I: BufRead + Send + 'static,
        F: FnMut(&PriceUpdate) + Send + 'static,
    {
        let ClientSession {
            mut sink,
            source,
            lifecycle,
            config,
            interrupt,
        } = self;

        let inbound_done = TerminationSignal::new();
        let inbound = spawn_inbound(source, render, &inbound_done, &lifecycle)?;
        let lines = spawn_line_reader(input)?;

        let signals = OutboundSignals {
            inbound_done: inbound_done.observe(),
            interrupt: interrupt.clone(),
        };
        let mut sender = SubscriptionSender::new(&mut sink, config.pacing);
        let outbound = sender.run(&lines, &signals, &lifecycle);
        let sent = sender.sent();
        drop(lines);

        let outbound_end = match outbound {
            Ok(end) => end,
            Err(e) => {
                error!("Failed to send symbol: {}", e);
                return abort_session(sink, inbound, &lifecycle, e);
            }
        };
        info!("Outbound loop ended ({:?}) after {} subscription(s)", outbound_end, sent);

        if outbound_end == OutboundEnd::InboundFailed {
            sink.abort();
            let received = join_inbound(inbound)?;
            lifecycle.outcome()?;
            return Ok(SessionSummary {
                sent,
                received,
                outbound_end,
            });
        }

        if let Err(e) = sink.close_send() {
            error!("Failed to close sending side: {}", e);
            return abort_session(sink, inbound, &lifecycle, e);
        }
        lifecycle.close_outbound();
        info!("Sending side closed, waiting for the server to finish");

        let done = inbound_done.observe();
        select! {
            recv(done) -> _ => {}
            recv(interrupt) -> _ => {
                warn!("Interrupted while waiting for the server, aborting stream");
                lifecycle.close();
                sink.abort();
            }
        }

        let received = join_inbound(inbound)?;
        lifecycle.close();
        lifecycle.outcome()?;
        info!("Session closed: {} update(s) received", received);
        Ok(SessionSummary {
            sent,
            received,
            outbound_end,
        })
    }
}

/// Fatal outbound error: record it, tear the stream down, and collect the inbound loop.
fn abort_session<S>(
    mut sink: S,
    inbound: JoinHandle<usize>,
    lifecycle: &Lifecycle,
    cause: StreamError,
) -> Result<SessionSummary>
where
    S: MessageSink<SubscriptionRequest>,
{
    lifecycle.fail(cause.to_string());
    sink.abort();
    if let Err(e) = join_inbound(inbound) {
        warn!("Inbound loop did not stop cleanly: {}", e);
    }
    Err(cause)
}

fn join_inbound(inbound: JoinHandle<usize>) -> Result<usize> {
    inbound
        .join()
        .map_err(|_| StreamError::ThreadPanic("client inbound loop".to_string()))
}

fn spawn_inbound<R, F>(
    source: R,
    render: F,
    inbound_done: &TerminationSignal,
    lifecycle: &Lifecycle,
) -> Result<JoinHandle<usize>>
where
    R: MessageSource<PriceUpdate> + 'static,
    F: FnMut(&PriceUpdate) + Send + 'static,
{
    let guard = RaiseOnDrop(inbound_done.clone());
    let lifecycle = lifecycle.clone();
    let handle = thread::Builder::new()
        .name("price-receiver".to_string())
        .spawn(move || {
            let _guard = guard;
            receive_updates(source, render, &lifecycle)
        })?;
    Ok(handle)
}

/// Inbound loop: render every update until end-of-stream or a receive error.
fn receive_updates<R, F>(mut source: R, mut render: F, lifecycle: &Lifecycle) -> usize
where
    R: MessageSource<PriceUpdate>,
    F: FnMut(&PriceUpdate),
{
    let mut received = 0;
    loop {
        match source.receive() {
            Ok(Some(update)) => {
                render(&update);
                received += 1;
            }
            Ok(None) => {
                info!("Server closed the stream");
                return received;
            }
            Err(e) => {
                error!("Error receiving: {}", e);
                lifecycle.fail(e.to_string());
                return received;
            }
        }
    }
}

/// Default renderer: one log line per update.
pub fn log_update(update: &PriceUpdate) {
    info!("{} -> ${:.2} at {}", update.symbol, update.price, update.timestamp);
}
