//! Server side of one bidirectional price stream.
//!
//! A session runs two loops over one stream:
//!
//! - Inbound loop (spawned thread) — receives `SubscriptionRequest`s and adds them to
//!   the session's `SubscriptionRegistry` until the client half-closes or the receive
//!   fails. Either way it raises the session's `TerminationSignal` on exit.
//! - Broadcast loop (calling thread) — wakes on a `crossbeam_channel::tick`, and on
//!   every tick sends one `PriceUpdate` per subscribed symbol. It stops when the
//!   termination signal is raised, when the optional session deadline expires, or on
//!   the first failed send.
//!
//! Outcome:
//! - Client half-closed → `Closed`, `run` returns `Ok(())` and the server half-closes
//!   its own direction so the client sees end-of-stream.
//! - Receive or send failure → `Failed`, `run` returns `Err(StreamError::SessionFailed)`.
//!
//! Whenever the broadcast loop ends while the inbound loop is still blocked in
//! `receive`, the sink is aborted so that receive returns and the thread can be joined.
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, after, never, select, tick};
use log::{debug, error, info, warn};
use quote_common::net::TICK_INTERVAL;
use quote_common::{
    Lifecycle, MessageSink, MessageSource, PriceUpdate, Result, StreamError, SubscriptionRequest,
    TerminationSignal,
};

use crate::model::price::PriceGenerator;
use crate::model::registry::SubscriptionRegistry;

/// Timing knobs of a server session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the broadcast tick.
    pub tick_interval: Duration,
    /// Upper bound on the session's lifetime; `None` runs until the peer leaves.
    pub max_lifetime: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            max_lifetime: None,
        }
    }
}

/// Why the broadcast loop stopped without a send error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BroadcastEnd {
    /// Termination signal observed.
    Terminated,
    /// Session lifetime bound reached.
    Expired,
}

/// Raises the signal when dropped, so a panicking inbound loop still stops the broadcast.
struct RaiseOnDrop(TerminationSignal);

impl Drop for RaiseOnDrop {
    fn drop(&mut self) {
        self.0.raise();
    }
}

/// One server-side stream session.
pub struct ServerSession<S, R> {
    sink: S,
    source: R,
    registry: Arc<SubscriptionRegistry>,
    signal: TerminationSignal,
    lifecycle: Lifecycle,
    generator: Box<dyn PriceGenerator>,
    config: SessionConfig,
    peer: String,
}

impl<S, R> fmt::Debug for ServerSession<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSession")
            .field("peer", &self.peer)
            .field("state", &self.lifecycle.state())
            .field("config", &self.config)
            .finish()
    }
}

impl<S, R> ServerSession<S, R>
where
    S: MessageSink<PriceUpdate>,
    R: MessageSource<SubscriptionRequest> + 'static,
{
    /// Session over an already split stream, with a fresh registry.
    pub fn new(
        sink: S,
        source: R,
        generator: Box<dyn PriceGenerator>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sink,
            source,
            registry: Arc::new(SubscriptionRegistry::new()),
            signal: TerminationSignal::new(),
            lifecycle: Lifecycle::new(),
            generator,
            config,
            peer: String::from("client"),
        }
    }

    /// Label used in log lines (usually the peer address).
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// The session's registry.
    pub fn registry(&self) -> Arc<SubscriptionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Handle to the session's lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// The session's termination signal. Raising it from outside ends the session at
    /// the next loop boundary.
    pub fn termination(&self) -> TerminationSignal {
        self.signal.clone()
    }

    /// Run both loops until the session ends; blocks the calling thread.
    pub fn run(self) -> Result<()> {
        let ServerSession {
            mut sink,
            source,
            registry,
            signal,
            lifecycle,
            mut generator,
            config,
            peer,
        } = self;

        info!("Client {} connected for price updates", peer);

        let inbound = spawn_inbound(source, &registry, &signal, &lifecycle, &peer)?;
        let deadline: Receiver<Instant> = match config.max_lifetime {
            Some(limit) => after(limit),
            None => never(),
        };

        let ended = broadcast_loop(
            &mut sink,
            &registry,
            generator.as_mut(),
            &signal,
            deadline,
            &config,
            &peer,
        );
        match ended {
            Ok(BroadcastEnd::Terminated) => {
                lifecycle.close();
                if let Err(e) = sink.close_send() {
                    debug!("Half-close towards {} failed: {}", peer, e);
                }
            }
            Ok(BroadcastEnd::Expired) => {
                info!("Session {} reached its lifetime bound", peer);
                lifecycle.close();
                signal.raise();
                sink.abort();
            }
            Err(e) => {
                error!("Error sending update to {}: {}", peer, e);
                lifecycle.fail(e.to_string());
                signal.raise();
                sink.abort();
            }
        }

        if !inbound.is_finished() {
            sink.abort();
        }
        inbound
            .join()
            .map_err(|_| StreamError::ThreadPanic(format!("inbound loop of {}", peer)))?;

        info!("Session {} ended: {}", peer, lifecycle.state());
        lifecycle.outcome()
    }
}

fn spawn_inbound<R>(
    source: R,
    registry: &Arc<SubscriptionRegistry>,
    signal: &TerminationSignal,
    lifecycle: &Lifecycle,
    peer: &str,
) -> Result<JoinHandle<()>>
where
    R: MessageSource<SubscriptionRequest> + 'static,
{
    let registry = Arc::clone(registry);
    let guard = RaiseOnDrop(signal.clone());
    let lifecycle = lifecycle.clone();
    let peer = peer.to_string();
    let handle = thread::Builder::new()
        .name(format!("inbound-{}", peer))
        .spawn(move || {
            let _guard = guard;
            receive_subscriptions(source, &registry, &lifecycle, &peer);
        })?;
    Ok(handle)
}

/// Inbound loop. Returns on end-of-stream or error; the caller's guard raises the signal.
fn receive_subscriptions<R>(
    mut source: R,
    registry: &SubscriptionRegistry,
    lifecycle: &Lifecycle,
    peer: &str,
) where
    R: MessageSource<SubscriptionRequest>,
{
    loop {
        match source.receive() {
            Ok(Some(request)) => match registry.add(&request.symbol) {
                Ok(true) => info!("Subscribed {} to: {}", peer, request.symbol),
                Ok(false) => debug!("{} already subscribed to {}", peer, request.symbol),
                Err(e) => {
                    error!("Registry unavailable for {}: {}", peer, e);
                    lifecycle.fail(e.to_string());
                    return;
                }
            },
            Ok(None) => {
                info!("Client {} stopped sending symbols", peer);
                return;
            }
            Err(e) => {
                // Fail before the guard raises, so the broadcast side sees Failed.
                warn!("Error receiving symbol from {}: {}", peer, e);
                lifecycle.fail(e.to_string());
                return;
            }
        }
    }
}

/// Broadcast loop. Termination and expiry are checked only between ticks.
fn broadcast_loop<S>(
    sink: &mut S,
    registry: &SubscriptionRegistry,
    generator: &mut dyn PriceGenerator,
    signal: &TerminationSignal,
    deadline: Receiver<Instant>,
    config: &SessionConfig,
    peer: &str,
) -> Result<BroadcastEnd>
where
    S: MessageSink<PriceUpdate>,
{
    let ticker = tick(config.tick_interval);
    let done = signal.observe();
    loop {
        select! {
            recv(done) -> _ => return Ok(BroadcastEnd::Terminated),
            recv(deadline) -> _ => return Ok(BroadcastEnd::Expired),
            recv(ticker) -> _ => {
                if signal.is_raised() {
                    return Ok(BroadcastEnd::Terminated);
                }
                let sent = broadcast_tick(sink, registry, generator)?;
                debug!("Tick for {}: {} update(s)", peer, sent);
            }
        }
    }
}

/// One tick: an update per subscribed symbol, aborting on the first failed send.
fn broadcast_tick<S>(
    sink: &mut S,
    registry: &SubscriptionRegistry,
    generator: &mut dyn PriceGenerator,
) -> Result<usize>
where
    S: MessageSink<PriceUpdate>,
{
    let mut sent = 0;
    registry.for_each(|symbol| {
        let update = PriceUpdate::new(symbol, generator.price(symbol));
        sink.send(&update)?;
        debug!("Sent {} update: ${:.2}", symbol, update.price);
        sent += 1;
        Ok(())
    })?;
    Ok(sent)
}
