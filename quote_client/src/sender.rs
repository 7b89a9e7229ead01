//! Outbound loop: sending subscriptions to the server.
//!
//! Input lines are classified with `parse_input_line`; each symbol becomes a
//! `SubscriptionRequest` followed by an optional pacing delay. The loop ends on the
//! `exit` sentinel, input exhaustion, an interrupt, or a fatal inbound failure.
//! A failed send is returned as an error and ends the loop immediately.
use std::time::Duration;

use crossbeam_channel::{Receiver, never, select};
use log::{debug, info};
use quote_common::symbols::{InputLine, parse_input_line};
use quote_common::{Lifecycle, MessageSink, Result, StreamState, SubscriptionRequest};

/// Why the outbound loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundEnd {
    /// `exit` sentinel read.
    Exit,
    /// Input source exhausted.
    Exhausted,
    /// Interrupt received (Ctrl+C).
    Interrupted,
    /// The inbound loop failed; the session is going down.
    InboundFailed,
}

/// Channels the outbound loop waits on besides its input.
pub struct OutboundSignals {
    /// Disconnects when the inbound loop ends, for any reason.
    pub inbound_done: Receiver<()>,
    /// Fires on user interrupt.
    pub interrupt: Receiver<()>,
}

/// Helper type for sending subscriptions to the server.
pub struct SubscriptionSender<'a, S> {
    sink: &'a mut S,
    pacing: Duration,
    sent: usize,
}

impl<'a, S> SubscriptionSender<'a, S>
where
    S: MessageSink<SubscriptionRequest>,
{
    /// Sender over `sink` waiting `pacing` after every request.
    pub fn new(sink: &'a mut S, pacing: Duration) -> Self {
        Self {
            sink,
            pacing,
            sent: 0,
        }
    }

    /// Number of requests sent so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Send one subscription request.
    pub fn send_symbol(&mut self, symbol: &str) -> Result<()> {
        self.sink.send(&SubscriptionRequest::new(symbol))?;
        self.sent += 1;
        info!("Sent subscription: {}", symbol);
        Ok(())
    }

    /// Run the outbound loop over `lines` until one of its end conditions.
    pub fn run(
        &mut self,
        lines: &Receiver<String>,
        signals: &OutboundSignals,
        lifecycle: &Lifecycle,
    ) -> Result<OutboundEnd> {
        let mut server_finished = false;
        loop {
            // A disconnected receiver fires on every select, so stop watching it once
            // the server has ended its direction cleanly.
            let inbound_done = if server_finished {
                never()
            } else {
                signals.inbound_done.clone()
            };
            select! {
                recv(lines) -> line => match line {
                    Ok(line) => match parse_input_line(&line) {
                        InputLine::Subscribe(symbol) => {
                            self.send_symbol(&symbol)?;
                            let paced = self.pace(&inbound_done, &signals.interrupt, lifecycle);
                            if let Some(end) = paced {
                                return Ok(end);
                            }
                        }
                        InputLine::Exit => return Ok(OutboundEnd::Exit),
                        InputLine::Skip => debug!("Skipping blank input line"),
                    },
                    Err(_) => return Ok(OutboundEnd::Exhausted),
                },
                recv(inbound_done) -> _ => {
                    if let Some(end) = inbound_failed(lifecycle) {
                        return Ok(end);
                    }
                    debug!("Server ended its stream, still reading input");
                    server_finished = true;
                }
                recv(signals.interrupt) -> _ => return Ok(OutboundEnd::Interrupted),
            }
        }
    }

    /// Pacing delay between sends; still reacts to interrupt and inbound failure.
    fn pace(
        &self,
        inbound_done: &Receiver<()>,
        interrupt: &Receiver<()>,
        lifecycle: &Lifecycle,
    ) -> Option<OutboundEnd> {
        if self.pacing.is_zero() {
            return None;
        }
        select! {
            recv(inbound_done) -> _ => inbound_failed(lifecycle),
            recv(interrupt) -> _ => Some(OutboundEnd::Interrupted),
            default(self.pacing) => None,
        }
    }
}

/// The inbound loop has ended; only a failure stops the outbound loop.
fn inbound_failed(lifecycle: &Lifecycle) -> Option<OutboundEnd> {
    (lifecycle.state() == StreamState::Failed).then_some(OutboundEnd::InboundFailed)
}
