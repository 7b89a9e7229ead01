//! In-process stream built from two `crossbeam_channel` pairs.
//!
//! Mirrors the TCP transport: dropping or closing a sink is end-of-stream for the
//! peer, and `abort` makes the local source fail with `ConnectionAborted`.
use std::io;

use crossbeam_channel::{Receiver, Sender, select, unbounded};

use super::{MessageSink, MessageSource};
use crate::error::StreamError;
use crate::result::Result;
use crate::signal::TerminationSignal;

/// Sending half of an in-memory stream.
pub struct ChannelSink<T> {
    tx: Option<Sender<T>>,
    aborted: TerminationSignal,
}

/// Receiving half of an in-memory stream.
pub struct ChannelSource<T> {
    rx: Receiver<T>,
    aborted: TerminationSignal,
}

/// One side of an in-memory stream: sends `Out`, receives `In`.
pub type Endpoint<Out, In> = (ChannelSink<Out>, ChannelSource<In>);

/// Create a connected pair of endpoints. The first sends `A` and receives `B`.
pub fn duplex<A, B>() -> (Endpoint<A, B>, Endpoint<B, A>) {
    let (a_tx, a_rx) = unbounded::<A>();
    let (b_tx, b_rx) = unbounded::<B>();
    let left_abort = TerminationSignal::new();
    let right_abort = TerminationSignal::new();
    (
        (
            ChannelSink {
                tx: Some(a_tx),
                aborted: left_abort.clone(),
            },
            ChannelSource {
                rx: b_rx,
                aborted: left_abort,
            },
        ),
        (
            ChannelSink {
                tx: Some(b_tx),
                aborted: right_abort.clone(),
            },
            ChannelSource {
                rx: a_rx,
                aborted: right_abort,
            },
        ),
    )
}

impl<T: Clone + Send> MessageSink<T> for ChannelSink<T> {
    fn send(&mut self, message: &T) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(StreamError::SendClosed)?;
        tx.send(message.clone())
            .map_err(|_| StreamError::ChannelSend("peer receiver dropped".to_string()))
    }

    fn close_send(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }

    fn abort(&mut self) {
        self.tx = None;
        self.aborted.raise();
    }
}

impl<T: Send> MessageSource<T> for ChannelSource<T> {
    fn receive(&mut self) -> Result<Option<T>> {
        let aborted_rx = self.aborted.observe();
        if self.aborted.is_raised() {
            return Err(aborted());
        }
        select! {
            recv(self.rx) -> msg => Ok(msg.ok()),
            recv(aborted_rx) -> _ => Err(aborted()),
        }
    }
}

fn aborted() -> StreamError {
    StreamError::Io(io::Error::new(
        io::ErrorKind::ConnectionAborted,
        "stream aborted",
    ))
}
