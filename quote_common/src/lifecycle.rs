//! Explicit lifecycle state of one stream session.
//!
//! Each side of a session tracks where the stream is in its shutdown sequence:
//!
//! - `Open` — both directions usable.
//! - `OutboundClosed` — this side half-closed its sending direction and is only
//!   receiving (client after `exit`).
//! - `Closed` — ended cleanly.
//! - `Failed` — ended on a receive or send error.
//!
//! `Closed` and `Failed` are terminal; the first terminal transition wins and every
//! later transition is rejected. This is what lets the two loops of a session race
//! to report an outcome without overwriting each other.
use std::sync::{Arc, Mutex, MutexGuard};

use strum_macros::Display;

use crate::error::StreamError;
use crate::result::Result;

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StreamState {
    /// Both directions are open.
    Open,
    /// Sending direction half-closed, still receiving.
    OutboundClosed,
    /// Ended cleanly.
    Closed,
    /// Ended on a transport error.
    Failed,
}

impl StreamState {
    /// `Closed` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Closed | StreamState::Failed)
    }
}

#[derive(Debug)]
struct Inner {
    state: StreamState,
    failure: Option<String>,
}

/// Cloneable, thread-safe handle to a session's lifecycle state.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    inner: Arc<Mutex<Inner>>,
}

impl Lifecycle {
    /// New lifecycle in the `Open` state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: StreamState::Open,
                failure: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        self.lock().state
    }

    /// Reason recorded by the transition into `Failed`, if any.
    pub fn failure(&self) -> Option<String> {
        self.lock().failure.clone()
    }

    /// `Open -> OutboundClosed`.
    pub fn close_outbound(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != StreamState::Open {
            return false;
        }
        inner.state = StreamState::OutboundClosed;
        true
    }

    /// `Open | OutboundClosed -> Closed`.
    pub fn close(&self) -> bool {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return false;
        }
        inner.state = StreamState::Closed;
        true
    }

    /// Any non-terminal state `-> Failed`, recording `reason`.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return false;
        }
        inner.state = StreamState::Failed;
        inner.failure = Some(reason.into());
        true
    }

    /// Terminal outcome as a `Result`: `Err` only for `Failed`.
    pub fn outcome(&self) -> Result<()> {
        let inner = self.lock();
        match inner.state {
            StreamState::Failed => Err(StreamError::SessionFailed(
                inner.failure.clone().unwrap_or_default(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
