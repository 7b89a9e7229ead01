//! One-shot termination signal shared by the two loops of a session.
//!
//! The signal owns a `crossbeam_channel` sender that nobody ever sends on. Raising
//! the signal drops that sender, which disconnects every cloned receiver at once,
//! so a loop blocked in `select!` on [`TerminationSignal::observe`] wakes up
//! immediately. Raising is idempotent and never blocks.
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

/// Cloneable handle to a one-shot, broadcast-style termination flag.
#[derive(Clone, Debug)]
pub struct TerminationSignal {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    observer: Receiver<()>,
}

impl TerminationSignal {
    /// Create a signal in the lowered state.
    pub fn new() -> Self {
        let (trigger, observer) = bounded::<()>(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(trigger))),
            observer,
        }
    }

    /// Raise the signal. Returns `true` only for the call that actually raised it.
    pub fn raise(&self) -> bool {
        // A poisoned lock still holds a valid Option, raising must not fail.
        let mut trigger = match self.trigger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        trigger.take().is_some()
    }

    /// Non-blocking check.
    pub fn is_raised(&self) -> bool {
        matches!(self.observer.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes disconnected once the signal is raised.
    ///
    /// Intended for `select!`: the `recv` arm fires with `Err(RecvError)` on raise.
    pub fn observe(&self) -> Receiver<()> {
        self.observer.clone()
    }
}

impl Default for TerminationSignal {
    fn default() -> Self {
        Self::new()
    }
}
