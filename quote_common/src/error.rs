//! Error types shared between client and server.
//!
//! The `StreamError` enum unifies the failure cases of a quote stream session:
//! socket I/O, JSON framing, channel communication, poisoned locks and the
//! terminal outcome of a session, allowing crates to propagate a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum StreamError {
    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding a JSON line via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),

    /// The sending direction was already half-closed.
    #[error("Send direction already closed")]
    SendClosed,

    /// The session ended in the `Failed` state.
    #[error("Session failed: {0}")]
    SessionFailed(String),

    /// A worker thread of the session panicked.
    #[error("Thread panicked: {0}")]
    ThreadPanic(String),

    /// An incoming line exceeded the framing limit (in bytes).
    #[error("Incoming line longer than {0} bytes")]
    LineTooLong(usize),

    /// Invalid runtime configuration (addresses, intervals).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl<T> From<PoisonError<T>> for StreamError {
    fn from(err: PoisonError<T>) -> Self {
        StreamError::MutexLock(err.to_string())
    }
}
