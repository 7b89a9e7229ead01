//! Stream transport abstraction.
//!
//! A bidirectional stream is split into a [`MessageSink`] (the sending direction)
//! and a [`MessageSource`] (the receiving direction) so the two loops of a session
//! can own one half each and block independently.
//!
//! - `tcp` — newline-delimited JSON over a `TcpStream`, half-close via `shutdown(Write)`.
//! - `memory` — in-process `crossbeam_channel` pair with the same semantics.
pub mod memory;
pub mod tcp;

use crate::result::Result;

/// Sending direction of a stream.
pub trait MessageSink<T>: Send {
    /// Send one message; blocks until the transport accepts it or fails.
    fn send(&mut self, message: &T) -> Result<()>;

    /// Half-close: no further messages will be sent. The receiving direction
    /// stays usable. Calling it again is a no-op.
    fn close_send(&mut self) -> Result<()>;

    /// Tear down both directions so a receive blocked on the same stream returns.
    fn abort(&mut self);
}

/// Receiving direction of a stream.
pub trait MessageSource<T>: Send {
    /// Block for the next message. `Ok(None)` means the peer half-closed
    /// (end-of-stream); any other failure is `Err`.
    fn receive(&mut self) -> Result<Option<T>>;
}
