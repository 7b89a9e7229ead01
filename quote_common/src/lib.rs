//!
//! Common types and utilities shared by the quote server and client.
//!
//! This crate aggregates:
//! - `error` — unified error type `StreamError` used across the workspace.
//! - `result` — handy `Result<T, StreamError>` alias.
//! - `message` — `SubscriptionRequest` / `PriceUpdate` exchanged over a stream.
//! - `symbols` — classification of line-oriented symbol input.
//! - `net` — networking constants and small helpers.
//! - `signal` — one-shot termination signal shared by the loops of a session.
//! - `lifecycle` — explicit `Open / OutboundClosed / Closed / Failed` session state.
//! - `transport` — sink/source halves of a bidirectional stream (TCP and in-memory).
#![warn(missing_docs)]
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod net;
pub mod result;
pub mod signal;
pub mod symbols;
pub mod transport;

pub use error::StreamError;
pub use lifecycle::{Lifecycle, StreamState};
pub use message::{PriceUpdate, SubscriptionRequest};
pub use result::Result;
pub use signal::TerminationSignal;
pub use transport::{MessageSink, MessageSource};
