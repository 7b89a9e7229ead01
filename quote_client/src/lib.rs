//! Price stream client.
//!
//! Subscribes to symbols over one bidirectional stream and renders the price updates
//! the server pushes back:
//!
//! - `input` — background line reader feeding the outbound loop.
//! - `sender` — the outbound loop sending `SubscriptionRequest`s.
//! - `session` — `ClientSession`, which pairs the outbound loop with the inbound
//!   rendering loop and performs the half-close.
//! - `args` — command-line configuration.
#![warn(missing_docs)]
pub mod args;
pub mod input;
pub mod sender;
pub mod session;

pub use sender::OutboundEnd;
pub use session::{ClientConfig, ClientSession, SessionSummary, log_update};
