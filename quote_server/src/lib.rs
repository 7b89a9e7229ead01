//! Price stream server.
//!
//! Accepts TCP connections and runs one bidirectional session per connection:
//!
//! - `model::registry` — the session's mutex-guarded `SubscriptionRegistry`.
//! - `model::price` — `PriceGenerator` implementations used on each tick.
//! - `session` — `ServerSession`, the inbound loop + broadcast loop pair.
//! - `listener` — `QuoteListener`, the accept loop spawning sessions.
//! - `args` — command-line configuration.
#![warn(missing_docs)]
pub mod args;
pub mod listener;
pub mod model;
pub mod session;

pub use listener::{QuoteListener, ServerConfig};
pub use model::price::{GeneratorKind, PriceGenerator};
pub use model::registry::SubscriptionRegistry;
pub use session::{ServerSession, SessionConfig};
