//! Domain models used by a server session.
//!
//! - `registry` — mutex-guarded set of symbols a session is subscribed to.
//! - `price` — synthetic price generators feeding the broadcast loop.

pub mod price;
pub mod registry;
