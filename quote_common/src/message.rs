//! Protocol messages exchanged over a quote stream.
//!
//! The client sends a `SubscriptionRequest` per symbol it is interested in; the
//! server answers with a `PriceUpdate` per subscribed symbol on every broadcast
//! tick. Both are encoded as one JSON object per line on the wire.
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Client -> server: subscribe to updates for `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Symbol identifier (e.g., `AAPL`).
    pub symbol: String,
}

impl SubscriptionRequest {
    /// Creates a request for the given symbol.
    pub fn new(symbol: &str) -> Self {
        SubscriptionRequest {
            symbol: String::from(symbol),
        }
    }
}

/// Server -> client: one synthetic price for a subscribed symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Symbol the price belongs to.
    pub symbol: String,
    /// Synthetic price value.
    pub price: f64,
    /// RFC3339 UTC timestamp taken when the update was built.
    pub timestamp: String,
}

impl PriceUpdate {
    /// Builds an update stamped with the current UTC time.
    pub fn new(symbol: &str, price: f64) -> Self {
        PriceUpdate {
            symbol: String::from(symbol),
            price,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
