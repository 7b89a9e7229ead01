//! Subscription registry of a single server session.
//!
//! The registry is the only state shared between the inbound loop (writer) and the
//! broadcast loop (reader) of a session. It exposes two core operations:
//!
//! - `SubscriptionRegistry::add(symbol)` — insert a symbol; re-adding is a no-op.
//! - `SubscriptionRegistry::for_each(f)` — hold the lock for a whole pass and call `f`
//!   for every member; the pass stops at the first error `f` returns.
//!
//! Design notes:
//! - Every access goes through one `Mutex`, so an `add` racing a broadcast pass either
//!   lands before the pass (and is included) or waits until it finishes.
//! - There is no removal: subscriptions only grow for the lifetime of the session.
//! - A poisoned lock is surfaced as `StreamError::MutexLock`.

use std::collections::HashSet;
use std::sync::Mutex;

use quote_common::Result;

/// Set of subscribed symbols guarded by a mutex.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    symbols: Mutex<HashSet<String>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `symbol`. Returns `true` if it was not present before.
    pub fn add(&self, symbol: &str) -> Result<bool> {
        let mut symbols = self.symbols.lock()?;
        if symbols.contains(symbol) {
            return Ok(false);
        }
        Ok(symbols.insert(symbol.to_string()))
    }

    /// Call `f` for every subscribed symbol under exclusive access.
    ///
    /// Order is unspecified. The lock is released before returning, including when
    /// `f` fails, and the first error aborts the remaining iteration.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let symbols = self.symbols.lock()?;
        for symbol in symbols.iter() {
            f(symbol)?;
        }
        Ok(())
    }

    /// Whether `symbol` is subscribed.
    pub fn contains(&self, symbol: &str) -> Result<bool> {
        Ok(self.symbols.lock()?.contains(symbol))
    }

    /// Number of distinct subscribed symbols.
    pub fn len(&self) -> Result<usize> {
        Ok(self.symbols.lock()?.len())
    }

    /// Whether nothing is subscribed yet.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.symbols.lock()?.is_empty())
    }

    /// Copy of the current membership, sorted.
    pub fn snapshot(&self) -> Result<Vec<String>> {
        let mut symbols: Vec<String> = self.symbols.lock()?.iter().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote_common::StreamError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn add_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        assert!(registry.add("AAPL").unwrap());
        assert!(!registry.add("AAPL").unwrap());
        assert!(registry.add("GOOG").unwrap());
        assert_eq!(registry.len().unwrap(), 2);
        assert_eq!(registry.snapshot().unwrap(), vec!["AAPL", "GOOG"]);
    }

    #[test]
    fn membership_equals_distinct_symbols_under_concurrency() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..200 {
                        registry.add(&format!("SYM{}", (i + worker) % 50)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len().unwrap(), 50);
        for i in 0..50 {
            assert!(registry.contains(&format!("SYM{}", i)).unwrap());
        }
    }

    #[test]
    fn symbol_added_before_pass_is_visited_once() {
        let registry = SubscriptionRegistry::new();
        registry.add("AAPL").unwrap();
        registry.add("AAPL").unwrap();
        let mut seen = Vec::new();
        registry
            .for_each(|symbol| {
                seen.push(symbol.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec!["AAPL"]);
    }

    #[test]
    fn for_each_stops_at_first_error() {
        let registry = SubscriptionRegistry::new();
        for symbol in ["A", "B", "C"] {
            registry.add(symbol).unwrap();
        }
        let mut visited = 0;
        let result = registry.for_each(|_| {
            visited += 1;
            Err(StreamError::ChannelSend("peer gone".into()))
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
        // lock released after the failed pass
        assert!(registry.add("D").unwrap());
    }

    #[test]
    fn passes_never_observe_duplicates_while_adding() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..500 {
                    registry.add(&format!("S{}", i % 100)).unwrap();
                }
            })
        };
        for _ in 0..100 {
            let mut seen = HashSet::new();
            registry
                .for_each(|symbol| {
                    assert!(seen.insert(symbol.to_string()), "duplicate {}", symbol);
                    Ok(())
                })
                .unwrap();
            assert!(seen.len() <= 100);
        }
        writer.join().unwrap();
        assert_eq!(registry.len().unwrap(), 100);
    }
}
