//! Synthetic price generation for broadcast ticks.
//!
//! The broadcast loop treats a generator as an opaque `symbol -> price` function.
//! Two implementations are provided:
//!
//! - `UniformPrice` — an independent uniform draw per update.
//! - `RandomWalkPrice` — a small random walk around the symbol's last price.

use std::collections::HashMap;

use clap::ValueEnum;
use rand::Rng;
use strum_macros::Display;

/// Lower bound of the uniform price range.
const UNIFORM_LOW: f64 = 100.0;
/// Upper bound (exclusive) of the uniform price range.
const UNIFORM_HIGH: f64 = 1100.0;
/// Starting price of every symbol in a random walk.
const WALK_START: f64 = 100.0;
/// Prices never go below this value.
const MIN_PRICE: f64 = 0.01;

/// Produces a price for a symbol on each tick.
pub trait PriceGenerator: Send {
    /// Price for `symbol` at the current tick.
    fn price(&mut self, symbol: &str) -> f64;
}

impl<F> PriceGenerator for F
where
    F: FnMut(&str) -> f64 + Send,
{
    fn price(&mut self, symbol: &str) -> f64 {
        self(symbol)
    }
}

/// Uniform draw in `[100, 1100)`, independent of the symbol.
#[derive(Debug, Default)]
pub struct UniformPrice;

impl PriceGenerator for UniformPrice {
    fn price(&mut self, _symbol: &str) -> f64 {
        rand::rng().random_range(UNIFORM_LOW..UNIFORM_HIGH)
    }
}

/// Per-symbol random walk.
#[derive(Debug)]
pub struct RandomWalkPrice {
    start: f64,
    last: HashMap<String, f64>,
}

impl RandomWalkPrice {
    /// Walk where every symbol starts at `start`.
    pub fn new(start: f64) -> Self {
        Self {
            start,
            last: HashMap::new(),
        }
    }

    /// Calculate the next price using a small random walk around `current_price`.
    ///
    /// The change is sampled uniformly from `[-1%, +1%]` and the result is clamped
    /// to a minimum positive value.
    pub fn next_price(current_price: f64) -> f64 {
        let change: f64 = rand::rng().random_range(-0.01..0.01);
        (current_price * (1.0 + change)).max(MIN_PRICE)
    }
}

impl Default for RandomWalkPrice {
    fn default() -> Self {
        Self::new(WALK_START)
    }
}

impl PriceGenerator for RandomWalkPrice {
    fn price(&mut self, symbol: &str) -> f64 {
        let current = self.last.get(symbol).copied().unwrap_or(self.start);
        let next = Self::next_price(current);
        self.last.insert(symbol.to_string(), next);
        next
    }
}

/// Generator selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum GeneratorKind {
    /// [`UniformPrice`].
    Uniform,
    /// [`RandomWalkPrice`].
    Walk,
}

impl GeneratorKind {
    /// Fresh generator instance; each session gets its own.
    pub fn build(self) -> Box<dyn PriceGenerator> {
        match self {
            GeneratorKind::Uniform => Box::new(UniformPrice),
            GeneratorKind::Walk => Box::new(RandomWalkPrice::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let mut generator = UniformPrice;
        for _ in 0..1000 {
            let price = generator.price("AAPL");
            assert!((UNIFORM_LOW..UNIFORM_HIGH).contains(&price));
        }
    }

    #[test]
    fn walk_moves_at_most_one_percent_per_step() {
        let mut generator = RandomWalkPrice::new(200.0);
        let mut last = 200.0;
        for _ in 0..500 {
            let next = generator.price("MSFT");
            assert!((next - last).abs() <= last * 0.01 + f64::EPSILON);
            last = next;
        }
    }

    #[test]
    fn walk_tracks_symbols_independently() {
        let mut generator = RandomWalkPrice::new(50.0);
        for _ in 0..10 {
            generator.price("AAPL");
        }
        let first_goog = generator.price("GOOG");
        assert!((first_goog - 50.0).abs() <= 0.5);
    }

    #[test]
    fn walk_never_drops_below_minimum() {
        assert!(RandomWalkPrice::next_price(0.0) >= MIN_PRICE);
    }

    #[test]
    fn closures_are_generators() {
        let mut fixed = |_: &str| 42.0;
        assert_eq!(PriceGenerator::price(&mut fixed, "X"), 42.0);
    }

    #[test]
    fn kind_names_are_lowercase() {
        assert_eq!(GeneratorKind::Walk.to_string(), "walk");
        let mut generator = GeneratorKind::Uniform.build();
        assert!(generator.price("AAPL") >= UNIFORM_LOW);
    }
}
