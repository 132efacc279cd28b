use crate::data::{OrderBookSnapshot, PriceLevel};
use crate::error::{DataSourceUnavailable, ImbalanceError, Result};
use crate::feed::source::SnapshotSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Random but realistic order book generator
///
/// Each snapshot has `depth` levels per side. Bid `i` sits at
/// `base - i * tick - U(0, 0.05)`, ask `i` at `base + i * tick + U(0, 0.05)`,
/// both rounded to cents, with volumes drawn from [10, 200].
pub struct SimulatedOrderBook {
    rng: StdRng,
    base_price: Decimal,
    tick_size: Decimal,
    depth: usize,
    min_volume: u64,
    max_volume: u64,
    /// Probability in [0, 1] that a call reports the feed as unavailable
    failure_rate: f64,
}

impl SimulatedOrderBook {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for tests and reproducible demos
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            base_price: dec!(100.00),
            tick_size: dec!(0.01),
            depth: 10,
            min_volume: 10,
            max_volume: 200,
            failure_rate: 0.0,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Inject simulated outages
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Result<Self> {
        if failure_rate.is_nan() || !(0.0..=1.0).contains(&failure_rate) {
            return Err(ImbalanceError::invalid(format!(
                "failure rate must be within [0, 1], got {}",
                failure_rate
            )));
        }
        self.failure_rate = failure_rate;
        Ok(self)
    }

    /// Generate one snapshot
    pub fn generate(&mut self) -> OrderBookSnapshot {
        let mut bids = Vec::with_capacity(self.depth);
        let mut asks = Vec::with_capacity(self.depth);

        // Bids slightly below the base price
        for i in 0..self.depth {
            let price = self.base_price - self.offset(i) - self.jitter();
            bids.push(PriceLevel::new(price.round_dp(2), self.volume()));
        }

        // Asks slightly above the base price
        for i in 0..self.depth {
            let price = self.base_price + self.offset(i) + self.jitter();
            asks.push(PriceLevel::new(price.round_dp(2), self.volume()));
        }

        OrderBookSnapshot::new(bids, asks)
    }

    fn offset(&self, level: usize) -> Decimal {
        Decimal::from(level as u64) * self.tick_size
    }

    /// Uniform in [0, 0.05] at 4 decimal places
    fn jitter(&mut self) -> Decimal {
        Decimal::new(self.rng.gen_range(0..=500), 4)
    }

    fn volume(&mut self) -> u64 {
        self.rng.gen_range(self.min_volume..=self.max_volume)
    }
}

impl Default for SimulatedOrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for SimulatedOrderBook {
    fn get_snapshot(&mut self) -> std::result::Result<OrderBookSnapshot, DataSourceUnavailable> {
        if self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate) {
            return Err(DataSourceUnavailable::new("simulated feed outage"));
        }
        Ok(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_book_shape() {
        let mut feed = SimulatedOrderBook::seeded(7);
        let snapshot = feed.generate();

        assert_eq!(snapshot.bids.len(), 10);
        assert_eq!(snapshot.asks.len(), 10);
        for level in snapshot.bids.iter().chain(snapshot.asks.iter()) {
            assert!((10..=200).contains(&level.volume));
            assert!(level.price.scale() <= 2);
        }
        for bid in &snapshot.bids {
            assert!(bid.price <= dec!(100.00));
        }
        for ask in &snapshot.asks {
            assert!(ask.price >= dec!(100.00));
        }
    }

    #[test]
    fn test_best_prices_stay_near_base() {
        let mut feed = SimulatedOrderBook::seeded(11);
        for _ in 0..50 {
            let snapshot = feed.generate();
            let best_bid = snapshot.best_bid().unwrap().price;
            let best_ask = snapshot.best_ask().unwrap().price;
            assert!(best_bid >= dec!(99.95));
            assert!(best_ask <= dec!(100.05));
        }
    }

    #[test]
    fn test_seeded_feeds_are_reproducible() {
        let mut a = SimulatedOrderBook::seeded(42);
        let mut b = SimulatedOrderBook::seeded(42);
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn test_full_failure_rate_always_fails() {
        let mut feed = SimulatedOrderBook::seeded(1).with_failure_rate(1.0).unwrap();
        assert!(feed.get_snapshot().is_err());
    }

    #[test]
    fn test_invalid_failure_rate_rejected() {
        assert!(SimulatedOrderBook::seeded(1).with_failure_rate(1.5).is_err());
    }

    #[test]
    fn test_custom_depth() {
        let mut feed = SimulatedOrderBook::seeded(3).with_depth(3);
        let snapshot = feed.get_snapshot().unwrap();
        assert_eq!(snapshot.bids.len(), 3);
    }
}
