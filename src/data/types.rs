use crate::error::{ImbalanceError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single price level: price and resting volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub volume: u64,
}

impl PriceLevel {
    pub fn new(price: Decimal, volume: u64) -> Self {
        Self { price, volume }
    }
}

impl From<(Decimal, u64)> for PriceLevel {
    fn from((price, volume): (Decimal, u64)) -> Self {
        Self { price, volume }
    }
}

/// Order book snapshot as delivered by the feed.
///
/// Bids are best (highest) first, asks are best (lowest) first. Ordering is
/// trusted, not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl OrderBookSnapshot {
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self { bids, asks }
    }

    /// Build a snapshot from `(price, volume)` pairs
    pub fn from_levels(bids: &[(Decimal, u64)], asks: &[(Decimal, u64)]) -> Self {
        Self {
            bids: bids.iter().copied().map(PriceLevel::from).collect(),
            asks: asks.iter().copied().map(PriceLevel::from).collect(),
        }
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Mid price between best bid and best ask
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some((bid + ask) / Decimal::TWO)
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }
}

/// Order book imbalance in [-1, 1].
///
/// +1.0 = all volume on the bid, -1.0 = all volume on the ask.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ImbalanceScore(f64);

impl ImbalanceScore {
    /// Sentinel for a snapshot with no considered volume
    pub const ZERO: ImbalanceScore = ImbalanceScore(0.0);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || !(-1.0..=1.0).contains(&value) {
            return Err(ImbalanceError::invalid(format!(
                "imbalance score must be within [-1, 1], got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Ratio of a difference to a sum of non-negative terms; float rounding
    /// can only push it onto the bounds, never past them.
    pub(crate) fn from_ratio(value: f64) -> Self {
        Self(value.clamp(-1.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ImbalanceScore {
    type Error = ImbalanceError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ImbalanceScore> for f64 {
    fn from(score: ImbalanceScore) -> f64 {
        score.0
    }
}

impl fmt::Display for ImbalanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}", p, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// One point of the rolling imbalance history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic seconds since the stream started
    pub timestamp: f64,
    pub score: ImbalanceScore,
}

impl HistoryEntry {
    pub fn new(timestamp: f64, score: ImbalanceScore) -> Self {
        Self { timestamp, score }
    }
}

/// Discrete trading signal derived from the latest score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    StrongBuy,
    StrongSell,
    Neutral,
}

impl Signal {
    /// Human label used by the presentation layer
    pub fn label(self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG BUY",
            Signal::StrongSell => "STRONG SELL",
            Signal::Neutral => "Neutral",
        }
    }

    /// Short, lowercase name for metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::StrongBuy => "strong_buy",
            Signal::StrongSell => "strong_sell",
            Signal::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_score_rejects_out_of_range() {
        assert!(ImbalanceScore::new(1.0).is_ok());
        assert!(ImbalanceScore::new(-1.0).is_ok());
        assert!(ImbalanceScore::new(1.0001).is_err());
        assert!(ImbalanceScore::new(-1.5).is_err());
        assert!(ImbalanceScore::new(f64::NAN).is_err());
    }

    #[test]
    fn test_score_display_precision() {
        let score = ImbalanceScore::new(0.454545).unwrap();
        assert_eq!(format!("{:.2}", score), "0.45");
    }

    #[test]
    fn test_mid_price_and_spread() {
        let snapshot = OrderBookSnapshot::from_levels(
            &[(dec!(100), 50), (dec!(99), 30)],
            &[(dec!(101), 20)],
        );
        assert_eq!(snapshot.mid_price(), Some(dec!(100.5)));
        assert_eq!(snapshot.spread(), Some(dec!(1)));
    }

    #[test]
    fn test_empty_side_has_no_mid() {
        let snapshot = OrderBookSnapshot::from_levels(&[], &[(dec!(101), 20)]);
        assert!(snapshot.mid_price().is_none());
    }

    #[test]
    fn test_snapshot_deserializes_from_json() {
        let json = r#"{
            "bids": [{"price": "100.00", "volume": 50}],
            "asks": [{"price": "101.00", "volume": 20}]
        }"#;
        let snapshot: OrderBookSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.bids[0].volume, 50);
        assert_eq!(snapshot.asks[0].price, dec!(101.00));
    }

    #[test]
    fn test_score_deserialize_validates_range() {
        assert!(serde_json::from_str::<ImbalanceScore>("0.5").is_ok());
        assert!(serde_json::from_str::<ImbalanceScore>("2.0").is_err());
    }
}
