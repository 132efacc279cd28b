use crate::data::{ImbalanceScore, OrderBookSnapshot, PriceLevel};
use crate::error::{ImbalanceError, Result};

/// Default number of levels summed on each side
pub const DEFAULT_LEVELS: usize = 5;

/// Order book imbalance calculator
///
/// PRIMARY SIGNAL: compares resting volume on the top N levels of each side.
///
/// Algorithm:
/// 1. Sum volume of the first min(N, len) bids and asks
/// 2. total = bid_volume + ask_volume
/// 3. If total == 0, score is 0 (degenerate, not an error)
/// 4. Otherwise score = (bid_volume - ask_volume) / total
///
/// Stateless: safe to share between any number of readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImbalanceCalculator {
    levels: usize,
}

impl ImbalanceCalculator {
    /// Create new imbalance calculator
    ///
    /// # Arguments
    /// * `levels` - Number of order book levels to analyze (typically 5-10)
    pub fn new(levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(ImbalanceError::invalid("levels must be positive"));
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Score a snapshot
    pub fn compute(&self, snapshot: &OrderBookSnapshot) -> ImbalanceScore {
        self.breakdown(snapshot).score
    }

    /// Score a snapshot and keep the side volumes that produced it
    pub fn breakdown(&self, snapshot: &OrderBookSnapshot) -> DepthImbalance {
        DepthImbalance::from_volumes(
            top_volume(&snapshot.bids, self.levels),
            top_volume(&snapshot.asks, self.levels),
        )
    }
}

impl Default for ImbalanceCalculator {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS,
        }
    }
}

/// Compute the imbalance of the top `levels` entries of each side.
///
/// `levels` larger than the book uses every available entry; zero levels is
/// rejected.
pub fn compute_imbalance(
    bids: &[PriceLevel],
    asks: &[PriceLevel],
    levels: usize,
) -> Result<ImbalanceScore> {
    if levels == 0 {
        return Err(ImbalanceError::invalid("levels must be positive"));
    }
    Ok(DepthImbalance::from_volumes(top_volume(bids, levels), top_volume(asks, levels)).score)
}

fn top_volume(side: &[PriceLevel], levels: usize) -> u128 {
    side.iter().take(levels).map(|level| level.volume as u128).sum()
}

/// Volumes behind a score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthImbalance {
    pub bid_volume: u128,
    pub ask_volume: u128,
    pub score: ImbalanceScore,
}

impl DepthImbalance {
    fn from_volumes(bid_volume: u128, ask_volume: u128) -> Self {
        let total = bid_volume + ask_volume;

        let score = if total == 0 {
            ImbalanceScore::ZERO
        } else {
            let diff = bid_volume as f64 - ask_volume as f64;
            ImbalanceScore::from_ratio(diff / total as f64)
        };

        Self {
            bid_volume,
            ask_volume,
            score,
        }
    }

    pub fn total_volume(&self) -> u128 {
        self.bid_volume + self.ask_volume
    }

    /// No volume on the considered levels: the zero score carries no
    /// information about balance.
    pub fn is_degenerate(&self) -> bool {
        self.total_volume() == 0
    }
}
