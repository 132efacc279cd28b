use crate::data::HistoryEntry;
use crate::error::{ImbalanceError, Result};
use parking_lot::RwLock;
use statrs::statistics::Statistics;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of retained entries
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity, time-ordered window of imbalance scores.
///
/// Cloning yields another handle onto the same buffer. Eviction and append
/// happen under one write lock, so `snapshot()` never sees a half-applied
/// append.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    entries: Arc<RwLock<VecDeque<HistoryEntry>>>,
    capacity: usize,
}

impl RollingHistory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ImbalanceError::invalid("history capacity must be positive"));
        }
        Ok(Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting the oldest one when full.
    ///
    /// Non-finite timestamps and entries older than the newest stored entry
    /// are rejected.
    pub fn append(&self, entry: HistoryEntry) -> Result<()> {
        if !entry.timestamp.is_finite() {
            return Err(ImbalanceError::invalid(format!(
                "history timestamp must be finite, got {}",
                entry.timestamp
            )));
        }

        let mut entries = self.entries.write();

        if let Some(last) = entries.back() {
            if entry.timestamp < last.timestamp {
                return Err(ImbalanceError::invalid(format!(
                    "history entry at {}s precedes newest entry at {}s",
                    entry.timestamp, last.timestamp
                )));
            }
        }

        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    /// Oldest-first copy of the current window
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.read().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn latest(&self) -> Option<HistoryEntry> {
        self.entries.read().back().copied()
    }

    /// Summary statistics over the retained scores
    pub fn stats(&self) -> HistoryStats {
        let scores: Vec<f64> = self
            .entries
            .read()
            .iter()
            .map(|e| e.score.value())
            .collect();
        HistoryStats::from_scores(&scores)
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(DEFAULT_CAPACITY))),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// History statistics for monitoring
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub count: usize,
    pub latest: Option<f64>,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two entries
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl HistoryStats {
    fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                count: 0,
                latest: None,
                mean: None,
                std_dev: None,
                min: None,
                max: None,
            };
        }

        let std_dev = if scores.len() >= 2 {
            Some(scores.std_dev())
        } else {
            None
        };

        Self {
            count: scores.len(),
            latest: scores.last().copied(),
            mean: Some(scores.mean()),
            std_dev,
            min: Some(Statistics::min(scores)),
            max: Some(Statistics::max(scores)),
        }
    }
}
