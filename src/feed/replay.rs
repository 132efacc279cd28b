use crate::data::OrderBookSnapshot;
use crate::error::DataSourceUnavailable;
use crate::feed::source::SnapshotSource;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

/// Replays a recorded sequence of snapshots, one per call.
///
/// Once exhausted every call reports the feed as unavailable.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    snapshots: VecDeque<OrderBookSnapshot>,
}

impl ReplaySource {
    pub fn new(snapshots: impl IntoIterator<Item = OrderBookSnapshot>) -> Self {
        Self {
            snapshots: snapshots.into_iter().collect(),
        }
    }

    /// Parse one JSON snapshot per line; blank lines are skipped
    pub fn from_json_lines<R: BufRead>(reader: R) -> Result<Self> {
        let mut snapshots = VecDeque::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let snapshot: OrderBookSnapshot = serde_json::from_str(&line)
                .with_context(|| format!("invalid snapshot on line {}", i + 1))?;
            snapshots.push_back(snapshot);
        }
        Ok(Self { snapshots })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open replay file {}", path.display()))?;
        Self::from_json_lines(std::io::BufReader::new(file))
    }

    pub fn remaining(&self) -> usize {
        self.snapshots.len()
    }
}

impl SnapshotSource for ReplaySource {
    fn get_snapshot(&mut self) -> std::result::Result<OrderBookSnapshot, DataSourceUnavailable> {
        self.snapshots
            .pop_front()
            .ok_or_else(|| DataSourceUnavailable::new("replay exhausted"))
    }
}
