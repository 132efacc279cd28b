pub mod data;
pub mod error;
pub mod feed;
pub mod strategy;
pub mod display;
pub mod utils;

// Re-export commonly used types
pub use data::{HistoryEntry, ImbalanceScore, OrderBookSnapshot, PriceLevel, Signal};
pub use error::{DataSourceUnavailable, ImbalanceError, Result};
pub use feed::{ReplaySource, SimulatedOrderBook, SnapshotSource};
pub use strategy::{
    classify, compute_imbalance, DepthImbalance, ImbalanceCalculator, LoopState, RollingHistory,
    SignalClassifier, SignalSink, StopHandle, StreamEvent, StreamLoop, TickOutput,
};
pub use display::TerminalChart;
pub use utils::{Config, StreamMetrics};
