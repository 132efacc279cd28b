pub mod types;

pub use types::{HistoryEntry, ImbalanceScore, OrderBookSnapshot, PriceLevel, Signal};
