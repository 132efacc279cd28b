pub mod source;
pub mod simulated;
pub mod replay;

pub use source::SnapshotSource;
pub use simulated::SimulatedOrderBook;
pub use replay::ReplaySource;
