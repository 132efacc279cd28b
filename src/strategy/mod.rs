pub mod signals;
pub mod history;
pub mod stream;

pub use signals::{
    classify, compute_imbalance, DepthImbalance, ImbalanceCalculator, SignalClassifier,
};
pub use history::{HistoryStats, RollingHistory};
pub use stream::{
    LoopState, LoopSummary, SignalSink, SkippedTick, StopHandle, StreamEvent, StreamLoop,
    Termination, TerminationCause, TickOutcome, TickOutput,
};
