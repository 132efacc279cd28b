pub mod imbalance;
pub mod classifier;

pub use imbalance::{compute_imbalance, DepthImbalance, ImbalanceCalculator};
pub use classifier::{classify, SignalClassifier};
