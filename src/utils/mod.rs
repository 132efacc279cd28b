pub mod config;
pub mod logger;
pub mod metrics;

pub use config::{AnalyzerConfig, Config, FailurePolicy, FeedConfig, FeedKind};
pub use logger::{init_from_config, init_logger};
pub use metrics::StreamMetrics;
