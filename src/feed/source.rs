use crate::data::OrderBookSnapshot;
use crate::error::DataSourceUnavailable;

/// Market-data feed capability consumed by the stream loop.
///
/// Called once per tick and expected to return promptly. Hosts wrapping a
/// blocking feed must enforce their own timeout and report it as
/// `DataSourceUnavailable`.
pub trait SnapshotSource: Send {
    fn get_snapshot(&mut self) -> Result<OrderBookSnapshot, DataSourceUnavailable>;
}

impl SnapshotSource for Box<dyn SnapshotSource> {
    fn get_snapshot(&mut self) -> Result<OrderBookSnapshot, DataSourceUnavailable> {
        (**self).get_snapshot()
    }
}
