use crate::data::Signal;
use anyhow::Result;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Prometheus instruments updated by the stream loop
#[derive(Clone)]
pub struct StreamMetrics {
    registry: Registry,
    pub ticks: IntCounter,
    pub ticks_skipped: IntCounter,
    pub signals: IntCounterVec,
    pub last_score: Gauge,
    pub history_len: IntGauge,
    pub consecutive_failures: IntGauge,
}

impl StreamMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let ticks = IntCounter::new("imbalance_ticks_total", "Ticks that produced an update")?;
        let ticks_skipped = IntCounter::new(
            "imbalance_ticks_skipped_total",
            "Ticks skipped because the data source was unavailable",
        )?;
        let signals = IntCounterVec::new(
            Opts::new("imbalance_signals_total", "Signals emitted by classification"),
            &["signal"],
        )?;
        let last_score = Gauge::new("imbalance_last_score", "Most recent imbalance score")?;
        let history_len = IntGauge::new("imbalance_history_len", "Entries in the rolling history")?;
        let consecutive_failures = IntGauge::new(
            "imbalance_consecutive_failures",
            "Current run of consecutive data source failures",
        )?;

        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(ticks_skipped.clone()))?;
        registry.register(Box::new(signals.clone()))?;
        registry.register(Box::new(last_score.clone()))?;
        registry.register(Box::new(history_len.clone()))?;
        registry.register(Box::new(consecutive_failures.clone()))?;

        Ok(Self {
            registry,
            ticks,
            ticks_skipped,
            signals,
            last_score,
            history_len,
            consecutive_failures,
        })
    }

    pub(crate) fn record_update(&self, score: f64, signal: Signal, history_len: usize) {
        self.ticks.inc();
        self.signals.with_label_values(&[signal.as_str()]).inc();
        self.last_score.set(score);
        self.history_len.set(history_len as i64);
        self.consecutive_failures.set(0);
    }

    pub(crate) fn record_skip(&self, consecutive_failures: u32) {
        self.ticks_skipped.inc();
        self.consecutive_failures.set(consecutive_failures as i64);
    }

    pub fn signal_count(&self, signal: Signal) -> u64 {
        self.signals.with_label_values(&[signal.as_str()]).get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_updates_and_skips() {
        let metrics = StreamMetrics::new().unwrap();
        metrics.record_update(0.7, Signal::StrongBuy, 1);
        metrics.record_update(0.1, Signal::Neutral, 2);
        metrics.record_skip(1);

        assert_eq!(metrics.ticks.get(), 2);
        assert_eq!(metrics.ticks_skipped.get(), 1);
        assert_eq!(metrics.signal_count(Signal::StrongBuy), 1);
        assert_eq!(metrics.signal_count(Signal::StrongSell), 0);
        assert_eq!(metrics.history_len.get(), 2);
        assert_eq!(metrics.consecutive_failures.get(), 1);
        assert!((metrics.last_score.get() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_render_exposition() {
        let metrics = StreamMetrics::new().unwrap();
        metrics.record_update(-0.8, Signal::StrongSell, 1);

        let text = metrics.render().unwrap();
        assert!(text.contains("imbalance_ticks_total 1"));
        assert!(text.contains("signal=\"strong_sell\""));
    }
}
