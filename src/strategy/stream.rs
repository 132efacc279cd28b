use crate::data::{HistoryEntry, ImbalanceScore, Signal};
use crate::error::{DataSourceUnavailable, ImbalanceError, Result};
use crate::feed::SnapshotSource;
use crate::strategy::history::RollingHistory;
use crate::strategy::signals::{DepthImbalance, ImbalanceCalculator, SignalClassifier};
use crate::utils::config::AnalyzerConfig;
use crate::utils::metrics::StreamMetrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Output of a successful tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// 1-based tick sequence number, skipped ticks included
    pub tick: u64,
    /// Monotonic seconds since the loop was created
    pub timestamp: f64,
    /// Wall-clock time of the update
    pub observed_at: DateTime<Utc>,
    pub score: ImbalanceScore,
    pub signal: Signal,
    pub depth: DepthImbalance,
    /// Oldest-first copy of the history, this tick's entry included
    pub history: Vec<HistoryEntry>,
}

/// A tick dropped because the feed failed
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTick {
    pub tick: u64,
    pub timestamp: f64,
    pub consecutive_failures: u32,
    pub cause: DataSourceUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminationCause {
    StopRequested,
    FailureLimit {
        failures: u32,
        last: DataSourceUnavailable,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Termination {
    /// Last tick attempted before stopping
    pub tick: u64,
    pub cause: TerminationCause,
}

/// Everything the presentation layer can receive
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Update(TickOutput),
    Skipped(SkippedTick),
    Terminated(Termination),
}

/// Presentation capability: receives events in tick order.
///
/// Implemented for channels, `Vec`, boxed sinks and plain
/// `FnMut(&StreamEvent)` closures.
pub trait SignalSink: Send {
    fn on_event(&mut self, event: &StreamEvent);
}

impl SignalSink for mpsc::UnboundedSender<StreamEvent> {
    fn on_event(&mut self, event: &StreamEvent) {
        // A dropped receiver only means nobody is watching any more.
        let _ = self.send(event.clone());
    }
}

impl SignalSink for Vec<StreamEvent> {
    fn on_event(&mut self, event: &StreamEvent) {
        self.push(event.clone());
    }
}

impl SignalSink for Box<dyn SignalSink> {
    fn on_event(&mut self, event: &StreamEvent) {
        (**self).on_event(event)
    }
}

impl<F> SignalSink for F
where
    F: FnMut(&StreamEvent) + Send,
{
    fn on_event(&mut self, event: &StreamEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Cooperative stop request, checked between ticks
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated(Signal),
    Skipped,
}

/// Counters reported when the loop ends on request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    pub ticks: u64,
    pub updates: u64,
    pub skipped: u64,
}

/// Timer-driven pipeline: snapshot -> score -> history -> signal -> sink.
///
/// Sole writer of its `RollingHistory`. Each tick runs to completion before
/// the next one is scheduled.
pub struct StreamLoop<S, K> {
    source: S,
    sink: K,
    calculator: ImbalanceCalculator,
    classifier: SignalClassifier,
    history: RollingHistory,
    tick_interval: Duration,
    failure_limit: Option<u32>,
    started_at: Instant,
    state: LoopState,
    stop: StopHandle,
    consecutive_failures: u32,
    summary: LoopSummary,
    metrics: Option<StreamMetrics>,
}

impl<S: SnapshotSource, K: SignalSink> StreamLoop<S, K> {
    /// Validates the configuration before anything runs
    pub fn new(config: &AnalyzerConfig, source: S, sink: K) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            source,
            sink,
            calculator: ImbalanceCalculator::new(config.levels)?,
            classifier: SignalClassifier::new(config.threshold)?,
            history: RollingHistory::new(config.history_capacity)?,
            tick_interval: config.tick_interval(),
            failure_limit: config.failure_limit(),
            started_at: Instant::now(),
            state: LoopState::Running,
            stop: StopHandle::new(),
            consecutive_failures: 0,
            summary: LoopSummary::default(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: StreamMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Reader handle onto the loop's history
    pub fn history(&self) -> RollingHistory {
        self.history.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one tick synchronously.
    ///
    /// Feed failures are absorbed as skipped ticks until the configured
    /// failure limit is reached, at which point the loop stops and the
    /// terminal error is returned.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.state == LoopState::Stopped {
            return Err(ImbalanceError::invalid("tick called on a stopped stream loop"));
        }

        self.summary.ticks += 1;
        let tick = self.summary.ticks;

        let snapshot = match self.source.get_snapshot() {
            Ok(snapshot) => snapshot,
            Err(cause) => return self.skip(tick, cause),
        };

        let timestamp = self.elapsed_secs();
        let depth = self.calculator.breakdown(&snapshot);
        let score = depth.score;

        self.history.append(HistoryEntry::new(timestamp, score))?;
        let signal = self.classifier.classify(score);
        let history = self.history.snapshot();

        self.consecutive_failures = 0;
        self.summary.updates += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_update(score.value(), signal, history.len());
        }

        if depth.is_degenerate() {
            debug!(tick, "no volume on considered levels; score defaults to 0");
        }
        debug!(
            tick,
            score = score.value(),
            bid_volume = %depth.bid_volume,
            ask_volume = %depth.ask_volume,
            signal = %signal,
            "tick processed"
        );

        self.sink.on_event(&StreamEvent::Update(TickOutput {
            tick,
            timestamp,
            observed_at: Utc::now(),
            score,
            signal,
            depth,
            history,
        }));

        Ok(TickOutcome::Updated(signal))
    }

    fn skip(&mut self, tick: u64, cause: DataSourceUnavailable) -> Result<TickOutcome> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.summary.skipped += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_skip(self.consecutive_failures);
        }

        warn!(
            tick,
            consecutive_failures = self.consecutive_failures,
            error = %cause,
            "skipping tick"
        );

        self.sink.on_event(&StreamEvent::Skipped(SkippedTick {
            tick,
            timestamp: self.elapsed_secs(),
            consecutive_failures: self.consecutive_failures,
            cause: cause.clone(),
        }));

        match self.failure_limit {
            Some(limit) if self.consecutive_failures >= limit => {
                let failures = self.consecutive_failures;
                error!(tick, failures, error = %cause, "data source failure limit reached, stopping");

                self.state = LoopState::Stopped;
                self.sink.on_event(&StreamEvent::Terminated(Termination {
                    tick,
                    cause: TerminationCause::FailureLimit {
                        failures,
                        last: cause.clone(),
                    },
                }));

                Err(ImbalanceError::FailureLimitExceeded {
                    failures,
                    last: cause,
                })
            }
            _ => Ok(TickOutcome::Skipped),
        }
    }

    /// Drive ticks at the configured interval until a stop is requested or
    /// the failure limit is hit.
    pub async fn run(&mut self) -> Result<LoopSummary> {
        if self.state == LoopState::Stopped {
            return Err(ImbalanceError::invalid("stream loop already stopped"));
        }

        info!(
            levels = self.calculator.levels(),
            threshold = self.classifier.threshold(),
            capacity = self.history.capacity(),
            interval_ms = self.tick_interval.as_millis() as u64,
            "stream loop started"
        );

        let mut stop_rx = self.stop.subscribe();
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *stop_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {}
                _ = stop_rx.changed() => {}
            }

            if *stop_rx.borrow() {
                break;
            }

            self.tick()?;
        }

        self.state = LoopState::Stopped;
        self.sink.on_event(&StreamEvent::Terminated(Termination {
            tick: self.summary.ticks,
            cause: TerminationCause::StopRequested,
        }));

        info!(
            ticks = self.summary.ticks,
            updates = self.summary.updates,
            skipped = self.summary.skipped,
            "stream loop stopped"
        );

        Ok(self.summary)
    }

    fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
