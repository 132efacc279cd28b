use crate::data::{HistoryEntry, Signal};
use crate::strategy::stream::{SignalSink, StreamEvent, TerminationCause, TickOutput};
use std::io::Write;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Text renderer for the imbalance stream
///
/// Prints one title line per update plus a sparkline of the history window
/// scaled to [-1, 1], marking points past the threshold.
pub struct TerminalChart<W: Write + Send> {
    out: W,
    threshold: f64,
    width: usize,
}

impl<W: Write + Send> TerminalChart<W> {
    pub fn new(out: W, threshold: f64) -> Self {
        Self {
            out,
            threshold,
            width: 100,
        }
    }

    /// Limit the sparkline to the most recent `width` points
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, event: &StreamEvent) -> std::io::Result<()> {
        match event {
            StreamEvent::Update(update) => {
                writeln!(self.out, "{}", title(update))?;
                writeln!(self.out, "  {}", self.sparkline(&update.history))?;
                writeln!(
                    self.out,
                    "  bid {} / ask {} | {} points | t={:.1}s",
                    update.depth.bid_volume,
                    update.depth.ask_volume,
                    update.history.len(),
                    update.timestamp
                )?;
            }
            StreamEvent::Skipped(skip) => {
                writeln!(
                    self.out,
                    "(tick {} skipped: {} [{} in a row])",
                    skip.tick, skip.cause.reason, skip.consecutive_failures
                )?;
            }
            StreamEvent::Terminated(end) => match &end.cause {
                TerminationCause::StopRequested => {
                    writeln!(self.out, "Stream stopped after {} ticks.", end.tick)?
                }
                TerminationCause::FailureLimit { failures, last } => writeln!(
                    self.out,
                    "Stream terminated after {} consecutive failures: {}",
                    failures, last.reason
                )?,
            },
        }
        self.out.flush()
    }

    fn sparkline(&self, history: &[HistoryEntry]) -> String {
        let start = history.len().saturating_sub(self.width);
        history[start..]
            .iter()
            .map(|entry| {
                let value = entry.score.value();
                if value > self.threshold {
                    '+'
                } else if value < -self.threshold {
                    '-'
                } else {
                    // map [-1, 1] onto the block ramp
                    let idx = ((value + 1.0) / 2.0 * (SPARK.len() - 1) as f64).round() as usize;
                    SPARK[idx.min(SPARK.len() - 1)]
                }
            })
            .collect()
    }
}

/// Headline text, e.g. `STRONG BUY SIGNAL (Imbalance: 0.72)`
pub fn title(update: &TickOutput) -> String {
    match update.signal {
        Signal::Neutral => format!("Neutral (Imbalance: {:.2})", update.score),
        signal => format!("{} SIGNAL (Imbalance: {:.2})", signal.label(), update.score),
    }
}

impl<W: Write + Send> SignalSink for TerminalChart<W> {
    fn on_event(&mut self, event: &StreamEvent) {
        if let Err(e) = self.render(event) {
            tracing::warn!("failed to render update: {}", e);
        }
    }
}
