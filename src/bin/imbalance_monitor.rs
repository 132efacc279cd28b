use clap::Parser;
use imbalance_analyzer::utils::{init_from_config, FeedKind};
use imbalance_analyzer::{
    Config, ReplaySource, SignalSink, SimulatedOrderBook, SnapshotSource, StreamEvent,
    StreamLoop, StreamMetrics, TerminalChart,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Real-time order book imbalance monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (defaults to $CONFIG_FILE or config/default.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Levels summed on each side of the book
    #[arg(long)]
    levels: Option<usize>,

    /// Signal threshold in (0, 1]
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of scores kept in the history window
    #[arg(long)]
    capacity: Option<usize>,

    /// Tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Seed for the simulated feed
    #[arg(long)]
    seed: Option<u64>,

    /// Replay snapshots from a JSON-lines file instead of simulating
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(levels) = self.levels {
            config.analyzer.levels = levels;
        }
        if let Some(threshold) = self.threshold {
            config.analyzer.threshold = threshold;
        }
        if let Some(capacity) = self.capacity {
            config.analyzer.history_capacity = capacity;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.analyzer.tick_interval_ms = interval_ms;
        }
        if let Some(seed) = self.seed {
            config.feed.seed = Some(seed);
        }
        if let Some(path) = &self.replay {
            config.feed.kind = FeedKind::Replay;
            config.feed.replay_path = Some(path.clone());
        }
    }
}

fn build_source(config: &Config) -> anyhow::Result<Box<dyn SnapshotSource>> {
    match config.feed.kind {
        FeedKind::Simulated => {
            let feed = match config.feed.seed {
                Some(seed) => SimulatedOrderBook::seeded(seed),
                None => SimulatedOrderBook::new(),
            };
            let feed = feed
                .with_depth(config.feed.depth)
                .with_failure_rate(config.feed.failure_rate)?;
            Ok(Box::new(feed))
        }
        FeedKind::Replay => {
            let path = config
                .feed
                .replay_path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("replay feed requires replay_path"))?;
            Ok(Box::new(ReplaySource::from_file(path)?))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    args.apply(&mut config);
    config.validate()?;

    init_from_config(&config.logging)?;

    info!("Starting imbalance analysis");
    info!(
        levels = config.analyzer.levels,
        threshold = config.analyzer.threshold,
        feed = ?config.feed.kind,
        "configuration loaded"
    );

    let source = build_source(&config)?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut stream = StreamLoop::new(&config.analyzer, source, event_tx)?;
    let metrics = if config.metrics.enabled {
        let metrics = StreamMetrics::new()?;
        stream = stream.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };

    let stop = stream.stop_handle();
    let history = stream.history();

    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            ctrl_c_stop.stop();
        }
    });

    let runner = tokio::spawn(async move { stream.run().await });

    let mut chart = TerminalChart::new(std::io::stdout(), config.analyzer.threshold);
    let mut ticks_seen = 0u64;

    while let Some(event) = event_rx.recv().await {
        chart.on_event(&event);

        match event {
            StreamEvent::Terminated(_) => break,
            StreamEvent::Update(_) | StreamEvent::Skipped(_) => {
                ticks_seen += 1;
                if args.ticks.is_some_and(|limit| ticks_seen >= limit) {
                    stop.stop();
                }
            }
        }
    }

    let outcome = runner.await?;

    let stats = history.stats();
    info!(
        count = stats.count,
        mean = ?stats.mean,
        std_dev = ?stats.std_dev,
        min = ?stats.min,
        max = ?stats.max,
        "history window"
    );

    if let Some(metrics) = metrics {
        println!();
        print!("{}", metrics.render()?);
    }

    match outcome {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                updates = summary.updates,
                skipped = summary.skipped,
                "Imbalance analysis finished"
            );
            Ok(())
        }
        Err(e) => {
            error!("Stream terminated: {}", e);
            Err(e.into())
        }
    }
}
