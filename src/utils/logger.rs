use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Initialize logging system
///
/// `RUST_LOG` overrides `level` when set.
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) -> Result<()> {
    let subscriber = build_subscriber(level, json_output, log_file)?;
    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")?;
    Ok(())
}

/// Initialize logger from config
pub fn init_from_config(config: &crate::utils::config::LoggingConfig) -> Result<()> {
    let json = config.output == "json";
    let log_file = if !config.file_path.is_empty() {
        Some(Path::new(&config.file_path))
    } else {
        None
    };

    init_logger(&config.level, json, log_file)
}

/// Subscriber for the given output settings, not yet installed
fn build_subscriber(level: &str, json_output: bool, log_file: Option<&Path>) -> Result<BoxedSubscriber> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let subscriber: BoxedSubscriber = match (json_output, log_file) {
        (true, Some(path)) => {
            let file = open_log_file(path)?;
            Box::new(registry.with(fmt::layer().json().with_writer(Mutex::new(file))))
        }
        (true, None) => Box::new(registry.with(fmt::layer().json())),
        (false, Some(path)) => {
            let file = open_log_file(path)?;
            Box::new(registry.with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))))
        }
        // Pretty formatting for development
        (false, None) => Box::new(registry.with(fmt::layer().pretty())),
    };

    Ok(subscriber)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("imbalance-{}-{}.log", name, std::process::id()))
    }

    #[test]
    fn test_json_file_output() {
        let path = temp_log("json");
        let _ = std::fs::remove_file(&path);

        // scoped to this thread; the global default stays untouched
        let subscriber = build_subscriber("info", true, Some(&path)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(tick = 7, "stream loop started");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let line: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["message"], "stream loop started");
        assert_eq!(line["fields"]["tick"], 7);
    }

    #[test]
    fn test_missing_log_directory_is_an_error() {
        let path = std::env::temp_dir()
            .join(format!("imbalance-missing-{}", std::process::id()))
            .join("monitor.log");

        let err = match build_subscriber("info", false, Some(&path)) {
            Ok(_) => panic!("log file in a missing directory should not open"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("failed to open log file"));
    }
}
