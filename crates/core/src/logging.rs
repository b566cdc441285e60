//! Tracing bootstrap shared by the binaries.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Where and how loudly a component logs.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// File prefix inside the log directory, e.g. `cli` gives `cli.log.2024-01-21`.
    pub component: String,
    /// Mirror events to stderr in addition to the rolling file.
    pub to_stderr: bool,
    /// Default filter when `RUST_LOG` is unset.
    pub default_level: &'static str,
}

impl LogOptions {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            to_stderr: false,
            default_level: "info",
        }
    }

    pub fn with_stderr(mut self, to_stderr: bool) -> Self {
        self.to_stderr = to_stderr;
        self
    }

    /// Maps a `-v` count onto a filter level.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.default_level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        self
    }
}

/// `ARBOR_LOG_DIR` if set, otherwise `~/.arbor/logs`.
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ARBOR_LOG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".arbor").join("logs")
}

pub fn init_logging(options: &LogOptions) -> WorkerGuard {
    let dir = log_dir();
    let _ = std::fs::create_dir_all(&dir);

    let file_appender = tracing_appender::rolling::daily(&dir, &options.component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if options.to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        // A second init (tests, embedding hosts) keeps the first subscriber.
        let _ = registry.with(stderr_layer).try_init();
    } else {
        let _ = registry.try_init();
    }

    guard
}
