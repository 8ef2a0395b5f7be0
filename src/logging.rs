// Structured logging using tracing
//
// Console output goes to stderr and only carries warnings so it does not
// tear up the progress bar. Everything at `info` (or the level requested via
// the filter directive) is written to a daily-rotated file in the platform
// data directory.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_PREFIX: &str = "youtube-downloader";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// None disables the file layer
    pub log_directory: Option<PathBuf>,
    /// Filter for the file layer
    pub file_filter: String,
    /// Filter for the console layer
    pub console_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: default_log_dir(),
            file_filter: "info".to_string(),
            console_filter: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Apply a user-supplied directive to both layers
    pub fn with_filter(mut self, directive: Option<&str>) -> Self {
        if let Some(d) = directive {
            self.file_filter = d.to_string();
            self.console_filter = d.to_string();
        }
        self
    }
}

pub fn default_log_dir() -> Option<PathBuf> {
    crate::config::app_data_dir().map(|d| d.join("logs"))
}

/// Keeps the file writer alive; drop it only at exit
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

fn filter(directive: &str, fallback: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init(config: &LoggingConfig) -> LogGuard {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter(&config.console_filter, "warn"));

    let mut guard = None;
    let file = config.log_directory.as_ref().and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, format!("{}.log", LOG_PREFIX));
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter(&config.file_filter, "info")),
        )
    });

    // a second init (tests) is harmless
    let _ = tracing_subscriber::registry().with(console).with(file).try_init();

    LogGuard { _file: guard }
}
