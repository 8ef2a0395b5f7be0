// Runtime configuration read from the environment

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Engine executable override
pub const YTDLP_ENV: &str = "YTDLP_PATH";
/// Probe timeout override, in seconds
pub const PROBE_TIMEOUT_ENV: &str = "YTDLP_PROBE_TIMEOUT";
/// tracing filter directive
pub const LOG_ENV: &str = "YTDLP_CLI_LOG";

const DEFAULT_PROBE_TIMEOUT: u64 = 60;

const APP_DIR: &str = "youtube-downloader-cli";

/// Per-user data directory of the program (logs, private ffmpeg)
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR))
}

/// Settings threaded through every engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// yt-dlp executable (name on PATH or full path)
    pub ytdlp_path: PathBuf,
    /// Directory holding ffmpeg, passed as `--ffmpeg-location`
    pub ffmpeg_location: Option<PathBuf>,
    pub probe_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_location: None,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl EngineConfig {
    pub fn with_ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_ffmpeg_location(mut self, dir: Option<PathBuf>) -> Self {
        self.ffmpeg_location = dir;
        self
    }

    pub fn with_probe_timeout(mut self, seconds: u64) -> Self {
        self.probe_timeout_secs = seconds;
        self
    }
}

/// Everything read once at startup
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Filter directive for the log subscriber
    pub log_filter: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut engine = EngineConfig::default();
        if let Some(path) = non_empty(YTDLP_ENV) {
            engine = engine.with_ytdlp_path(path);
        }
        if let Some(raw) = non_empty(PROBE_TIMEOUT_ENV) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => engine = engine.with_probe_timeout(secs),
                _ => warn!("ignoring {}={:?}: expected a positive number of seconds", PROBE_TIMEOUT_ENV, raw),
            }
        }

        Self {
            engine,
            log_filter: non_empty(LOG_ENV),
        }
    }
}
