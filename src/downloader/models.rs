// Common data models for downloader

use serde::Deserialize;

/// Output template used for every download
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// One format entry from `yt-dlp --dump-json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormatRecord {
    /// Format ID (e.g., "137", "140")
    #[serde(default)]
    pub format_id: Option<String>,
    /// Container extension (mp4, webm, m4a)
    #[serde(default)]
    pub ext: Option<String>,
    /// Video height in pixels
    #[serde(default)]
    pub height: Option<u32>,
    /// Audio bitrate in kbps
    #[serde(default)]
    pub abr: Option<f64>,
    /// Video codec (avc1, vp9, av01, none)
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    #[serde(default)]
    pub acodec: Option<String>,
    /// Format note (e.g., "1080p", "tiny")
    #[serde(default)]
    pub format_note: Option<String>,
}

/// Result of a metadata probe
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formats: Vec<FormatRecord>,
}

fn unknown_title() -> String {
    "unknown".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FormatRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<FormatRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Display-ready projection of a [`FormatRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub format_id: String,
    pub ext: String,
    /// "1080p", "128kbps", the format note, or empty
    pub label: String,
    /// "v:avc1,a:mp4a.40.2"
    pub codecs: String,
}

/// Step applied by the engine after the raw download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// FFmpegExtractAudio
    ExtractAudio { codec: String, quality: String },
}

impl PostProcessor {
    pub fn key(&self) -> &'static str {
        match self {
            Self::ExtractAudio { .. } => "FFmpegExtractAudio",
        }
    }
}

/// Resolved instruction set handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDirective {
    /// yt-dlp format selector
    pub format: String,
    pub postprocessors: Vec<PostProcessor>,
    pub output_template: Option<String>,
}

impl DownloadDirective {
    pub fn format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            postprocessors: Vec::new(),
            output_template: None,
        }
    }

    pub fn output_template(&self) -> &str {
        self.output_template
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_TEMPLATE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStatus {
    #[default]
    Downloading,
    Finished,
    /// Anything else the engine reports (e.g. "error")
    Other,
}

impl ProgressStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            _ => Self::Other,
        }
    }
}

/// Status callback payload from the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub downloaded_bytes: Option<f64>,
    pub total_bytes: Option<f64>,
    pub total_bytes_estimate: Option<f64>,
    /// Bytes per second
    pub speed: Option<f64>,
}

impl ProgressEvent {
    pub fn downloading(downloaded: f64, total: Option<f64>, speed: Option<f64>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            total_bytes_estimate: None,
            speed,
        }
    }

    pub fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            ..Self::default()
        }
    }

    /// Exact total preferred, estimate otherwise
    pub fn effective_total(&self) -> Option<f64> {
        self.total_bytes
            .filter(|t| *t > 0.0)
            .or(self.total_bytes_estimate.filter(|t| *t > 0.0))
    }
}
