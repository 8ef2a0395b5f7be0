// Error types for the download engine boundary

use regex::Regex;
use thiserror::Error;

lazy_static::lazy_static! {
    // "[youtube] dQw4w9WgXcQ: " - extractor and video id, never classified
    static ref SUBJECT_RE: Regex = Regex::new(r"^\[[^\]]+\]\s*[^\s:]+:\s*").unwrap();
    static ref INVALID_URL_RE: Regex = Regex::new(r"(?i)unsupported url|is not a valid url").unwrap();
    static ref TIMEOUT_RE: Regex = Regex::new(r"(?i)\btimed out\b|\btimeout\b").unwrap();
    static ref BLOCKED_RE: Regex = Regex::new(
        r"(?i)http error 429|too many requests|sign in to confirm|\bblocked\b"
    ).unwrap();
    static ref TOOL_RE: Regex = Regex::new(r"(?i)command not found").unwrap();
    static ref PARSE_RE: Regex = Regex::new(r"(?i)invalid json|jsondecodeerror").unwrap();
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    /// Network timeout while talking to the video host
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// The host refused the request (429, bot detection, geo block)
    #[error(
        "{0}\n\
         The video host is throttling or blocking requests from this address.\n\
         What you can do:\n\
         1) Wait and try again later\n\
         2) Use a proxy or VPN\n\
         3) Update yt-dlp"
    )]
    Blocked(String),

    /// yt-dlp (or another required tool) is not installed
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The engine rejected the link
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Unknown error with details
    #[error("{0}")]
    Unknown(String),
}

// yt-dlp prefixes fatal messages with "ERROR: "; the last one is the reason
fn error_line(s: &str) -> String {
    let mut lines = s.lines().map(str::trim).filter(|l| !l.is_empty());
    let fatal = lines.clone().rev().find(|l| l.starts_with("ERROR:"));
    fatal
        .or_else(|| lines.next_back())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| s.trim().to_string())
}

// Classify raw engine stderr into a variant
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let message = error_line(&s);
        let reason = SUBJECT_RE.replace(&message, "");

        if INVALID_URL_RE.is_match(&reason) {
            return Self::InvalidUrl(message);
        }
        if BLOCKED_RE.is_match(&reason) {
            return Self::Blocked(message);
        }
        if TIMEOUT_RE.is_match(&reason) {
            return Self::NetworkTimeout(message);
        }
        if TOOL_RE.is_match(&reason) {
            return Self::ToolNotFound(message);
        }
        if PARSE_RE.is_match(&reason) {
            return Self::ParseError(message);
        }
        Self::Unknown(message)
    }
}

impl From<&str> for DownloadError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}
