use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{
    DownloadDirective, PostProcessor, ProgressEvent, ProgressStatus, VideoInfo,
};
use crate::downloader::traits::{MediaEngine, ProgressSink};
use crate::downloader::utils::{run_output_with_timeout, spawn_error};

/// Marker of our machine-readable progress lines
const PROGRESS_TAG: &str = "YTDL";

lazy_static::lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"^YTDL\|(?P<status>[^|]*)\|(?P<downloaded>[^|]*)\|(?P<total>[^|]*)\|(?P<estimate>[^|]*)\|(?P<speed>[^|]*)\s*$"
    ).unwrap();
}

/// Engine adapter that shells out to the yt-dlp executable
#[derive(Debug, Clone, Default)]
pub struct YtDlpEngine;

impl YtDlpEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn probe_args(url: &str, config: &EngineConfig) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        Self::push_ffmpeg_location(&mut args, config);
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    pub fn download_args(url: &str, directive: &DownloadDirective, config: &EngineConfig) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-warnings".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{}|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s",
                PROGRESS_TAG
            ),
            "-f".to_string(),
            directive.format.clone(),
            "-o".to_string(),
            directive.output_template().to_string(),
        ];

        for pp in &directive.postprocessors {
            match pp {
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.push("-x".to_string());
                    args.push("--audio-format".to_string());
                    args.push(codec.clone());
                    args.push("--audio-quality".to_string());
                    args.push(audio_quality_arg(quality));
                }
            }
        }

        Self::push_ffmpeg_location(&mut args, config);
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn push_ffmpeg_location(args: &mut Vec<String>, config: &EngineConfig) {
        if let Some(dir) = &config.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(dir.to_string_lossy().to_string());
        }
    }

    fn parse_info(stdout: &[u8]) -> Result<VideoInfo, DownloadError> {
        let text = String::from_utf8_lossy(stdout);
        let line = text
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| DownloadError::ParseError("yt-dlp printed no metadata".to_string()))?;
        serde_json::from_str(line)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON from yt-dlp: {}", e)))
    }
}

// "128" means a bitrate; yt-dlp wants "128K" for that
fn audio_quality_arg(quality: &str) -> String {
    match quality.parse::<u32>() {
        Ok(q) if q > 10 => format!("{}K", q),
        _ => quality.to_string(),
    }
}

/// Parse one line printed through `--progress-template`
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line.trim_start())?;
    let number = |name: &str| {
        caps.name(name)
            .and_then(|m| m.as_str().trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };
    Some(ProgressEvent {
        status: ProgressStatus::parse(caps.name("status").map_or("", |m| m.as_str())),
        downloaded_bytes: number("downloaded"),
        total_bytes: number("total"),
        total_bytes_estimate: number("estimate"),
        speed: number("speed"),
    })
}

#[async_trait]
impl MediaEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str, config: &EngineConfig) -> Result<VideoInfo, DownloadError> {
        let args = Self::probe_args(url, config);
        debug!(program = %config.ytdlp_path.display(), args = ?args, "probing");

        let output = run_output_with_timeout(&config.ytdlp_path, &args, config.probe_timeout_secs).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            warn!(status = ?output.status.code(), "probe failed: {}", stderr.trim());
            return Err(if stderr.trim().is_empty() {
                DownloadError::ExecutionError(format!("yt-dlp exited with {}", output.status))
            } else {
                DownloadError::from(stderr)
            });
        }

        let info = Self::parse_info(&output.stdout)?;
        info!(title = %info.title, formats = info.formats.len(), "probe succeeded");
        Ok(info)
    }

    async fn download(
        &self,
        url: &str,
        directive: &DownloadDirective,
        config: &EngineConfig,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        let args = Self::download_args(url, directive, config);
        debug!(program = %config.ytdlp_path.display(), args = ?args, "starting download");

        let program = config.ytdlp_path.display().to_string();
        let mut child = Command::new(&config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture yt-dlp stdout".to_string()))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture yt-dlp stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        // titles may arrive in the console code page, not UTF-8
        let mut finished_seen = false;
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| DownloadError::ExecutionError(format!("Failed to read yt-dlp output: {}", e)))?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            match parse_progress_line(line) {
                Some(event) => {
                    finished_seen |= event.status == ProgressStatus::Finished;
                    sink.on_status(&event);
                }
                None => debug!(target: "yt-dlp", "{}", line),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::ExecutionError(format!("Failed to wait for yt-dlp: {}", e)))?;
        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            // already-downloaded files report no progress at all
            if !finished_seen {
                sink.on_status(&ProgressEvent::finished());
            }
            info!("download finished");
            Ok(())
        } else {
            warn!(status = ?status.code(), "download failed: {}", stderr.trim());
            Err(if stderr.trim().is_empty() {
                DownloadError::ExecutionError(format!("yt-dlp exited with {}", status))
            } else {
                DownloadError::from(stderr)
            })
        }
    }
}
