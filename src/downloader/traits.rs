// Engine trait definition

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{DownloadDirective, ProgressEvent, VideoInfo};
use crate::config::EngineConfig;

/// Extraction/download engine (yt-dlp or a test double)
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Fetch title and formats without downloading
    async fn probe(&self, url: &str, config: &EngineConfig) -> Result<VideoInfo, DownloadError>;

    /// Download with status events delivered to `sink`
    async fn download(
        &self,
        url: &str,
        directive: &DownloadDirective,
        config: &EngineConfig,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError>;
}

/// Receiver of engine status events. Calls are serialized by the engine.
pub trait ProgressSink: Send {
    fn on_status(&mut self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent) + Send,
{
    fn on_status(&mut self, event: &ProgressEvent) {
        self(event)
    }
}
