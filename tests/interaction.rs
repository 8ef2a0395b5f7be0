// End-to-end scenarios through the public API with a fake engine

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use youtube_downloader_lib::config::EngineConfig;
use youtube_downloader_lib::downloader::tools::{locate_in, LocatorInputs, OsFileProbe};
use youtube_downloader_lib::downloader::{
    DownloadDirective, DownloadError, FormatCatalog, FormatRecord, FormatSelector, MediaEngine,
    PostProcessor, ProgressEvent, ProgressSink, VideoInfo,
};
use youtube_downloader_lib::session::Session;
use youtube_downloader_lib::with_ffmpeg;

fn record(id: &str, height: Option<u32>, abr: Option<f64>, vcodec: &str, acodec: &str) -> FormatRecord {
    FormatRecord {
        format_id: Some(id.to_string()),
        ext: Some("mp4".to_string()),
        height,
        abr,
        vcodec: Some(vcodec.to_string()),
        acodec: Some(acodec.to_string()),
        format_note: None,
    }
}

fn duplicate_137() -> VideoInfo {
    VideoInfo {
        title: "Sample".to_string(),
        formats: vec![
            record("137", Some(1080), None, "avc1", "none"),
            record("140", None, Some(128.0), "none", "aac"),
            record("137", Some(1080), None, "avc1", "none"),
        ],
    }
}

/// Records what the session handed to the engine
struct FakeEngine {
    info: VideoInfo,
    configs: Mutex<Vec<EngineConfig>>,
    directives: Mutex<Vec<DownloadDirective>>,
}

impl FakeEngine {
    fn new(info: VideoInfo) -> Self {
        Self {
            info,
            configs: Mutex::new(Vec::new()),
            directives: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, url: &str, config: &EngineConfig) -> Result<VideoInfo, DownloadError> {
        self.configs.lock().unwrap().push(config.clone());
        if url.starts_with("https://") {
            Ok(self.info.clone())
        } else {
            Err(DownloadError::InvalidUrl(url.to_string()))
        }
    }

    async fn download(
        &self,
        _url: &str,
        directive: &DownloadDirective,
        config: &EngineConfig,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        self.configs.lock().unwrap().push(config.clone());
        self.directives.lock().unwrap().push(directive.clone());
        sink.on_status(&ProgressEvent::downloading(1024.0, None, None));
        sink.on_status(&ProgressEvent::finished());
        Ok(())
    }
}

#[test]
fn duplicate_format_ids_collapse() {
    let catalog = FormatCatalog::build(&duplicate_137().formats);
    let entries = catalog.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].format_id.as_str(), entries[0].label.as_str()), ("137", "1080p"));
    assert_eq!((entries[1].format_id.as_str(), entries[1].label.as_str()), ("140", "128kbps"));

    assert_eq!(FormatSelector::resolve("1", &catalog).format, "137");
    assert_eq!(FormatSelector::resolve("0", &catalog).format, "bestvideo+bestaudio/best");

    let mp3 = FormatSelector::resolve("m", &catalog);
    assert_eq!(mp3.format, "bestaudio");
    assert!(matches!(
        mp3.postprocessors.as_slice(),
        [PostProcessor::ExtractAudio { codec, .. }] if codec == "mp3"
    ));
    assert_eq!(FormatSelector::resolve("m", &FormatCatalog::default()), mp3);
}

#[tokio::test]
async fn session_downloads_selected_entry() {
    let engine = FakeEngine::new(duplicate_137());
    let config = EngineConfig::default();
    let input = Cursor::new("not-a-link\nhttps://video/1\ny\n2\n\n\n");
    let mut session = Session::new(&engine, &config, input, Vec::new());

    let outcome = session.run().await.unwrap();
    assert_eq!(outcome.directive.format, "140");

    let out = String::from_utf8(session.into_output()).unwrap();
    assert!(out.contains("Video not found or the link is invalid."));
    assert_eq!(out.matches("format_id=137").count(), 1);
    assert!(out.contains("1.0 KB/?"));
    assert_eq!(engine.directives.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_ffmpeg_warns_and_passes_no_location() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = LocatorInputs {
        bundle_dir: None,
        local_dirs: vec![tmp.path().to_path_buf()],
        env_override: None,
        search_path: Some(std::env::join_paths([tmp.path().join("bin")]).unwrap()),
        fallback_dir: Some(tmp.path().join("not-there")),
    };
    let located = locate_in(&inputs, "ffmpeg", &OsFileProbe);
    assert!(located.is_none());

    let mut banner = Vec::new();
    let config = with_ffmpeg(EngineConfig::default(), located, &mut banner).unwrap();
    assert!(String::from_utf8(banner).unwrap().starts_with("WARNING: ffmpeg was not found"));
    assert!(config.ffmpeg_location.is_none());

    let engine = FakeEngine::new(duplicate_137());
    let mut session = Session::new(&engine, &config, Cursor::new("https://video/1\ny\n0\n\n\n"), Vec::new());
    session.run().await.unwrap();

    let configs = engine.configs.lock().unwrap();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().all(|c| c.ffmpeg_location.is_none()));
}

#[test]
fn found_ffmpeg_is_passed_silently() {
    let tmp = tempfile::tempdir().unwrap();
    let mut banner = Vec::new();
    let config = with_ffmpeg(EngineConfig::default(), Some(tmp.path().to_path_buf()), &mut banner).unwrap();
    assert!(banner.is_empty());
    assert_eq!(config.ffmpeg_location.as_deref(), Some(tmp.path()));
}
