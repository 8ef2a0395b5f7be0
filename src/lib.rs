pub mod config;
pub mod downloader;
pub mod logging;
pub mod session;

use std::io::Write;
use std::path::PathBuf;

use tracing::{info, warn};

use config::{AppConfig, EngineConfig};
use downloader::tools;
use downloader::traits::MediaEngine;
use session::{Outcome, Session, SessionError};

/// Attach the ffmpeg directory to `engine`, or tell the user it is missing
pub fn with_ffmpeg<W: Write>(
    engine: EngineConfig,
    ffmpeg_dir: Option<PathBuf>,
    out: &mut W,
) -> std::io::Result<EngineConfig> {
    match &ffmpeg_dir {
        Some(dir) => info!(dir = %dir.display(), "using ffmpeg"),
        None => {
            warn!("ffmpeg not found");
            writeln!(
                out,
                "WARNING: ffmpeg was not found. MP3 conversion and formats that need merging \
                 will fail until ffmpeg is installed (or {} points at it).",
                tools::FFMPEG_ENV
            )?;
        }
    }
    Ok(engine.with_ffmpeg_location(ffmpeg_dir))
}

/// Whole program minus logging setup: locate tools, then run one session
pub async fn run(
    config: AppConfig,
    engine: &dyn MediaEngine,
) -> Result<Outcome, SessionError> {
    let mut stdout = std::io::stdout();
    let engine_config = with_ffmpeg(config.engine, tools::locate_ffmpeg(), &mut stdout)?;

    match tools::tool_version(&engine_config.ytdlp_path, engine_config.probe_timeout_secs).await {
        Some(version) => info!(engine = engine.name(), version = %version, "engine ready"),
        None => warn!(
            program = %engine_config.ytdlp_path.display(),
            "yt-dlp did not answer --version; probes will likely fail"
        ),
    }

    let stdin = std::io::stdin().lock();
    let mut session = Session::new(engine, &engine_config, stdin, stdout);
    session.run().await
}
