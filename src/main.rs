use anyhow::Result;

use youtube_downloader_lib::config::AppConfig;
use youtube_downloader_lib::downloader::YtDlpEngine;
use youtube_downloader_lib::logging::{self, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    let _log = logging::init(&LoggingConfig::default().with_filter(config.log_filter.as_deref()));

    println!("Loading...");
    let engine = YtDlpEngine::new();
    youtube_downloader_lib::run(config, &engine).await?;
    Ok(())
}
