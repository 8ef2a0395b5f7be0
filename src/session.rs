// Interactive prompt loop: link, confirmation, format menu, download

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::downloader::catalog::FormatCatalog;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::{DownloadDirective, VideoInfo};
use crate::downloader::progress::ProgressReporter;
use crate::downloader::traits::MediaEngine;

/// Typed at the post-selection prompt to pick again
pub const CANCEL_TOKEN: &str = "c";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("standard input was closed")]
    InputClosed,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// What a finished session downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub url: String,
    pub directive: DownloadDirective,
}

#[derive(Debug)]
enum State {
    AwaitUrl,
    Confirm { url: String, info: VideoInfo },
    SelectFormat { url: String, info: VideoInfo },
    Downloading { url: String, directive: DownloadDirective },
    Done(Outcome),
}

pub struct Session<'a, R, W> {
    engine: &'a dyn MediaEngine,
    config: &'a EngineConfig,
    input: R,
    out: W,
}

impl<'a, R, W> Session<'a, R, W>
where
    R: BufRead,
    W: Write + Send,
{
    pub fn new(engine: &'a dyn MediaEngine, config: &'a EngineConfig, input: R, out: W) -> Self {
        Self {
            engine,
            config,
            input,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until one download succeeds and the user acknowledges it
    pub async fn run(&mut self) -> Result<Outcome, SessionError> {
        let mut state = State::AwaitUrl;
        loop {
            state = match state {
                State::AwaitUrl => self.await_url().await?,
                State::Confirm { url, info } => self.confirm(url, info)?,
                State::SelectFormat { url, info } => self.select_format(url, &info)?,
                State::Downloading { url, directive } => self.download(url, directive).await?,
                State::Done(outcome) => {
                    self.prompt("\nPress Enter to exit...")?;
                    // EOF is as good as Enter here
                    let mut ack = String::new();
                    self.input.read_line(&mut ack)?;
                    return Ok(outcome);
                }
            };
        }
    }

    async fn await_url(&mut self) -> Result<State, SessionError> {
        let url = self.ask("Enter a video link: ")?;
        if url.is_empty() {
            writeln!(self.out, "No link entered.")?;
            return Ok(State::AwaitUrl);
        }

        match self.engine.probe(&url, self.config).await {
            Ok(info) => {
                info!(url = %url, title = %info.title, "video found");
                writeln!(self.out, "Found video: {}", info.title)?;
                Ok(State::Confirm { url, info })
            }
            Err(e) => {
                warn!(url = %url, error = %e, "probe failed");
                writeln!(self.out, "Video not found or the link is invalid. Try again.")?;
                Ok(State::AwaitUrl)
            }
        }
    }

    fn confirm(&mut self, url: String, info: VideoInfo) -> Result<State, SessionError> {
        loop {
            let answer = self.ask("Download this video? (y/n): ")?.to_lowercase();
            match answer.as_str() {
                "y" => return Ok(State::SelectFormat { url, info }),
                "n" => return Ok(State::AwaitUrl),
                _ => writeln!(self.out, "Invalid input. Try again.")?,
            }
        }
    }

    fn select_format(&mut self, url: String, info: &VideoInfo) -> Result<State, SessionError> {
        let catalog = FormatCatalog::build(&info.formats);
        write!(self.out, "{}", catalog.render(&info.title))?;

        loop {
            let selection = self.ask("Selection (number/format_id/0/m): ")?;
            if selection.is_empty() {
                writeln!(self.out, "No selection entered. Try again.")?;
                continue;
            }
            let directive = FormatSelector::resolve(&selection, &catalog);

            writeln!(
                self.out,
                "You chose: {}. Press Enter to start the download or '{}' to cancel the selection.",
                selection, CANCEL_TOKEN
            )?;
            let answer = self.ask("")?;
            if answer.eq_ignore_ascii_case(CANCEL_TOKEN) {
                writeln!(self.out, "Selection cancelled. Choose a format again.")?;
                continue;
            }

            info!(selection = %selection, format = %directive.format, "format selected");
            return Ok(State::Downloading { url, directive });
        }
    }

    async fn download(&mut self, url: String, directive: DownloadDirective) -> Result<State, SessionError> {
        writeln!(self.out, "Downloading...")?;
        self.out.flush()?;

        let result = {
            let mut reporter = ProgressReporter::new(&mut self.out);
            self.engine
                .download(&url, &directive, self.config, &mut reporter)
                .await
        };

        match result {
            Ok(()) => {
                info!(url = %url, "download succeeded");
                writeln!(self.out, "\nDownload completed successfully!")?;
                Ok(State::Done(Outcome { url, directive }))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "download failed");
                writeln!(self.out, "\nDownload failed: {}", e)?;
                writeln!(self.out, "Try again with the same or a new link.")?;
                Ok(State::AwaitUrl)
            }
        }
    }

    fn prompt(&mut self, text: &str) -> Result<(), SessionError> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }

    /// Prompt and read one trimmed line; EOF ends the session
    fn ask(&mut self, text: &str) -> Result<String, SessionError> {
        self.prompt(text)?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SessionError::InputClosed);
        }
        Ok(line.trim().to_string())
    }
}
