// Downloader module - format menu, engine boundary and progress display

pub mod backends;
pub mod catalog;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod progress;
pub mod tools;
pub mod traits;
pub mod utils;

pub use backends::YtDlpEngine;
pub use catalog::FormatCatalog;
pub use errors::DownloadError;
pub use format_selector::FormatSelector;
pub use models::{CatalogEntry, DownloadDirective, FormatRecord, PostProcessor, ProgressEvent, ProgressStatus, VideoInfo};
pub use progress::ProgressReporter;
pub use traits::{MediaEngine, ProgressSink};
