// External tool discovery: ffmpeg location and yt-dlp version

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::app_data_dir;
use crate::downloader::utils::run_output_with_timeout;

/// Environment variable naming an ffmpeg directory or executable
pub const FFMPEG_ENV: &str = "FFMPEG_PATH";

pub const FFMPEG_NAME: &str = "ffmpeg";

/// Last-resort ffmpeg directory, private to this program
pub fn fallback_dir() -> Option<PathBuf> {
    app_data_dir().map(|d| d.join(FFMPEG_NAME))
}

/// Filesystem queries used by the locator
#[cfg_attr(test, mockall::automock)]
pub trait FileProbe {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

pub struct OsFileProbe;

impl FileProbe for OsFileProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Candidate locations, in the order they are tried
#[derive(Debug, Clone, Default)]
pub struct LocatorInputs {
    /// Resource directory of a packaged app bundle
    pub bundle_dir: Option<PathBuf>,
    /// Executable directory, then the source directory
    pub local_dirs: Vec<PathBuf>,
    /// Value of `FFMPEG_PATH`
    pub env_override: Option<OsString>,
    /// Value of `PATH`
    pub search_path: Option<OsString>,
    pub fallback_dir: Option<PathBuf>,
}

impl LocatorInputs {
    /// Inputs describing the running process
    pub fn from_process() -> Self {
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));

        let mut local_dirs = Vec::new();
        if let Some(dir) = &exe_dir {
            local_dirs.push(dir.clone());
        }
        local_dirs.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")));

        Self {
            bundle_dir: bundle_dir(exe_dir.as_deref()),
            local_dirs,
            env_override: env::var_os(FFMPEG_ENV).filter(|v| !v.is_empty()),
            search_path: env::var_os("PATH"),
            fallback_dir: fallback_dir(),
        }
    }
}

// AppImage mounts under $APPDIR; macOS bundles keep resources beside Contents/MacOS
fn bundle_dir(exe_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(appdir) = env::var_os("APPDIR").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(appdir).join("usr").join("bin"));
    }
    let exe_dir = exe_dir?;
    if exe_dir.file_name()? == "MacOS" {
        let contents = exe_dir.parent()?;
        if contents.file_name()? == "Contents" {
            return Some(contents.join("Resources"));
        }
    }
    None
}

pub fn ffmpeg_file_name() -> String {
    format!("{}{}", FFMPEG_NAME, env::consts::EXE_SUFFIX)
}

/// Directory containing ffmpeg for the current process, if any
pub fn locate_ffmpeg() -> Option<PathBuf> {
    locate_in(&LocatorInputs::from_process(), &ffmpeg_file_name(), &OsFileProbe)
}

/// First directory in `inputs` that provides `binary`
pub fn locate_in(inputs: &LocatorInputs, binary: &str, fs: &dyn FileProbe) -> Option<PathBuf> {
    let has_binary = |dir: &Path| fs.is_file(&dir.join(binary));

    // 1. bundle
    if let Some(dir) = inputs.bundle_dir.as_deref() {
        if has_binary(dir) {
            debug!(dir = %dir.display(), "ffmpeg found in app bundle");
            return Some(dir.to_path_buf());
        }
    }

    // 2. next to the executable / sources
    if let Some(dir) = inputs.local_dirs.iter().find(|d| has_binary(d.as_path())) {
        debug!(dir = %dir.display(), "ffmpeg found next to the program");
        return Some(dir.clone());
    }

    // 3. FFMPEG_PATH
    if let Some(raw) = inputs.env_override.as_ref() {
        let path = PathBuf::from(raw);
        if fs.is_dir(&path) {
            debug!(dir = %path.display(), "ffmpeg directory from {}", FFMPEG_ENV);
            return Some(path);
        }
        if fs.is_file(&path) && names_binary(&path, binary) {
            if let Some(parent) = path.parent() {
                debug!(file = %path.display(), "ffmpeg executable from {}", FFMPEG_ENV);
                return Some(parent.to_path_buf());
            }
        }
    }

    // 4. PATH
    if let Some(search) = inputs.search_path.as_ref() {
        if let Some(dir) = env::split_paths(search).find(|d| !d.as_os_str().is_empty() && has_binary(d.as_path())) {
            debug!(dir = %dir.display(), "ffmpeg found on PATH");
            return Some(dir);
        }
    }

    // 5. hardcoded
    if let Some(dir) = inputs.fallback_dir.as_deref() {
        if fs.is_dir(dir) {
            debug!(dir = %dir.display(), "using fallback ffmpeg directory");
            return Some(dir.to_path_buf());
        }
    }

    None
}

// "ffmpeg.exe", "FFmpeg-6.1" ... all count
fn names_binary(path: &Path, binary: &str) -> bool {
    let stem = binary.strip_suffix(env::consts::EXE_SUFFIX).unwrap_or(binary);
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().starts_with(&stem.to_lowercase()))
        .unwrap_or(false)
}

/// `<program> --version`, first line; `None` if it fails or hangs
pub async fn tool_version(program: &Path, timeout_secs: u64) -> Option<String> {
    let output = run_output_with_timeout(program, &["--version".to_string()], timeout_secs)
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
