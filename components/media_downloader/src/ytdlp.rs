// components/media_downloader/src/ytdlp.rs
use crate::types::DownloadError;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(windows)]
pub const BINARY_NAME: &str = "yt-dlp.exe";
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "yt-dlp";

/// Directory a bundled binary is expected in, relative to the executable
/// or the working directory
const BUNDLE_DIR: &str = "bin";

/// Find the yt-dlp binary.
///
/// An explicit path must exist. Otherwise `bin/yt-dlp` next to the running
/// executable or in the working directory is preferred over `PATH`.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, DownloadError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(DownloadError::BinaryNotFound(path.to_path_buf()))
        };
    }

    if let Some(bundled) = bundled_candidates().into_iter().find(|p| p.is_file()) {
        debug!(path = %bundled.display(), "using bundled yt-dlp");
        return Ok(bundled);
    }

    which::which(BINARY_NAME).map_err(|_| DownloadError::DependencyNotFound("yt-dlp"))
}

fn bundled_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(exe_dir) = env::current_exe().ok().as_deref().and_then(Path::parent) {
        candidates.push(exe_dir.join(BUNDLE_DIR).join(BINARY_NAME));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(BUNDLE_DIR).join(BINARY_NAME));
    }
    candidates
}
