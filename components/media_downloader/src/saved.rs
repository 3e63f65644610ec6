// components/media_downloader/src/saved.rs
use crate::request::DownloadKind;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

/// Newest finished file of `kind` in `dir`, if any.
///
/// Partial downloads and per-format intermediates (`name.f137.mp4`) are
/// skipped.
pub async fn latest_saved_file(dir: &Path, kind: &DownloadKind) -> io::Result<Option<PathBuf>> {
    let extensions = kind.finished_extensions();
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_finished_file(&path, extensions) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    if let Some((_, path)) = &newest {
        debug!(path = %path.display(), "newest saved file");
    }
    Ok(newest.map(|(_, path)| path))
}

fn is_finished_file(path: &Path, extensions: &[&str]) -> bool {
    let matches_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
        .unwrap_or(false);
    if !matches_extension {
        return false;
    }

    let stem = match path.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) => stem,
        None => return false,
    };
    !is_format_intermediate(stem)
}

/// yt-dlp names separately fetched streams `title.f<format id>.ext`
fn is_format_intermediate(stem: &str) -> bool {
    match stem.rsplit_once(".f") {
        Some((_, id)) => !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
