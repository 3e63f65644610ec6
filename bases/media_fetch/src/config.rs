// bases/media_fetch/src/config.rs
use crate::args::CliArgs;
use media_downloader::{ytdlp, DownloadError, DownloadKind};
use std::path::PathBuf;

/// Resolved media-fetch configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL given on the command line; prompted for when absent
    pub url: Option<String>,

    /// Download kind given on the command line; prompted for when absent
    pub kind: Option<DownloadKind>,

    pub output_dir: PathBuf,

    /// Resolved yt-dlp binary
    pub ytdlp: PathBuf,
}

impl Config {
    /// Create configuration from CLI arguments.
    ///
    /// Fails when no yt-dlp binary can be found, before anything is prompted.
    pub fn from_args(args: CliArgs) -> Result<Self, DownloadError> {
        let ytdlp = ytdlp::locate(args.yt_dlp.as_deref())?;
        let kind = kind_from_args(&args);

        Ok(Self {
            url: args.url,
            kind,
            output_dir: args.output_dir,
            ytdlp,
        })
    }
}

fn kind_from_args(args: &CliArgs) -> Option<DownloadKind> {
    if args.audio {
        Some(DownloadKind::Audio)
    } else {
        args.quality.map(DownloadKind::Video)
    }
}

/// Log filter used when `RUST_LOG` is unset. Quiet by default so log lines
/// don't tear through the progress bars.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "media_fetch=debug,media_downloader=debug,fetch_progress=debug"
    } else {
        "media_fetch=warn,media_downloader=warn,fetch_progress=warn"
    }
}
