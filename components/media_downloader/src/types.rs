// components/media_downloader/src/types.rs
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Required dependency not found: {0}")]
    DependencyNotFound(&'static str),

    #[error("yt-dlp binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown quality '{0}' (expected one of 1080p, 720p, 480p, 360p, 240p, 144p)")]
    UnknownQuality(String),

    #[error("Download failed: {0}")]
    Run(#[from] RunError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Why a single downloader process run did not succeed
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch {}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("downloader exited with {}", describe_exit(.code))]
    Exit { code: Option<i32> },

    #[error("failed to read downloader output")]
    Stream {
        #[source]
        source: std::io::Error,
    },

    #[error("download cancelled")]
    Cancelled,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by a signal)".to_string(),
    }
}

/// Result of a successful download
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// The finished file, when one could be identified in the output directory
    pub saved: Option<PathBuf>,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl DownloadOutcome {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
