// components/media_downloader/src/lib.rs
mod request;
mod runner;
mod saved;
mod types;
pub mod ytdlp;

use chrono::Utc;
use fetch_progress::{ProgressProjector, ProgressSink};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use request::{DownloadKind, DownloadRequest, Quality, VIDEO_CONTAINER};
pub use runner::{ProcessRunner, DEFAULT_LINGER};
pub use saved::latest_saved_file;
pub use types::{DownloadError, DownloadOutcome, RunError};

pub struct MediaDownloader {
    output_dir: PathBuf,
    runner: ProcessRunner,
}

impl MediaDownloader {
    /// Create a new MediaDownloader that will store files in the given directory
    pub async fn new(output_dir: impl AsRef<Path>, runner: ProcessRunner) -> Result<Self, DownloadError> {
        let output_dir = output_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&output_dir).await?;

        Ok(Self { output_dir, runner })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download `request`, projecting progress into `projector`
    pub async fn download<S: ProgressSink>(
        &self,
        request: &DownloadRequest,
        projector: &mut ProgressProjector<S>,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome, DownloadError> {
        let started_at = Utc::now();
        info!(url = %request.url, kind = %request.kind, "downloading");

        let args = request.arguments(&self.output_dir);
        self.runner.run(&args, projector, cancel).await?;

        // The run already succeeded, failing to name the file is not fatal
        let saved = match latest_saved_file(&self.output_dir, &request.kind).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(dir = %self.output_dir.display(), error = %e, "could not scan output directory");
                None
            }
        };

        Ok(DownloadOutcome {
            saved,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
