// bases/media_fetch/src/app.rs
use crate::config::Config;
use crate::output::OutputHandler;
use crate::prompt;
use crate::render::TerminalSink;
use color_eyre::Result;
use fetch_progress::ProgressProjector;
use media_downloader::{DownloadRequest, MediaDownloader, ProcessRunner};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct App {
    config: Config,
    output: OutputHandler,
}

impl App {
    pub fn new(config: Config, output: OutputHandler) -> Self {
        Self { config, output }
    }

    pub async fn run(&self) -> Result<()> {
        debug!(config = ?self.config, "resolved configuration");
        self.output.print_binary(&self.config.ytdlp);

        let url = match &self.config.url {
            Some(url) => url.clone(),
            None => prompt::ask_url()?,
        };
        let kind = match self.config.kind {
            Some(kind) => kind,
            None => prompt::ask_kind()?,
        };
        let request = DownloadRequest::new(&url, kind)?;

        let runner = ProcessRunner::new(self.config.ytdlp.clone());
        let downloader = MediaDownloader::new(&self.config.output_dir, runner).await?;
        self.output.print_download_start(&request, downloader.output_dir());

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

        let mut projector = ProgressProjector::new(TerminalSink::new()?);
        let result = downloader.download(&request, &mut projector, &cancel).await;
        interrupt.abort();

        let outcome = result?;
        self.output.print_download_complete(&outcome, downloader.output_dir());
        Ok(())
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupted, cancelling download");
        cancel.cancel();
    }
}
