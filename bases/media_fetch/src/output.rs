// bases/media_fetch/src/output.rs
use media_downloader::{DownloadOutcome, DownloadRequest};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_binary(&self, binary: &Path) {
        if self.verbose {
            println!("Using yt-dlp: {}", binary.display());
        }
    }

    pub fn print_download_start(&self, request: &DownloadRequest, output_dir: &Path) {
        println!("\n🚀 Starting download ({}) from: {}", request.kind, request.url);
        println!("📁 Saving to: {}\n", output_dir.display());
    }

    pub fn print_download_complete(&self, outcome: &DownloadOutcome, output_dir: &Path) {
        println!("\n🎉 Download complete!");
        match &outcome.saved {
            Some(path) => println!("📄 Saved as: {}", path.display()),
            None => println!("📁 Files saved in: {}", output_dir.display()),
        }

        if self.verbose {
            let elapsed = outcome.elapsed();
            println!(
                "Download time: {}.{:03}s",
                elapsed.num_seconds(),
                elapsed.num_milliseconds() % 1000
            );
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("\n❌ Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}
