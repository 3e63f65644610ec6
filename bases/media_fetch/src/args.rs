// bases/media_fetch/src/args.rs
use clap::Parser;
use media_downloader::Quality;
use std::path::PathBuf;

/// Download video or audio with yt-dlp, with live progress
///
/// Anything not given on the command line is asked for interactively.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// URL to download from
    #[arg(short, long)]
    pub url: Option<String>,

    /// Download the audio track only
    #[arg(short, long, conflicts_with = "quality")]
    pub audio: bool,

    /// Maximum video quality (1080p, 720p, 480p, 360p, 240p, 144p)
    #[arg(short, long)]
    pub quality: Option<Quality>,

    /// Directory to store downloaded files
    #[arg(short, long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Path to the yt-dlp binary (defaults to bin/yt-dlp, then PATH)
    #[arg(long = "yt-dlp", value_name = "PATH")]
    pub yt_dlp: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn parses_full_command_line() {
        let args = CliArgs::try_parse_from([
            "media-fetch",
            "--url",
            "https://example.com/watch?v=abc",
            "--quality",
            "480p",
            "--output-dir",
            "videos",
            "--yt-dlp",
            "/opt/yt-dlp",
        ])
        .unwrap();

        assert_eq!(args.url.as_deref(), Some("https://example.com/watch?v=abc"));
        assert_eq!(args.quality, Some(Quality::P480));
        assert_eq!(args.output_dir, PathBuf::from("videos"));
        assert_eq!(args.yt_dlp, Some(PathBuf::from("/opt/yt-dlp")));
        assert!(!args.audio);
    }

    #[test]
    fn output_dir_defaults_to_downloads() {
        let args = CliArgs::try_parse_from(["media-fetch"]).unwrap();

        assert_eq!(args.output_dir, PathBuf::from("downloads"));
        assert_eq!(args.url, None);
    }

    #[test]
    fn audio_conflicts_with_quality() {
        let result = CliArgs::try_parse_from(["media-fetch", "--audio", "--quality", "720p"]);

        assert!(result.is_err());
    }

    #[test]
    fn unknown_quality_is_rejected() {
        let result = CliArgs::try_parse_from(["media-fetch", "--quality", "4k"]);

        assert!(result.is_err());
    }
}
