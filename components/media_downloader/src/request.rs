// components/media_downloader/src/request.rs
use crate::types::DownloadError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Flags that make yt-dlp print one progress line per update
const PROGRESS_ARGS: [&str; 2] = ["--newline", "--progress"];

/// Container every video download is recoded into
pub const VIDEO_CONTAINER: &str = "mp4";

/// Video resolution tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    P1080,
    P720,
    P480,
    P360,
    P240,
    P144,
}

impl Quality {
    /// All tiers, best first
    pub const ALL: [Quality; 6] = [
        Quality::P1080,
        Quality::P720,
        Quality::P480,
        Quality::P360,
        Quality::P240,
        Quality::P144,
    ];

    /// Maximum video height in pixels
    pub fn height(self) -> u32 {
        match self {
            Quality::P1080 => 1080,
            Quality::P720 => 720,
            Quality::P480 => 480,
            Quality::P360 => 360,
            Quality::P240 => 240,
            Quality::P144 => 144,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Quality::P1080 => "Full HD - highest quality",
            Quality::P720 => "HD",
            Quality::P480 => "SD",
            Quality::P360 => "low",
            Quality::P240 => "very low",
            Quality::P144 => "extremely light",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

impl FromStr for Quality {
    type Err = DownloadError;

    /// Accepts `720p`, `720P` or plain `720`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let height = trimmed
            .strip_suffix(|c: char| c == 'p' || c == 'P')
            .unwrap_or(trimmed)
            .parse::<u32>()
            .ok();
        Quality::ALL
            .into_iter()
            .find(|quality| Some(quality.height()) == height)
            .ok_or_else(|| DownloadError::UnknownQuality(s.to_string()))
    }
}

/// What to fetch from the URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Audio,
    Video(Quality),
}

impl DownloadKind {
    /// yt-dlp `-f` format selector
    pub fn selector(&self) -> String {
        match self {
            DownloadKind::Audio => "bestaudio".to_string(),
            DownloadKind::Video(quality) => {
                let height = quality.height();
                format!(
                    "bestvideo[ext=mp4][height<={height}]+bestaudio[ext=m4a]/bestvideo[height<={height}]+bestaudio"
                )
            }
        }
    }

    /// yt-dlp `-o` output template inside `output_dir`
    pub fn output_template(&self, output_dir: &Path) -> String {
        let file = match self {
            DownloadKind::Audio => "%(title)s.%(ext)s".to_string(),
            DownloadKind::Video(quality) => format!("%(title)s-{}.%(ext)s", quality),
        };
        output_dir.join(file).to_string_lossy().into_owned()
    }

    pub fn extra_args(&self) -> Vec<String> {
        match self {
            DownloadKind::Audio => Vec::new(),
            DownloadKind::Video(_) => vec!["--recode-video".to_string(), VIDEO_CONTAINER.to_string()],
        }
    }

    /// Extensions a finished file of this kind can have
    pub fn finished_extensions(&self) -> &'static [&'static str] {
        match self {
            DownloadKind::Audio => &["m4a", "webm", "opus", "mp3", "ogg", "aac", "flac", "wav"],
            DownloadKind::Video(_) => &[VIDEO_CONTAINER],
        }
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadKind::Audio => write!(f, "audio only"),
            DownloadKind::Video(quality) => write!(f, "video {}", quality),
        }
    }
}

/// A validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: Url,
    pub kind: DownloadKind,
}

impl DownloadRequest {
    pub fn new(url: &str, kind: DownloadKind) -> Result<Self, DownloadError> {
        let url = Url::parse(url.trim()).map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self { url, kind })
    }

    /// Full yt-dlp argument list, URL last
    pub fn arguments(&self, output_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = PROGRESS_ARGS.iter().map(|arg| arg.to_string()).collect();
        args.push("-f".to_string());
        args.push(self.kind.selector());
        args.push("-o".to_string());
        args.push(self.kind.output_template(output_dir));
        args.extend(self.kind.extra_args());
        args.push(self.url.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("1080p", Quality::P1080)]
    #[case("720", Quality::P720)]
    #[case(" 480P ", Quality::P480)]
    #[case("144p", Quality::P144)]
    fn parses_quality_labels(#[case] input: &str, #[case] expected: Quality) {
        assert_eq!(input.parse::<Quality>().unwrap(), expected);
    }

    #[rstest]
    #[case("4k")]
    #[case("1440p")]
    #[case("")]
    fn rejects_unknown_quality(#[case] input: &str) {
        assert_matches!(input.parse::<Quality>(), Err(DownloadError::UnknownQuality(_)));
    }

    #[test]
    fn audio_selector_is_single_track() {
        assert_eq!(DownloadKind::Audio.selector(), "bestaudio");
        assert!(DownloadKind::Audio.extra_args().is_empty());
    }

    #[test]
    fn video_selector_caps_height_with_fallback() {
        assert_eq!(
            DownloadKind::Video(Quality::P720).selector(),
            "bestvideo[ext=mp4][height<=720]+bestaudio[ext=m4a]/bestvideo[height<=720]+bestaudio"
        );
        assert_eq!(
            DownloadKind::Video(Quality::P720).extra_args(),
            vec!["--recode-video", "mp4"]
        );
    }

    #[test]
    fn output_template_carries_quality_suffix_for_video() {
        let dir = Path::new("downloads");
        assert_eq!(
            DownloadKind::Audio.output_template(dir),
            Path::new("downloads").join("%(title)s.%(ext)s").to_string_lossy()
        );
        assert_eq!(
            DownloadKind::Video(Quality::P360).output_template(dir),
            Path::new("downloads").join("%(title)s-360p.%(ext)s").to_string_lossy()
        );
    }

    #[test]
    fn video_arguments_are_in_downloader_order() {
        let request =
            DownloadRequest::new("https://example.com/watch?v=abc", DownloadKind::Video(Quality::P1080)).unwrap();
        let dir = Path::new("out");

        assert_eq!(
            request.arguments(dir),
            vec![
                "--newline".to_string(),
                "--progress".to_string(),
                "-f".to_string(),
                DownloadKind::Video(Quality::P1080).selector(),
                "-o".to_string(),
                DownloadKind::Video(Quality::P1080).output_template(dir),
                "--recode-video".to_string(),
                "mp4".to_string(),
                "https://example.com/watch?v=abc".to_string(),
            ]
        );
    }

    #[test]
    fn audio_arguments_end_with_url() {
        let request = DownloadRequest::new("https://example.com/a", DownloadKind::Audio).unwrap();
        let args = request.arguments(Path::new("out"));

        assert_eq!(args.len(), 7);
        assert_eq!(args[3], "bestaudio");
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/a"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert_matches!(
            DownloadRequest::new("not a url", DownloadKind::Audio),
            Err(DownloadError::InvalidUrl(_))
        );
    }
}
