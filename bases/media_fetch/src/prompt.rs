// bases/media_fetch/src/prompt.rs
use inquire::validator::Validation;
use inquire::{CustomUserError, InquireError, Select, Text};
use media_downloader::{DownloadKind, DownloadRequest, Quality};
use std::fmt;

/// Ask for the URL to download
pub fn ask_url() -> Result<String, InquireError> {
    Text::new("Media URL:")
        .with_help_message("Any page yt-dlp understands, e.g. a YouTube watch link")
        .with_validator(validate_url)
        .prompt()
        .map(|url| url.trim().to_string())
}

/// Ask for audio or video, then for a quality tier when video was chosen
pub fn ask_kind() -> Result<DownloadKind, InquireError> {
    let choice = Select::new("Download type:", vec![KindChoice::Video, KindChoice::Audio]).prompt()?;

    match choice {
        KindChoice::Audio => Ok(DownloadKind::Audio),
        KindChoice::Video => ask_quality().map(DownloadKind::Video),
    }
}

fn ask_quality() -> Result<Quality, InquireError> {
    let options: Vec<QualityChoice> = Quality::ALL.into_iter().map(QualityChoice).collect();
    let default = Quality::ALL
        .iter()
        .position(|quality| *quality == Quality::P720)
        .unwrap_or_default();

    Select::new("Video quality:", options)
        .with_starting_cursor(default)
        .prompt()
        .map(|choice| choice.0)
}

fn validate_url(input: &str) -> Result<Validation, CustomUserError> {
    Ok(match check_url(input) {
        Ok(()) => Validation::Valid,
        Err(message) => Validation::Invalid(message.into()),
    })
}

fn check_url(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        return Err("Please enter a URL".to_string());
    }
    DownloadRequest::new(input, DownloadKind::Audio)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindChoice {
    Video,
    Audio,
}

impl fmt::Display for KindChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindChoice::Video => f.write_str("🎬 Video"),
            KindChoice::Audio => f.write_str("🎵 Audio only"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QualityChoice(Quality);

impl fmt::Display for QualityChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.0.description())
    }
}
