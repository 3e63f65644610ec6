// components/fetch_progress/src/parse.rs
//! Heuristic matchers for yt-dlp's human-readable log lines.
//!
//! The downloader has no machine-readable progress protocol in this mode, so
//! every matcher here is a substring or regex heuristic on bracket-tagged
//! lines. Matchers are pure and return a [`ParsedUpdate`]; [`classify`]
//! chains them in priority order.

use once_cell::sync::Lazy;
use regex::Regex;

const DOWNLOAD_TAG: &str = "[download]";
const CONVERTOR_TAG: &str = "[VideoConvertor]";
const MERGER_TAG: &str = "[Merger]";
const INFO_TAG: &str = "[info]";
const EXTRACTOR_TAG: &str = "[youtube]";

static BYTES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[download\]\s+([\d,]+)/([\d,]+)\s+\(([\w%]+)\)").expect("valid byte-ratio pattern")
});
static PERCENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+([\d.]+)%").expect("valid percent pattern"));
static SIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"of\s+~?\s*([\d.]+\w+)").expect("valid size pattern"));
static SPEED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"at\s+([\d.]+\w+/s)").expect("valid speed pattern"));
static ETA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ETA\s+([\d:]+)").expect("valid eta pattern"));
static FORMATS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Downloading \d+ format\(s\):\s*(\S+)").expect("valid format selection pattern")
});

/// What a single log line means to the projector
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedUpdate {
    /// `[download] 1,024/2,048 (50%)` style progress
    DownloadBytes {
        downloaded: u64,
        total: u64,
        speed: Option<String>,
        eta: Option<String>,
    },
    /// `[download]  45.2% of ~10.00MiB at 1.20MiB/s ETA 00:05` style progress
    DownloadPercent {
        percent: f64,
        size: Option<String>,
        speed: Option<String>,
        eta: Option<String>,
    },
    DownloadDestination {
        filename: String,
    },
    DownloadComplete,
    /// Tagged `[download]` but nothing we understand; consumed anyway
    DownloadIgnored,
    ConversionStart,
    MergeStart,
    Extraction {
        message: String,
    },
    FormatsSelected {
        formats: String,
    },
    Suppressed,
    Message {
        text: String,
    },
    NoMatch,
}

impl ParsedUpdate {
    /// Percentage carried by a download progress update, clamped to [0, 100]
    pub fn download_percent(&self) -> Option<f64> {
        match self {
            ParsedUpdate::DownloadBytes {
                downloaded, total, ..
            } => Some(ratio_percent(*downloaded, *total)),
            ParsedUpdate::DownloadPercent { percent, .. } => Some(percent.clamp(0.0, 100.0)),
            _ => None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, ParsedUpdate::NoMatch)
    }
}

type Matcher = fn(&str) -> ParsedUpdate;

/// Matchers in priority order; the first one that claims a line wins.
const MATCHERS: [Matcher; 3] = [parse_download_line, detect_conversion, classify_auxiliary];

/// Run a line through the full matcher chain
pub fn classify(line: &str) -> ParsedUpdate {
    MATCHERS
        .iter()
        .map(|matcher| matcher(line))
        .find(ParsedUpdate::is_match)
        .unwrap_or(ParsedUpdate::NoMatch)
}

/// Match `[download]` lines. Declines with `NoMatch` when the tag is absent,
/// otherwise always claims the line.
pub fn parse_download_line(line: &str) -> ParsedUpdate {
    if !line.contains(DOWNLOAD_TAG) {
        return ParsedUpdate::NoMatch;
    }

    if let Some(caps) = BYTES_PATTERN.captures(line) {
        if let (Some(downloaded), Some(total)) = (parse_grouped(&caps[1]), parse_grouped(&caps[2])) {
            return ParsedUpdate::DownloadBytes {
                downloaded,
                total,
                speed: first_capture(&SPEED_PATTERN, line),
                eta: first_capture(&ETA_PATTERN, line),
            };
        }
    }

    if let Some(caps) = PERCENT_PATTERN.captures(line) {
        if let Ok(percent) = caps[1].parse::<f64>() {
            return ParsedUpdate::DownloadPercent {
                percent,
                size: first_capture(&SIZE_PATTERN, line),
                speed: first_capture(&SPEED_PATTERN, line),
                eta: first_capture(&ETA_PATTERN, line),
            };
        }
    }

    if let Some((_, path)) = line.split_once("Destination:") {
        let filename = path
            .trim()
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .to_string();
        return ParsedUpdate::DownloadDestination { filename };
    }

    if line.contains("100%") || line.contains("ETA NA") {
        return ParsedUpdate::DownloadComplete;
    }

    ParsedUpdate::DownloadIgnored
}

/// Detect the start of the recode step
pub fn detect_conversion(line: &str) -> ParsedUpdate {
    if line.contains(CONVERTOR_TAG) && line.contains("Converting video") {
        ParsedUpdate::ConversionStart
    } else {
        ParsedUpdate::NoMatch
    }
}

/// Classify informational lines that never carry progress
pub fn classify_auxiliary(line: &str) -> ParsedUpdate {
    let line = line.trim();
    if line.is_empty() {
        return ParsedUpdate::NoMatch;
    }

    if line.contains(MERGER_TAG) {
        return ParsedUpdate::MergeStart;
    }

    if line.contains("Deleting original file") {
        return ParsedUpdate::Suppressed;
    }

    if line.contains(INFO_TAG) {
        return match FORMATS_PATTERN.captures(line) {
            Some(caps) => ParsedUpdate::FormatsSelected {
                formats: caps[1].to_string(),
            },
            None => ParsedUpdate::Suppressed,
        };
    }

    if line.contains(EXTRACTOR_TAG)
        || line.contains("Extracting")
        || line.contains("Downloading webpage")
    {
        return ParsedUpdate::Extraction {
            message: strip_tag(line).to_string(),
        };
    }

    ParsedUpdate::Message {
        text: line.to_string(),
    }
}

fn ratio_percent(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

fn parse_grouped(digits: &str) -> Option<u64> {
    digits.replace(',', "").parse().ok()
}

fn first_capture(pattern: &Regex, line: &str) -> Option<String> {
    pattern.captures(line).map(|caps| caps[1].to_string())
}

/// Drop one leading `[tag]`, if any
fn strip_tag(line: &str) -> &str {
    if line.starts_with('[') {
        if let Some(end) = line.find(']') {
            return line[end + 1..].trim();
        }
    }
    line
}
