// components/fetch_progress/src/state.rs
use std::fmt;

/// Placeholder shown for a field the downloader did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// The two independent progress meters of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meter {
    Download,
    Conversion,
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meter::Download => write!(f, "download"),
            Meter::Conversion => write!(f, "conversion"),
        }
    }
}

/// Where a run is in the downloader's lifecycle.
///
/// Stages only move forward: `Idle → Downloading → Merging → Converting → Done`,
/// where `Merging` and `Converting` may each be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Idle,
    Downloading,
    Merging,
    Converting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Downloading => "downloading",
            Stage::Merging => "merging",
            Stage::Converting => "converting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Snapshot of one meter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    pub started: bool,
    /// Always within [0, 100]
    pub percent: f64,
    pub transferred: String,
    pub speed: String,
    pub eta: String,
    pub status: String,
}

impl ProgressState {
    pub(crate) fn download() -> Self {
        Self {
            started: true,
            percent: 0.0,
            transferred: "0B".to_string(),
            speed: "0B/s".to_string(),
            eta: "calculating...".to_string(),
            status: String::new(),
        }
    }

    pub(crate) fn conversion() -> Self {
        Self {
            started: true,
            status: "Starting conversion...".to_string(),
            ..Self::default()
        }
    }

    /// Move forward to `percent`; never backwards, never past 100
    pub(crate) fn advance_to(&mut self, percent: f64) {
        self.percent = self.percent.max(percent.clamp(0.0, 100.0));
    }

    pub(crate) fn complete_download(&mut self) {
        self.percent = 100.0;
        self.transferred = "Complete".to_string();
        self.speed = "Finished".to_string();
        self.eta = "0:00".to_string();
    }

    pub(crate) fn complete_conversion(&mut self) {
        self.percent = 100.0;
        self.status = "Conversion complete!".to_string();
    }
}
