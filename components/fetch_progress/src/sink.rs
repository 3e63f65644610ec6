// components/fetch_progress/src/sink.rs
use crate::state::{Meter, ProgressState, Stage};
use std::fmt;

/// Informational text surfaced to the user alongside the meters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Destination(String),
    DownloadComplete,
    Merging,
    ConversionStarted,
    ConversionComplete,
    Extraction(String),
    FormatsSelected(String),
    Message(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Destination(file) => write!(f, "📥 Downloading: {}", file),
            Notice::DownloadComplete => write!(f, "✅ Download complete!"),
            Notice::Merging => write!(f, "🔧 Combining audio and video files..."),
            Notice::ConversionStarted => write!(f, "🔄 Converting to MP4..."),
            Notice::ConversionComplete => write!(f, "✅ Conversion to MP4 complete!"),
            Notice::Extraction(message) => write!(f, "🔍 {}", message),
            Notice::FormatsSelected(formats) => write!(f, "🎥 Selected formats: {}", formats),
            Notice::Message(text) => write!(f, "ℹ️  {}", text),
        }
    }
}

/// Everything a renderer needs to know about a run
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionEvent {
    StageChanged { from: Stage, to: Stage },
    Started { meter: Meter, state: ProgressState },
    Updated { meter: Meter, state: ProgressState },
    /// Driven to completion and stopped
    Finished { meter: Meter, state: ProgressState },
    /// Stopped at its last value because the run failed
    Abandoned { meter: Meter, state: ProgressState },
    Notice(Notice),
    /// All meters are gone; nothing follows this event
    TornDown,
}

/// Receives projection events, typically to draw progress bars
pub trait ProgressSink {
    fn emit(&mut self, event: ProjectionEvent);
}

impl ProgressSink for Vec<ProjectionEvent> {
    fn emit(&mut self, event: ProjectionEvent) {
        self.push(event);
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn emit(&mut self, event: ProjectionEvent) {
        (**self).emit(event);
    }
}
