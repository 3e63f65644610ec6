// components/fetch_progress/src/lib.rs
//! Projection of a downloader's free-text log into two progress meters.
//!
//! Raw output chunks go through a [`LineSplitter`], every resulting
//! [`LogLine`] is classified by a fixed chain of heuristic matchers into a
//! [`ParsedUpdate`], and the [`ProgressProjector`] turns those updates into
//! [`ProjectionEvent`]s for whatever [`ProgressSink`] renders them.

mod bytes;
mod lines;
mod parse;
mod projector;
mod sink;
mod state;

pub use bytes::format_bytes;
pub use lines::{LineSplitter, LogLine, StreamSource};
pub use parse::{classify, classify_auxiliary, detect_conversion, parse_download_line, ParsedUpdate};
pub use projector::{ProgressProjector, MAX_TICK_INCREMENT, SYNTHETIC_CEILING, TICK_INTERVAL};
pub use sink::{Notice, ProgressSink, ProjectionEvent};
pub use state::{Meter, ProgressState, Stage, NOT_AVAILABLE};
