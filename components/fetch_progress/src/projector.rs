// components/fetch_progress/src/projector.rs
use crate::bytes::format_bytes;
use crate::lines::LogLine;
use crate::parse::{classify, ParsedUpdate};
use crate::sink::{Notice, ProgressSink, ProjectionEvent};
use crate::state::{Meter, ProgressState, Stage, NOT_AVAILABLE};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Cadence of the synthetic conversion meter
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// The synthetic conversion meter never passes this until the run completes
pub const SYNTHETIC_CEILING: f64 = 90.0;

/// Upper bound (exclusive) of a single synthetic increment
pub const MAX_TICK_INCREMENT: f64 = 15.0;

/// Stateful projection of a downloader run onto two meters.
///
/// The projector owns the current [`Stage`] and the live [`ProgressState`] of
/// each [`Meter`]. Every change is reported to the sink as a
/// [`ProjectionEvent`]; the sink never feeds anything back.
pub struct ProgressProjector<S> {
    sink: S,
    stage: Stage,
    download: Option<ProgressState>,
    conversion: Option<ProgressState>,
    conversion_seen: bool,
    torn_down: bool,
    rng: fastrand::Rng,
}

impl<S: ProgressSink> ProgressProjector<S> {
    pub fn new(sink: S) -> Self {
        Self::with_rng(sink, fastrand::Rng::new())
    }

    /// Use a specific random source for the synthetic conversion meter
    pub fn with_rng(sink: S, rng: fastrand::Rng) -> Self {
        Self {
            sink,
            stage: Stage::Idle,
            download: None,
            conversion: None,
            conversion_seen: false,
            torn_down: false,
            rng,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The live state of a meter, `None` unless it is currently active
    pub fn state(&self, meter: Meter) -> Option<&ProgressState> {
        match meter {
            Meter::Download => self.download.as_ref(),
            Meter::Conversion => self.conversion.as_ref(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Whether the synthetic conversion meter should be ticking
    pub fn wants_ticks(&self) -> bool {
        !self.torn_down && self.stage == Stage::Converting && self.conversion.is_some()
    }

    /// Classify one line and apply it, returning what it was classified as
    pub fn handle_line(&mut self, line: &LogLine) -> ParsedUpdate {
        let update = classify(line.raw());
        trace!(source = %line.source(), ?update, "classified line");
        self.apply(&update);
        update
    }

    /// Advance the synthetic conversion meter by a random step
    pub fn tick(&mut self) {
        if !self.wants_ticks() {
            return;
        }
        let increment = self.rng.f64() * MAX_TICK_INCREMENT;

        if let Some(state) = self.conversion.as_mut() {
            if state.percent >= SYNTHETIC_CEILING {
                return;
            }
            state.advance_to((state.percent + increment).min(SYNTHETIC_CEILING));
            state.status = "Converting...".to_string();
            let state = state.clone();
            self.sink.emit(ProjectionEvent::Updated {
                meter: Meter::Conversion,
                state,
            });
        }
    }

    /// The downloader exited successfully: drive active meters to 100%
    pub fn complete(&mut self) {
        if self.torn_down {
            return;
        }
        self.finish_meter(Meter::Download);
        if self.conversion.is_some() {
            self.finish_meter(Meter::Conversion);
            self.notify(Notice::ConversionComplete);
        }
        self.transition(Stage::Done);
    }

    /// The run failed: stop active meters where they are
    pub fn abandon(&mut self) {
        if self.torn_down {
            return;
        }
        for meter in [Meter::Download, Meter::Conversion] {
            if let Some(state) = self.slot(meter).take() {
                warn!(%meter, percent = state.percent, "abandoning meter");
                self.sink.emit(ProjectionEvent::Abandoned { meter, state });
            }
        }
        self.transition(Stage::Done);
    }

    /// Remove all meters. Later calls, lines and ticks are no-ops.
    pub fn tear_down(&mut self) {
        if self.torn_down {
            return;
        }
        self.download = None;
        self.conversion = None;
        self.transition(Stage::Done);
        self.torn_down = true;
        self.sink.emit(ProjectionEvent::TornDown);
    }

    fn apply(&mut self, update: &ParsedUpdate) {
        if self.torn_down {
            return;
        }
        match update {
            ParsedUpdate::DownloadBytes {
                downloaded,
                speed,
                eta,
                ..
            } => {
                let percent = update.download_percent().unwrap_or_default();
                self.download_progress(percent, format_bytes(*downloaded), speed, eta);
            }
            ParsedUpdate::DownloadPercent {
                percent,
                size,
                speed,
                eta,
            } => {
                self.download_progress(*percent, or_not_available(size), speed, eta);
            }
            ParsedUpdate::DownloadDestination { filename } => self.destination(filename),
            ParsedUpdate::ConversionStart => self.start_conversion(),
            ParsedUpdate::MergeStart => self.start_merge(),
            ParsedUpdate::Extraction { message } => {
                self.notify(Notice::Extraction(message.clone()))
            }
            ParsedUpdate::FormatsSelected { formats } => {
                self.notify(Notice::FormatsSelected(formats.clone()))
            }
            ParsedUpdate::Message { text } => self.notify(Notice::Message(text.clone())),
            ParsedUpdate::DownloadComplete
            | ParsedUpdate::DownloadIgnored
            | ParsedUpdate::Suppressed
            | ParsedUpdate::NoMatch => {}
        }
    }

    fn download_progress(
        &mut self,
        percent: f64,
        transferred: String,
        speed: &Option<String>,
        eta: &Option<String>,
    ) {
        match self.stage {
            Stage::Idle => {
                self.transition(Stage::Downloading);
                self.start_meter(Meter::Download);
            }
            Stage::Downloading => {}
            stage => {
                trace!(%stage, "ignoring download progress outside the download stage");
                return;
            }
        }

        let Some(state) = self.download.as_mut() else {
            return;
        };
        state.advance_to(percent);
        state.transferred = transferred;
        state.speed = or_not_available(speed);
        state.eta = or_not_available(eta);
        let state = state.clone();
        self.sink.emit(ProjectionEvent::Updated {
            meter: Meter::Download,
            state,
        });
    }

    fn destination(&mut self, filename: &str) {
        match self.stage {
            Stage::Idle => {}
            Stage::Downloading => {
                // yt-dlp fetches video and audio one after the other; the
                // second file gets a fresh meter instead of a stuck one
                if self.download.as_ref().is_some_and(|s| s.percent > 0.0) {
                    self.start_meter(Meter::Download);
                }
            }
            _ => return,
        }
        self.notify(Notice::Destination(filename.to_string()));
    }

    fn start_conversion(&mut self) {
        if self.conversion_seen || self.stage == Stage::Done {
            trace!("conversion already started");
            return;
        }
        self.conversion_seen = true;

        if self.download.is_some() {
            self.finish_meter(Meter::Download);
            self.notify(Notice::DownloadComplete);
        }
        self.transition(Stage::Converting);
        self.notify(Notice::ConversionStarted);
        self.start_meter(Meter::Conversion);
    }

    fn start_merge(&mut self) {
        if self.download.is_none() || self.conversion_seen {
            return;
        }
        self.finish_meter(Meter::Download);
        self.notify(Notice::DownloadComplete);
        self.notify(Notice::Merging);
        self.transition(Stage::Merging);
    }

    fn start_meter(&mut self, meter: Meter) {
        let state = match meter {
            Meter::Download => ProgressState::download(),
            Meter::Conversion => ProgressState::conversion(),
        };
        debug!(%meter, "meter started");
        *self.slot(meter) = Some(state.clone());
        self.sink.emit(ProjectionEvent::Started { meter, state });
    }

    fn finish_meter(&mut self, meter: Meter) {
        if let Some(mut state) = self.slot(meter).take() {
            match meter {
                Meter::Download => state.complete_download(),
                Meter::Conversion => state.complete_conversion(),
            }
            debug!(%meter, "meter finished");
            self.sink.emit(ProjectionEvent::Finished { meter, state });
        }
    }

    fn transition(&mut self, to: Stage) {
        if to <= self.stage {
            return;
        }
        debug!(from = %self.stage, %to, "stage changed");
        self.sink.emit(ProjectionEvent::StageChanged {
            from: self.stage,
            to,
        });
        self.stage = to;
    }

    fn notify(&mut self, notice: Notice) {
        self.sink.emit(ProjectionEvent::Notice(notice));
    }

    fn slot(&mut self, meter: Meter) -> &mut Option<ProgressState> {
        match meter {
            Meter::Download => &mut self.download,
            Meter::Conversion => &mut self.conversion,
        }
    }
}

fn or_not_available(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::StreamSource;
    use assert_matches::assert_matches;

    fn projector() -> ProgressProjector<Vec<ProjectionEvent>> {
        ProgressProjector::with_rng(Vec::new(), fastrand::Rng::with_seed(7))
    }

    fn feed(projector: &mut ProgressProjector<Vec<ProjectionEvent>>, lines: &[&str]) {
        for line in lines {
            projector.handle_line(&LogLine::new(*line, StreamSource::Stdout));
        }
    }

    fn stage_changes(events: &[ProjectionEvent]) -> Vec<(Stage, Stage)> {
        events
            .iter()
            .filter_map(|event| match event {
                ProjectionEvent::StageChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    fn position(events: &[ProjectionEvent], wanted: impl Fn(&ProjectionEvent) -> bool) -> usize {
        events.iter().position(wanted).expect("event not emitted")
    }

    fn download_percents(events: &[ProjectionEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|event| match event {
                ProjectionEvent::Updated {
                    meter: Meter::Download,
                    state,
                } => Some(state.percent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_progress_line_starts_download_meter() {
        let mut projector = projector();
        feed(&mut projector, &["[download]  50.0% of 10.00MiB at 2.00MiB/s ETA 00:05"]);

        assert_eq!(projector.stage(), Stage::Downloading);
        let state = projector.state(Meter::Download).expect("download active");
        assert!(state.started);
        assert_eq!(state.percent, 50.0);
        assert_eq!(state.transferred, "10.00MiB");
        assert_eq!(state.speed, "2.00MiB/s");
        assert_eq!(state.eta, "00:05");

        let events = projector.sink();
        assert_matches!(&events[0], ProjectionEvent::StageChanged { from: Stage::Idle, to: Stage::Downloading });
        assert_matches!(&events[1], ProjectionEvent::Started { meter: Meter::Download, state } if state.percent == 0.0);
    }

    #[test]
    fn byte_progress_reports_formatted_transfer_size() {
        let mut projector = projector();
        feed(&mut projector, &["[download] 1,536/3,072 (50%)"]);

        let state = projector.state(Meter::Download).expect("download active");
        assert_eq!(state.percent, 50.0);
        assert_eq!(state.transferred, "1.5KB");
        assert_eq!(state.speed, NOT_AVAILABLE);
        assert_eq!(state.eta, NOT_AVAILABLE);
    }

    #[test]
    fn download_percent_is_monotonic() {
        let mut projector = projector();
        feed(
            &mut projector,
            &[
                "[download] 100/1,000 (10%)",
                "[download] 400/1,000 (40%)",
                "[download] 300/1,000 (30%)",
                "[download] 900/1,000 (90%)",
                "[download] 1,000/1,000 (100%)",
            ],
        );

        let percents = download_percents(projector.sink());
        assert_eq!(percents, vec![10.0, 40.0, 40.0, 90.0, 100.0]);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn unmatched_lines_never_touch_state() {
        let mut projector = projector();
        feed(&mut projector, &["[download]  20.0% of 1.00MiB"]);
        let before = projector.state(Meter::Download).cloned();
        let events_before = projector.sink().len();

        for _ in 0..2 {
            let update =
                projector.handle_line(&LogLine::new("[download] Sleeping 3 seconds", StreamSource::Stderr));
            assert_eq!(update, ParsedUpdate::DownloadIgnored);
        }

        assert_eq!(projector.state(Meter::Download).cloned(), before);
        assert_eq!(projector.sink().len(), events_before);
        assert_eq!(projector.stage(), Stage::Downloading);
    }

    #[test]
    fn unknown_lines_surface_as_messages_without_state_change() {
        let mut projector = projector();
        feed(&mut projector, &["totally unexpected output", "\u{1F600} emoji \u{0}"]);

        assert_eq!(projector.stage(), Stage::Idle);
        assert!(projector.state(Meter::Download).is_none());
        assert!(projector.state(Meter::Conversion).is_none());
        assert!(projector
            .sink()
            .iter()
            .all(|event| matches!(event, ProjectionEvent::Notice(Notice::Message(_)))));
    }

    #[test]
    fn conversion_finalizes_download_first() {
        let mut projector = projector();
        feed(
            &mut projector,
            &[
                "[download]  10.0% of 10.00MiB",
                "[download]  60.0% of 10.00MiB",
                "[VideoConvertor] Converting video from webm to mp4",
            ],
        );
        projector.complete();

        let events = projector.sink();
        assert_eq!(
            stage_changes(events),
            vec![
                (Stage::Idle, Stage::Downloading),
                (Stage::Downloading, Stage::Converting),
                (Stage::Converting, Stage::Done),
            ]
        );

        let download_finished = position(events, |e| {
            matches!(e, ProjectionEvent::Finished { meter: Meter::Download, state } if state.percent == 100.0)
        });
        let conversion_started = position(events, |e| {
            matches!(e, ProjectionEvent::Started { meter: Meter::Conversion, .. })
        });
        assert!(download_finished < conversion_started);
        assert!(events.contains(&ProjectionEvent::Notice(Notice::DownloadComplete)));
    }

    #[test]
    fn synthetic_conversion_stays_below_ceiling_until_complete() {
        let mut projector = projector();
        feed(&mut projector, &["[VideoConvertor] Converting video from mkv to mp4"]);
        assert!(projector.wants_ticks());

        let mut last = 0.0;
        for _ in 0..100 {
            projector.tick();
            let percent = projector.state(Meter::Conversion).expect("conversion active").percent;
            assert!(percent >= last, "conversion went backwards: {percent} < {last}");
            assert!(percent <= SYNTHETIC_CEILING);
            last = percent;
        }

        projector.complete();
        let finished = projector
            .sink()
            .iter()
            .find_map(|event| match event {
                ProjectionEvent::Finished {
                    meter: Meter::Conversion,
                    state,
                } => Some(state.clone()),
                _ => None,
            })
            .expect("conversion finished");
        assert_eq!(finished.percent, 100.0);
        assert_eq!(finished.status, "Conversion complete!");
        assert!(!projector.wants_ticks());
    }

    #[test]
    fn ticks_outside_conversion_do_nothing() {
        let mut projector = projector();
        projector.tick();
        feed(&mut projector, &["[download]  5.0% of 1.00MiB"]);
        let events = projector.sink().len();
        projector.tick();

        assert_eq!(projector.sink().len(), events);
    }

    #[test]
    fn repeated_conversion_lines_start_one_meter() {
        let mut projector = projector();
        feed(
            &mut projector,
            &[
                "[VideoConvertor] Converting video from webm to mp4",
                "[VideoConvertor] Converting video from webm to mp4",
            ],
        );

        let starts = projector
            .sink()
            .iter()
            .filter(|e| matches!(e, ProjectionEvent::Started { meter: Meter::Conversion, .. }))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn merge_stops_download_and_ignores_late_download_lines() {
        let mut projector = projector();
        feed(
            &mut projector,
            &[
                "[download] 100.0% of 2.00MiB",
                "[Merger] Merging formats into \"clip.mp4\"",
                "[download]  30.0% of 2.00MiB",
            ],
        );

        assert_eq!(projector.stage(), Stage::Merging);
        assert!(projector.state(Meter::Download).is_none());
        assert_eq!(download_percents(projector.sink()), vec![100.0]);
        assert!(projector
            .sink()
            .contains(&ProjectionEvent::Notice(Notice::Merging)));

        projector.complete();
        assert_eq!(
            stage_changes(projector.sink()),
            vec![
                (Stage::Idle, Stage::Downloading),
                (Stage::Downloading, Stage::Merging),
                (Stage::Merging, Stage::Done),
            ]
        );
    }

    #[test]
    fn merge_without_download_is_ignored() {
        let mut projector = projector();
        feed(&mut projector, &["[Merger] Merging formats into \"clip.mp4\""]);

        assert_eq!(projector.stage(), Stage::Idle);
        assert!(projector.sink().is_empty());
    }

    #[test]
    fn new_destination_restarts_download_meter() {
        let mut projector = projector();
        feed(
            &mut projector,
            &[
                "[download] Destination: /tmp/clip.f136.mp4",
                "[download] 100.0% of 5.00MiB",
                "[download] Destination: /tmp/clip.f140.m4a",
                "[download]  10.0% of 1.00MiB",
            ],
        );

        let starts = projector
            .sink()
            .iter()
            .filter(|e| matches!(e, ProjectionEvent::Started { meter: Meter::Download, .. }))
            .count();
        assert_eq!(starts, 2);
        assert_eq!(projector.state(Meter::Download).map(|s| s.percent), Some(10.0));
        assert!(projector
            .sink()
            .contains(&ProjectionEvent::Notice(Notice::Destination("clip.f140.m4a".into()))));
    }

    #[test]
    fn download_only_run_completes_with_final_values() {
        let mut projector = projector();
        feed(&mut projector, &["[download]  70.0% of 3.00MiB at 1.00MiB/s ETA 00:01"]);
        projector.complete();

        assert_eq!(projector.stage(), Stage::Done);
        assert_matches!(
            projector.sink().last(),
            Some(ProjectionEvent::StageChanged { from: Stage::Downloading, to: Stage::Done })
        );
        let finished = projector
            .sink()
            .iter()
            .find_map(|event| match event {
                ProjectionEvent::Finished { state, .. } => Some(state.clone()),
                _ => None,
            })
            .expect("download finished");
        assert_eq!(finished.percent, 100.0);
        assert_eq!(finished.transferred, "Complete");
        assert_eq!(finished.speed, "Finished");
        assert_eq!(finished.eta, "0:00");
    }

    #[test]
    fn abandon_keeps_last_value() {
        let mut projector = projector();
        feed(&mut projector, &["[download]  42.0% of 3.00MiB"]);
        projector.abandon();

        assert_matches!(
            projector.sink().iter().find(|e| matches!(e, ProjectionEvent::Abandoned { .. })),
            Some(ProjectionEvent::Abandoned { meter: Meter::Download, state }) if state.percent == 42.0
        );
        assert!(!projector
            .sink()
            .iter()
            .any(|e| matches!(e, ProjectionEvent::Finished { .. })));
    }

    #[test]
    fn tear_down_without_any_meter_starts_nothing() {
        let mut projector = projector();
        projector.tear_down();
        projector.tear_down();

        assert_eq!(
            projector.sink(),
            &vec![
                ProjectionEvent::StageChanged {
                    from: Stage::Idle,
                    to: Stage::Done
                },
                ProjectionEvent::TornDown,
            ]
        );
    }

    #[test]
    fn nothing_happens_after_tear_down() {
        let mut projector = projector();
        feed(&mut projector, &["[VideoConvertor] Converting video from webm to mp4"]);
        projector.tear_down();
        let events = projector.sink().len();

        projector.tick();
        projector.complete();
        feed(&mut projector, &["[download]  10.0% of 1.00MiB", "some message"]);

        assert!(!projector.wants_ticks());
        assert_eq!(projector.sink().len(), events);
    }
}
