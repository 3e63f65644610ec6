// bases/media_fetch/src/render.rs
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use fetch_progress::{Meter, ProgressSink, ProgressState, ProjectionEvent};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, warn};

const DOWNLOAD_TEMPLATE: &str = "{prefix:>12} [{bar:40.cyan/blue}] {pos:>3}% | {msg}";
const CONVERSION_TEMPLATE: &str = "{prefix:>12} [{bar:40.magenta/blue}] {pos:>3}% | {msg}";

/// Draws the download and conversion meters as terminal progress bars
pub struct TerminalSink {
    multi: MultiProgress,
    download_style: ProgressStyle,
    conversion_style: ProgressStyle,
    download: Option<ProgressBar>,
    conversion: Option<ProgressBar>,
}

impl TerminalSink {
    pub fn new() -> Result<Self> {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Result<Self> {
        Ok(Self {
            multi: MultiProgress::with_draw_target(target),
            download_style: bar_style(DOWNLOAD_TEMPLATE)?,
            conversion_style: bar_style(CONVERSION_TEMPLATE)?,
            download: None,
            conversion: None,
        })
    }

    fn bar(&self, meter: Meter) -> Option<&ProgressBar> {
        match meter {
            Meter::Download => self.download.as_ref(),
            Meter::Conversion => self.conversion.as_ref(),
        }
    }

    fn slot(&mut self, meter: Meter) -> &mut Option<ProgressBar> {
        match meter {
            Meter::Download => &mut self.download,
            Meter::Conversion => &mut self.conversion,
        }
    }

    fn start(&mut self, meter: Meter, state: &ProgressState) {
        let style = match meter {
            Meter::Download => self.download_style.clone(),
            Meter::Conversion => self.conversion_style.clone(),
        };
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(style);
        bar.set_prefix(label(meter));
        show(&bar, meter, state);

        if let Some(previous) = self.slot(meter).replace(bar) {
            if !previous.is_finished() {
                previous.finish_and_clear();
            }
        }
    }

    fn tear_down(&mut self) {
        for bar in [self.download.take(), self.conversion.take()].into_iter().flatten() {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
    }
}

impl ProgressSink for TerminalSink {
    fn emit(&mut self, event: ProjectionEvent) {
        match event {
            ProjectionEvent::StageChanged { from, to } => debug!(%from, %to, "stage changed"),
            ProjectionEvent::Started { meter, state } => self.start(meter, &state),
            ProjectionEvent::Updated { meter, state } => {
                if let Some(bar) = self.bar(meter) {
                    show(bar, meter, &state);
                }
            }
            ProjectionEvent::Finished { meter, state } => {
                if let Some(bar) = self.bar(meter) {
                    show(bar, meter, &state);
                    bar.finish();
                }
            }
            ProjectionEvent::Abandoned { meter, state } => {
                if let Some(bar) = self.bar(meter) {
                    bar.abandon_with_message(format!("stopped at {:.1}%", state.percent));
                }
            }
            ProjectionEvent::Notice(notice) => {
                if let Err(e) = self.multi.println(notice.to_string()) {
                    warn!(error = %e, "failed to print notice");
                }
            }
            ProjectionEvent::TornDown => self.tear_down(),
        }
    }
}

fn bar_style(template: &str) -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template(template)
        .wrap_err("Invalid progress bar template")?
        .progress_chars("█▓░"))
}

fn label(meter: Meter) -> &'static str {
    match meter {
        Meter::Download => "📥 Download",
        Meter::Conversion => "🔄 Conversion",
    }
}

fn position(state: &ProgressState) -> u64 {
    state.percent.clamp(0.0, 100.0).round() as u64
}

fn show(bar: &ProgressBar, meter: Meter, state: &ProgressState) {
    bar.set_position(position(state));
    let message = match meter {
        Meter::Download => format!("{} | {} | ETA {}", state.transferred, state.speed, state.eta),
        Meter::Conversion => state.status.clone(),
    };
    bar.set_message(message);
}
