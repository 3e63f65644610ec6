// components/media_downloader/src/runner.rs
use crate::types::RunError;
use fetch_progress::{LineSplitter, ProgressProjector, ProgressSink, StreamSource, TICK_INTERVAL};
use futures::{stream, StreamExt};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long finished meters stay on screen before teardown
pub const DEFAULT_LINGER: Duration = Duration::from_millis(500);

/// Runs the downloader process and projects its output.
///
/// Stream reads, synthetic ticks and cancellation are all driven from a
/// single `select!` loop, so no part of a run outlives [`ProcessRunner::run`].
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    linger: Duration,
    tick_interval: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            linger: DEFAULT_LINGER,
            tick_interval: TICK_INTERVAL,
        }
    }

    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Run the program to completion.
    ///
    /// Succeeds only on exit code 0. On any other outcome the projector has
    /// already been abandoned or torn down when this returns.
    pub async fn run<S: ProgressSink>(
        &self,
        args: &[String],
        projector: &mut ProgressProjector<S>,
        cancel: &CancellationToken,
    ) -> Result<(), RunError> {
        info!(program = %self.program.display(), ?args, "starting downloader");

        let mut child = match Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                warn!(program = %self.program.display(), error = %source, "failed to launch downloader");
                projector.tear_down();
                return Err(RunError::Launch {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        match self.pump(&mut child, projector, cancel).await {
            Ok(()) => {}
            Err(RunError::Cancelled) => {
                info!("download cancelled, stopping downloader");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill downloader");
                }
                projector.tear_down();
                return Err(RunError::Cancelled);
            }
            Err(e) => {
                stop_after_stream_failure(&mut child, projector).await;
                return Err(e);
            }
        }

        let status = match child.wait().await {
            Ok(status) => status,
            Err(source) => {
                projector.abandon();
                projector.tear_down();
                return Err(RunError::Stream { source });
            }
        };
        info!(%status, "downloader exited");

        if status.success() {
            projector.complete();
            time::sleep(self.linger).await;
            projector.tear_down();
            Ok(())
        } else {
            projector.abandon();
            projector.tear_down();
            Err(RunError::Exit {
                code: status.code(),
            })
        }
    }

    /// Feed both output streams into the projector until they close
    async fn pump<S: ProgressSink>(
        &self,
        child: &mut Child,
        projector: &mut ProgressProjector<S>,
        cancel: &CancellationToken,
    ) -> Result<(), RunError> {
        let stdout = child
            .stdout
            .take()
            .map(|out| ReaderStream::new(out).map(|chunk| (StreamSource::Stdout, chunk)).boxed());
        let stderr = child
            .stderr
            .take()
            .map(|err| ReaderStream::new(err).map(|chunk| (StreamSource::Stderr, chunk)).boxed());
        let mut chunks = stream::select(
            stream::iter(stdout).flatten(),
            stream::iter(stderr).flatten(),
        );

        let mut stdout_lines = LineSplitter::new(StreamSource::Stdout);
        let mut stderr_lines = LineSplitter::new(StreamSource::Stderr);
        let mut ticker = SyntheticTicker::new(self.tick_interval);

        let result = loop {
            ticker.sync(projector.wants_ticks());

            tokio::select! {
                _ = cancel.cancelled() => break Err(RunError::Cancelled),
                _ = ticker.tick() => projector.tick(),
                next = chunks.next() => match next {
                    Some((source, Ok(chunk))) => {
                        let splitter = match source {
                            StreamSource::Stdout => &mut stdout_lines,
                            StreamSource::Stderr => &mut stderr_lines,
                        };
                        for line in splitter.push(&chunk) {
                            projector.handle_line(&line);
                        }
                    }
                    Some((source, Err(e))) => {
                        warn!(%source, error = %e, "failed to read downloader output");
                        break Err(RunError::Stream { source: e });
                    }
                    None => break Ok(()),
                },
            }
        };
        ticker.stop();

        if result.is_ok() {
            for line in stdout_lines.finish().into_iter().chain(stderr_lines.finish()) {
                projector.handle_line(&line);
            }
        }
        result
    }
}

/// The output can no longer be read, so the child may never finish on its own
async fn stop_after_stream_failure<S: ProgressSink>(child: &mut Child, projector: &mut ProgressProjector<S>) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill downloader");
    }
    projector.abandon();
    projector.tear_down();
}

/// Periodic trigger for the synthetic conversion meter.
///
/// The interval only exists while the projector wants ticks; stopping drops
/// it, so a stopped ticker can never fire.
struct SyntheticTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl SyntheticTicker {
    fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    fn sync(&mut self, wanted: bool) {
        match (wanted, self.is_running()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    fn start(&mut self) {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        debug!(period = ?self.period, "synthetic ticker started");
    }

    fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!("synthetic ticker stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Resolves on the next tick; pending forever while stopped
    async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}
