//! Liveness poller — drives the probe state machine for one target.
//!
//! With no probe configured a run is a single running check. With a probe
//! the poller loops: inspect, fetch logs since the run started, test the
//! marker, then clear the accumulator, spend one interval of budget and
//! sleep. The first of match, not-running, or budget exhaustion ends it.

use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use livewait_core::config::DEFAULT_TAIL_LINES;
use livewait_core::{InspectionSnapshot, ProbeSpec, TargetId};

use crate::collaborator::{LogTailSource, RuntimeInspector};
use crate::error::{LivenessError, LivenessResult};
use crate::progress::ProgressSink;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The marker was found, or (without a probe) the target was running.
    MatchFound,
    /// The budget ran out without a match.
    TimedOut,
    /// The target stopped running.
    NotRunning,
}

/// Successful result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub target: TargetId,
    pub outcome: Outcome,
    /// Poll iterations performed; zero for a run without a probe.
    pub iterations: u64,
    pub last_inspection: InspectionSnapshot,
}

/// Log fetch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Fetch logs produced after this time. Defaults to the run start.
    pub since: Option<SystemTime>,
    /// Tail size requested per fetch.
    pub max_lines: usize,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            since: None,
            max_lines: DEFAULT_TAIL_LINES,
        }
    }
}

/// Run-scoped loop state.
#[derive(Debug)]
struct PollCursor {
    /// Signed: an uneven interval overshoots below zero on the last poll.
    remaining_budget_ms: i64,
    iterations: u64,
    /// Current interval's log content only; cleared after every miss.
    accumulated_log: String,
    last_inspection: Option<InspectionSnapshot>,
}

impl PollCursor {
    fn new(probe: &ProbeSpec) -> Self {
        Self {
            remaining_budget_ms: i64::try_from(probe.total_budget_ms()).unwrap_or(i64::MAX),
            iterations: 0,
            accumulated_log: String::new(),
            last_inspection: None,
        }
    }

    /// Elapsed minutes as reported in progress messages.
    ///
    /// Derived from the iteration count rather than the wall clock, so
    /// time spent inside inspect and fetch calls is not counted.
    fn approx_elapsed_minutes(&self, probe: &ProbeSpec) -> u64 {
        self.iterations.saturating_mul(probe.interval_ms()) / 60_000
    }
}

/// Polls one target at a time until it is live.
///
/// Holds no per-run state: a poller may be reused for any number of
/// sequential runs, and independent pollers may run concurrently.
pub struct LivenessPoller<I, L, P> {
    inspector: I,
    logs: L,
    progress: P,
    options: PollOptions,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<I, L, P> LivenessPoller<I, L, P>
where
    I: RuntimeInspector,
    L: LogTailSource,
    P: ProgressSink,
{
    /// Create a poller with default fetch options and no cancellation.
    pub fn new(inspector: I, logs: L, progress: P) -> Self {
        Self {
            inspector,
            logs,
            progress,
            options: PollOptions::default(),
            shutdown: None,
        }
    }

    /// Replace the log fetch options.
    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    /// Abandon runs once `true` is published on this channel.
    ///
    /// Cancellation is observed while sleeping between polls and before
    /// each poll after the first; in-flight inspect or fetch calls finish.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Wait until `target` is live according to `probe`.
    ///
    /// Without a probe, the target only has to be running right now.
    pub async fn run(&self, target: &str, probe: Option<&ProbeSpec>) -> LivenessResult<RunReport> {
        match probe {
            None => self.check_running(target).await,
            Some(probe) => {
                self.progress.started(&format!(
                    "Waiting for {target} to log {:?}",
                    probe.required_substring()
                ));
                let result = self.poll(target, probe).await;
                self.progress.completed();
                result
            }
        }
    }

    async fn check_running(&self, target: &str) -> LivenessResult<RunReport> {
        let snapshot = self.inspect(target, None).await?;
        if !snapshot.running {
            warn!(%target, "target is not running");
            return Err(LivenessError::NotRunning {
                target: target.to_string(),
                snapshot,
                iteration: 0,
            });
        }

        debug!(%target, "target is running");
        Ok(RunReport {
            target: target.to_string(),
            outcome: Outcome::MatchFound,
            iterations: 0,
            last_inspection: snapshot,
        })
    }

    async fn poll(&self, target: &str, probe: &ProbeSpec) -> LivenessResult<RunReport> {
        let since = self.options.since.unwrap_or_else(SystemTime::now);
        let interval_ms = i64::try_from(probe.interval_ms()).unwrap_or(i64::MAX);
        let mut shutdown = self.shutdown.clone();
        let mut cursor = PollCursor::new(probe);

        debug!(
            %target,
            budget_ms = probe.total_budget_ms(),
            interval_ms = probe.interval_ms(),
            max_polls = probe.max_iterations(),
            max_lines = self.options.max_lines,
            "liveness probe starting"
        );

        while cursor.remaining_budget_ms > 0 {
            if cursor.iterations > 0 && is_cancelled(&shutdown) {
                return Err(cancelled(target, &cursor));
            }
            cursor.iterations += 1;

            let snapshot = self.inspect(target, cursor.last_inspection).await?;
            cursor.last_inspection = Some(snapshot);
            if !snapshot.running {
                warn!(%target, iteration = cursor.iterations, "target stopped running");
                return Err(LivenessError::NotRunning {
                    target: target.to_string(),
                    snapshot,
                    iteration: cursor.iterations,
                });
            }

            self.logs
                .fetch_since(target, since, self.options.max_lines, &mut cursor.accumulated_log)
                .await
                .map_err(|source| LivenessError::LogFetchFailed {
                    target: target.to_string(),
                    source,
                    last_inspection: snapshot,
                })?;

            if !cursor.accumulated_log.is_empty()
                && cursor.accumulated_log.contains(probe.required_substring())
            {
                info!(%target, iteration = cursor.iterations, "liveness marker found");
                return Ok(RunReport {
                    target: target.to_string(),
                    outcome: Outcome::MatchFound,
                    iterations: cursor.iterations,
                    last_inspection: snapshot,
                });
            }

            self.progress.progress(&format!(
                "Probing for {}m...",
                cursor.approx_elapsed_minutes(probe)
            ));
            cursor.accumulated_log.clear();
            cursor.remaining_budget_ms = cursor.remaining_budget_ms.saturating_sub(interval_ms);
            debug!(
                %target,
                iteration = cursor.iterations,
                remaining_ms = cursor.remaining_budget_ms,
                "liveness marker not found yet"
            );

            if suspend(probe.interval(), &mut shutdown).await {
                return Err(cancelled(target, &cursor));
            }
        }

        warn!(%target, iterations = cursor.iterations, "liveness probe timed out");
        Err(LivenessError::TimedOut {
            target: target.to_string(),
            probe: probe.clone(),
            iterations: cursor.iterations,
            last_inspection: cursor.last_inspection,
        })
    }

    async fn inspect(
        &self,
        target: &str,
        previous: Option<InspectionSnapshot>,
    ) -> LivenessResult<InspectionSnapshot> {
        self.inspector
            .inspect(target)
            .await
            .map_err(|source| LivenessError::InspectionFailed {
                target: target.to_string(),
                source,
                last_inspection: previous,
            })
    }
}

fn cancelled(target: &str, cursor: &PollCursor) -> LivenessError {
    info!(%target, iterations = cursor.iterations, "liveness probe cancelled");
    LivenessError::Cancelled {
        target: target.to_string(),
        iterations: cursor.iterations,
        last_inspection: cursor.last_inspection,
    }
}

fn is_cancelled(shutdown: &Option<watch::Receiver<bool>>) -> bool {
    shutdown.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Sleep for `interval`. Returns `true` if cancelled while sleeping.
async fn suspend(interval: Duration, shutdown: &mut Option<watch::Receiver<bool>>) -> bool {
    let Some(rx) = shutdown else {
        tokio::time::sleep(interval).await;
        return false;
    };
    if *rx.borrow_and_update() {
        return true;
    }

    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = rx.changed() => match changed {
                Ok(()) if *rx.borrow_and_update() => return true,
                Ok(()) => continue,
                // Sender gone: nobody can cancel any more.
                Err(_) => {
                    sleep.as_mut().await;
                    return false;
                }
            },
        }
    }
}
