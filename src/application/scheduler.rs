//! Periodic driver for the quote and news streams.
//!
//! Each stream runs in its own task with its own cadence, and shares
//! nothing with the other stream except the store. A stream's progress is
//! an explicit [`StreamState`] value threaded through every tick and
//! published read-only over a `watch` channel.
//!
//! ```text
//!   Idle ──tick──▶ Running ──▶ Success | PartialFailure | Failure ──▶ Idle
//!                     │
//!                     └─ already running / outside window ──▶ Skipped
//! ```
//!
//! After a run the next tick is scheduled one cadence later. If any item in
//! the run was rate limited, the configured backoff is added on top.
//! Failures never shorten or stop the loop.

use crate::application::run_report::RunReport;
use crate::domain::values::stream::{RunStatus, StreamKind, StreamPhase};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// One ingestion batch, runnable by the scheduler.
#[async_trait]
pub trait IngestJob: Send + Sync {
    fn kind(&self) -> StreamKind;

    /// Whether the stream should poll at `now`. Defaults to always.
    fn in_window(&self, _now: DateTime<Utc>) -> bool {
        true
    }

    async fn run(&self) -> RunReport;
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamState {
    pub kind: StreamKind,
    pub phase: StreamPhase,
    pub last_status: Option<RunStatus>,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub completed_runs: u64,
    pub skipped_runs: u64,
    pub consecutive_failures: u32,
}

impl StreamState {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            phase: StreamPhase::Idle,
            last_status: None,
            last_started_at: None,
            last_finished_at: None,
            completed_runs: 0,
            skipped_runs: 0,
            consecutive_failures: 0,
        }
    }

    fn begin(mut self, now: DateTime<Utc>) -> Self {
        self.phase = StreamPhase::Running;
        self.last_started_at = Some(now);
        self
    }

    fn finish(mut self, report: &RunReport) -> Self {
        self.phase = StreamPhase::Idle;
        self.last_status = Some(report.status);
        self.last_finished_at = Some(report.finished_at);
        self.completed_runs += 1;
        if report.status == RunStatus::Failure {
            self.consecutive_failures += 1;
        } else {
            self.consecutive_failures = 0;
        }
        self
    }

    fn skip(mut self) -> Self {
        self.skipped_runs += 1;
        self
    }
}

/// Runs one stream's job with at most one run in flight.
pub struct StreamRunner {
    job: Arc<dyn IngestJob>,
    cadence: Duration,
    backoff: Duration,
    in_flight: Mutex<()>,
    state_tx: watch::Sender<StreamState>,
}

impl StreamRunner {
    pub fn new(job: Arc<dyn IngestJob>, cadence: Duration, backoff: Duration) -> Self {
        let (state_tx, _) = watch::channel(StreamState::new(job.kind()));
        Self {
            job,
            cadence,
            backoff,
            in_flight: Mutex::new(()),
            state_tx,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.job.kind()
    }

    pub fn state(&self) -> StreamState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state_tx.subscribe()
    }

    /// Run once now, honoring the window and the single-flight guard.
    pub async fn trigger(&self) -> RunReport {
        let (_, report) = self.tick(self.state(), true).await;
        report
    }

    /// Run once regardless of the market window (manual runs).
    pub async fn trigger_now(&self) -> RunReport {
        let (_, report) = self.tick(self.state(), false).await;
        report
    }

    async fn tick(&self, state: StreamState, respect_window: bool) -> (StreamState, RunReport) {
        let kind = self.kind();
        if respect_window && !self.job.in_window(Utc::now()) {
            tracing::debug!(stream = %kind, "outside polling window, skipping");
            let state = state.skip();
            self.state_tx.send_replace(state.clone());
            return (state, RunReport::skipped(kind));
        }
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!(stream = %kind, "previous run still in flight, skipping");
            let state = state.skip();
            self.state_tx.send_replace(state.clone());
            return (state, RunReport::skipped(kind));
        };

        let state = state.begin(Utc::now());
        self.state_tx.send_replace(state.clone());

        let report = self.job.run().await;

        // Skip counters may have moved while we ran; keep them.
        let mut state = state.finish(&report);
        state.skipped_runs = self.state_tx.borrow().skipped_runs;
        self.state_tx.send_replace(state.clone());
        if report.status == RunStatus::Failure {
            tracing::error!(
                stream = %kind,
                consecutive = state.consecutive_failures,
                "batch failed for every item"
            );
        }
        (state, report)
    }

    /// Delay until the next tick after `report`.
    pub fn next_delay(&self, report: &RunReport) -> Duration {
        if report.rate_limited() {
            tracing::warn!(stream = %self.kind(), backoff = ?self.backoff, "rate limited, backing off");
            self.cadence + self.backoff
        } else {
            self.cadence
        }
    }

    async fn drive(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut state = self.state();
        tracing::info!(stream = %self.kind(), cadence = ?self.cadence, "stream started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let (next, report) = self.tick(state, true).await;
            state = next;
            let delay = self.next_delay(&report);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!(stream = %self.kind(), runs = state.completed_runs, "stream stopped");
    }
}

/// Owns both stream runners; `start` spawns one task per stream.
pub struct IngestionScheduler {
    runners: Vec<Arc<StreamRunner>>,
    grace: Duration,
}

impl IngestionScheduler {
    pub fn new(runners: Vec<Arc<StreamRunner>>, grace: Duration) -> Self {
        Self { runners, grace }
    }

    pub fn start(&self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tasks = self
            .runners
            .iter()
            .map(|runner| {
                let kind = runner.kind();
                let handle = tokio::spawn(runner.clone().drive(shutdown_rx.clone()));
                (kind, handle)
            })
            .collect();
        SchedulerHandle {
            shutdown_tx,
            tasks,
            runners: self.runners.clone(),
            grace: self.grace,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamShutdown {
    pub stream: StreamKind,
    /// False when the in-flight batch was abandoned after the grace period,
    /// or the stream task had already died (panic or cancellation).
    pub clean: bool,
}

pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(StreamKind, JoinHandle<()>)>,
    runners: Vec<Arc<StreamRunner>>,
    grace: Duration,
}

impl SchedulerHandle {
    pub fn state(&self, kind: StreamKind) -> Option<StreamState> {
        self.runners.iter().find(|r| r.kind() == kind).map(|r| r.state())
    }

    /// Signal both streams, let in-flight batches finish within the grace
    /// period, then abort whatever is left. Aborted work is dropped.
    pub async fn stop(self) -> Vec<StreamShutdown> {
        let _ = self.shutdown_tx.send(true);
        let deadline = tokio::time::Instant::now() + self.grace;
        let mut summary = Vec::with_capacity(self.tasks.len());
        for (stream, mut handle) in self.tasks {
            let clean = match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::error!(stream = %stream, error = %e, "stream task ended abnormally");
                    false
                }
                Err(_) => {
                    tracing::warn!(stream = %stream, grace = ?self.grace, "grace period elapsed, abandoning in-flight batch");
                    handle.abort();
                    false
                }
            };
            summary.push(StreamShutdown { stream, clean });
        }
        summary
    }
}
