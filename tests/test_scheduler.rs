mod common;

use async_trait::async_trait;
use common::*;
use sectorpulse::application::run_report::{ItemFailure, RunReport};
use sectorpulse::application::scheduler::{IngestJob, IngestionScheduler, StreamRunner};
use sectorpulse::domain::error::FetchError;
use sectorpulse::domain::values::stream::{RunStatus, StreamKind, StreamPhase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A job that sleeps, then reports the scripted outcome.
struct ScriptedJob {
    kind: StreamKind,
    work: Duration,
    failure: Option<FetchError>,
    runs: AtomicUsize,
}

impl ScriptedJob {
    fn new(kind: StreamKind, work: Duration, failure: Option<FetchError>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            work,
            failure,
            runs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl IngestJob for ScriptedJob {
    fn kind(&self) -> StreamKind {
        self.kind
    }

    async fn run(&self) -> RunReport {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.work).await;
        let mut report = RunReport::begin(self.kind, 1);
        match &self.failure {
            Some(e) => report.failures.push(ItemFailure::new("LMT", e)),
            None => report.stored = 1,
        }
        report.finish()
    }
}

/// A job whose batch panics.
struct PanickingJob;

#[async_trait]
impl IngestJob for PanickingJob {
    fn kind(&self) -> StreamKind {
        StreamKind::Quotes
    }

    async fn run(&self) -> RunReport {
        panic!("batch blew up");
    }
}

#[tokio::test]
async fn test_overlapping_trigger_is_skipped() {
    let h = setup();
    h.quotes.set_delay(Duration::from_millis(200));

    let (a, b) = tokio::join!(
        h.pulse.ingest(StreamKind::Quotes),
        h.pulse.ingest(StreamKind::Quotes)
    );

    let statuses = [a.status, b.status];
    assert!(statuses.contains(&RunStatus::Skipped));
    assert!(statuses.contains(&RunStatus::Success));
    assert_eq!(h.quotes.calls(), 5);

    let state = h.pulse.stream_state(StreamKind::Quotes);
    assert_eq!(state.completed_runs, 1);
    assert_eq!(state.skipped_runs, 1);
    assert_eq!(state.phase, StreamPhase::Idle);
}

#[tokio::test]
async fn test_streams_do_not_block_each_other() {
    let h = setup();
    h.quotes.set_delay(Duration::from_millis(500));
    h.news.set(
        sectorpulse::domain::values::news_subject::NewsSubject::Symbol("LMT".into()),
        Ok(vec![article("Lockheed update", "reuters.com", 5)]),
    );

    let quotes = h.pulse.ingest(StreamKind::Quotes);
    let news = async {
        let started = std::time::Instant::now();
        let report = h.pulse.ingest(StreamKind::News).await;
        (report, started.elapsed())
    };
    let (_, (news_report, news_took)) = tokio::join!(quotes, news);

    assert_eq!(news_report.status, RunStatus::Success);
    assert!(news_took < Duration::from_millis(400));
}

#[tokio::test]
async fn test_rate_limit_adds_backoff() {
    let cadence = Duration::from_secs(60);
    let backoff = Duration::from_secs(300);
    let limited = StreamRunner::new(
        ScriptedJob::new(StreamKind::Quotes, Duration::ZERO, Some(FetchError::RateLimited("429".into()))),
        cadence,
        backoff,
    );
    let failing = StreamRunner::new(
        ScriptedJob::new(StreamKind::Quotes, Duration::ZERO, Some(FetchError::Provider("503".into()))),
        cadence,
        backoff,
    );

    let report = limited.trigger().await;
    assert_eq!(report.status, RunStatus::Failure);
    assert_eq!(limited.next_delay(&report), cadence + backoff);

    // A plain failure keeps the normal cadence.
    let report = failing.trigger().await;
    assert_eq!(report.status, RunStatus::Failure);
    assert_eq!(failing.next_delay(&report), cadence);
    assert_eq!(failing.state().consecutive_failures, 1);
}

#[tokio::test]
async fn test_scheduler_runs_each_stream_independently() {
    let quotes_job = ScriptedJob::new(
        StreamKind::Quotes,
        Duration::ZERO,
        Some(FetchError::Provider("down".into())),
    );
    let news_job = ScriptedJob::new(StreamKind::News, Duration::ZERO, None);
    let scheduler = IngestionScheduler::new(
        vec![
            Arc::new(StreamRunner::new(quotes_job.clone(), Duration::from_millis(30), Duration::ZERO)),
            Arc::new(StreamRunner::new(news_job.clone(), Duration::from_secs(3600), Duration::ZERO)),
        ],
        Duration::from_secs(1),
    );

    let handle = scheduler.start();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let quotes = handle.state(StreamKind::Quotes).unwrap();
    let news = handle.state(StreamKind::News).unwrap();
    // Failing stream keeps ticking at its cadence.
    assert!(quotes_job.runs.load(Ordering::SeqCst) >= 2);
    assert_eq!(quotes.last_status, Some(RunStatus::Failure));
    assert!(quotes.consecutive_failures >= 2);
    assert_eq!(news_job.runs.load(Ordering::SeqCst), 1);
    assert_eq!(news.last_status, Some(RunStatus::Success));

    let summary = handle.stop().await;
    assert!(summary.iter().all(|s| s.clean));
}

#[tokio::test]
async fn test_stop_abandons_work_after_grace() {
    let slow = ScriptedJob::new(StreamKind::Quotes, Duration::from_secs(30), None);
    let quick = ScriptedJob::new(StreamKind::News, Duration::ZERO, None);
    let scheduler = IngestionScheduler::new(
        vec![
            Arc::new(StreamRunner::new(slow, Duration::from_secs(3600), Duration::ZERO)),
            Arc::new(StreamRunner::new(quick, Duration::from_secs(3600), Duration::ZERO)),
        ],
        Duration::from_millis(100),
    );

    let handle = scheduler.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        handle.state(StreamKind::Quotes).unwrap().phase,
        StreamPhase::Running
    );

    let started = std::time::Instant::now();
    let summary = handle.stop().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    let quotes = summary.iter().find(|s| s.stream == StreamKind::Quotes).unwrap();
    let news = summary.iter().find(|s| s.stream == StreamKind::News).unwrap();
    assert!(!quotes.clean);
    assert!(news.clean);
}

#[tokio::test]
async fn test_stop_reports_dead_stream_as_unclean() {
    let quick = ScriptedJob::new(StreamKind::News, Duration::ZERO, None);
    let scheduler = IngestionScheduler::new(
        vec![
            Arc::new(StreamRunner::new(Arc::new(PanickingJob), Duration::from_secs(3600), Duration::ZERO)),
            Arc::new(StreamRunner::new(quick, Duration::from_secs(3600), Duration::ZERO)),
        ],
        Duration::from_secs(1),
    );

    let handle = scheduler.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let summary = handle.stop().await;

    let quotes = summary.iter().find(|s| s.stream == StreamKind::Quotes).unwrap();
    let news = summary.iter().find(|s| s.stream == StreamKind::News).unwrap();
    assert!(!quotes.clean);
    assert!(news.clean);
}
