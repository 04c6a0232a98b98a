//! Fetch command handler
//!
//! Starts fetch jobs and follows them until the backend reports progress,
//! printing notifications and a progress line on every refresh.

use anyhow::{Result, bail};
use colored::*;
use newsdesk_client::NewsdeskClient;
use newsdesk_core::domain::source::SourceId;
use newsdesk_tracker::service::Snapshot;
use newsdesk_tracker::{
    ChannelNotifier, HttpSourceRepository, JobPoller, JobTracker, Notification, SessionOutcome,
    SessionState, Severity, TrackerConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Flags of `sources fetch`
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub detach: bool,
    pub poll_interval: Option<u64>,
    pub max_ticks: Option<u32>,
}

/// Builds the tracker configuration from the environment and the flags
fn tracker_config(options: &FetchOptions) -> Result<TrackerConfig> {
    apply_flags(TrackerConfig::from_env()?, options)
}

/// Overrides `config` with the command-line flags and validates the result
fn apply_flags(mut config: TrackerConfig, options: &FetchOptions) -> Result<TrackerConfig> {
    if let Some(secs) = options.poll_interval {
        config = config.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(max_ticks) = options.max_ticks {
        config = config.with_max_ticks(max_ticks);
    }
    config.validate()?;
    Ok(config)
}

/// Handle `sources fetch`
pub async fn fetch_sources(
    client: NewsdeskClient,
    ids: Vec<SourceId>,
    options: FetchOptions,
) -> Result<()> {
    if options.detach {
        return queue_fetches(&client, &ids).await;
    }

    let config = tracker_config(&options)?;
    let budget = config.timeout_budget();
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let tracker = JobTracker::new(
        config,
        Arc::new(HttpSourceRepository::new(client)),
        Arc::new(notifier),
    );
    tracker.refresh().await?;

    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            print_notification(&notification);
        }
    });
    let progress = tokio::spawn(render_progress(
        tracker.store().subscribe(),
        tracker.poller().clone(),
        ids.clone(),
    ));

    let mut sessions = Vec::new();
    let mut failed = 0usize;
    for id in ids {
        match tracker.fetch(id).await {
            Ok(session) => sessions.push(session),
            Err(e) => {
                debug!("Fetch for {} not tracked: {}", id, e);
                failed += 1;
            }
        }
    }

    let wait_all = async move {
        let mut outcomes = Vec::with_capacity(sessions.len());
        for session in sessions {
            let id = session.id();
            outcomes.push((id, session.outcome().await));
        }
        outcomes
    };
    tokio::pin!(wait_all);

    let outcomes = tokio::select! {
        outcomes = &mut wait_all => {
            tracker.teardown();
            outcomes
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", "Interrupted, cancelling fetch tracking...".yellow());
            tracker.teardown();
            wait_all.await
        }
    };

    progress.abort();
    let _ = progress.await;
    let snapshot = tracker.store().current();
    drop(tracker);
    let _ = printer.await;

    println!();
    for (id, outcome) in &outcomes {
        print_outcome(&snapshot, *id, *outcome, budget);
    }

    if failed > 0 {
        bail!("{} fetch(es) could not be started", failed);
    }
    Ok(())
}

/// Queues fetch jobs without following them
async fn queue_fetches(client: &NewsdeskClient, ids: &[SourceId]) -> Result<()> {
    let mut failed = 0usize;
    for &id in ids {
        match client.trigger_fetch(id).await {
            Ok(accepted) => println!(
                "{} Fetch queued for source {} {}",
                "✓".green(),
                id,
                format!("(task {})", accepted.task_id).dimmed()
            ),
            Err(e) => {
                eprintln!("{} Failed to queue fetch for source {}: {}", "✗".red(), id, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} fetch(es) could not be queued", failed);
    }
    Ok(())
}

/// Prints one progress line per store revision for the tracked sources
async fn render_progress(
    mut snapshots: watch::Receiver<Arc<Snapshot>>,
    poller: JobPoller,
    ids: Vec<SourceId>,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let line = progress_line(&snapshot, &ids, |id| poller.state(id), poller.config().max_ticks);
        if !line.is_empty() {
            println!("  {} {}", "↻".cyan(), line.dimmed());
        }
    }
}

/// One line summarising the tracked sources in a snapshot
fn progress_line(
    snapshot: &Snapshot,
    ids: &[SourceId],
    state: impl Fn(SourceId) -> SessionState,
    max_ticks: u32,
) -> String {
    ids.iter()
        .filter_map(|&id| {
            let source = snapshot.get(id)?;
            let status = match state(id) {
                SessionState::Starting => "starting".to_string(),
                SessionState::Polling { ticks_elapsed } => {
                    format!("check {}/{}", ticks_elapsed, max_ticks)
                }
                // Finished sessions are no longer registered.
                _ => "not tracked".to_string(),
            };
            Some(format!(
                "{}: {} fetches, {}",
                source.name, source.fetch_count, status
            ))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn print_notification(notification: &Notification) {
    match notification.severity {
        Severity::Info => println!("  {} {}", "▸".cyan(), notification.message),
        Severity::Success => println!("  {} {}", "✓".green(), notification.message),
        Severity::Error => println!("  {} {}", "✗".red(), notification.message.red()),
    }
}

fn print_outcome(snapshot: &Snapshot, id: SourceId, outcome: SessionOutcome, budget: Duration) {
    let name = snapshot
        .get(id)
        .map(|source| source.name.clone())
        .unwrap_or_else(|| format!("source {}", id));

    match outcome {
        SessionOutcome::Completed { ticks } => println!(
            "{} {} finished {}",
            "✓".green(),
            name.bold(),
            format!("(after {} check(s))", ticks).dimmed()
        ),
        SessionOutcome::TimedOut { .. } => println!(
            "{} {} still running after {}s, check `newsdesk sources get {}` later",
            "…".yellow(),
            name.bold(),
            budget.as_secs(),
            id
        ),
        SessionOutcome::Cancelled => {
            println!("{} {} {}", "-".dimmed(), name.bold(), "no longer tracked".dimmed())
        }
    }
}
