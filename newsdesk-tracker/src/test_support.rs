//! In-memory collaborators for tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use newsdesk_core::domain::source::{DataSource, SourceId, SourceType, parse_timestamp};
use newsdesk_core::dto::source::FetchAccepted;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::repository::SourceRepository;
use crate::service::{Notification, Notifier, Severity};

/// An active data source with the given progress counters
pub fn source(id: i64, fetch_count: u64, last_fetch: Option<&str>) -> DataSource {
    DataSource {
        id: SourceId(id),
        name: format!("source-{}", id),
        source_type: SourceType::Rss,
        url: format!("https://news.example/{}.rss", id),
        description: None,
        is_active: true,
        fetch_interval: 3600,
        last_fetch: last_fetch.and_then(parse_timestamp),
        last_success: None,
        fetch_count,
        success_count: fetch_count,
        error_count: 0,
        config: None,
    }
}

pub fn inactive_source(id: i64, fetch_count: u64) -> DataSource {
    DataSource {
        is_active: false,
        ..source(id, fetch_count, None)
    }
}

enum ListReply {
    Sources(Vec<DataSource>),
    Failure,
}

/// Backend stand-in
///
/// `list_sources` answers from a queue of scripted replies and falls back to
/// the current backend state once the queue is empty. Lists can be held open
/// to simulate a refresh that is still in flight.
pub struct ScriptedRepository {
    backend: Mutex<Vec<DataSource>>,
    list_script: Mutex<VecDeque<ListReply>>,
    list_gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_fails: AtomicBool,
    activation_fails: AtomicBool,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    activate_calls: AtomicUsize,
}

impl ScriptedRepository {
    pub fn new(backend: Vec<DataSource>) -> Self {
        Self {
            backend: Mutex::new(backend),
            list_script: Mutex::new(VecDeque::new()),
            list_gate: Mutex::new(None),
            fetch_gate: Mutex::new(None),
            fetch_fails: AtomicBool::new(false),
            activation_fails: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            activate_calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the backend state that unscripted lists return
    pub fn set_backend(&self, sources: Vec<DataSource>) {
        *self.backend.lock().unwrap() = sources;
    }

    pub fn push_list(&self, sources: Vec<DataSource>) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(ListReply::Sources(sources));
    }

    pub fn push_list_failure(&self) {
        self.list_script.lock().unwrap().push_back(ListReply::Failure);
    }

    /// Makes every subsequent list wait until `release_lists` is called
    pub fn hold_lists(&self) {
        *self.list_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_lists(&self) {
        if let Some(gate) = self.list_gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Makes the next `trigger_fetch` wait for a permit on the returned gate
    pub fn hold_next_fetch(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.fetch_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn fail_fetches(&self) {
        self.fetch_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_activation(&self) {
        self.activation_fails.store(true, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn activate_calls(&self) -> usize {
        self.activate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceRepository for ScriptedRepository {
    async fn list_sources(&self) -> Result<Vec<DataSource>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await?;
        }

        let scripted = self.list_script.lock().unwrap().pop_front();
        match scripted {
            Some(ListReply::Sources(sources)) => Ok(sources),
            Some(ListReply::Failure) => Err(anyhow!("connection reset")),
            None => Ok(self.backend.lock().unwrap().clone()),
        }
    }

    async fn activate(&self, id: SourceId) -> Result<DataSource> {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        if self.activation_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("API error (status 500): database locked"));
        }

        let mut backend = self.backend.lock().unwrap();
        let stored = backend
            .iter_mut()
            .find(|source| source.id == id)
            .ok_or_else(|| anyhow!("Resource not found: {}", id))?;
        stored.is_active = true;
        Ok(stored.clone())
    }

    async fn trigger_fetch(&self, id: SourceId) -> Result<FetchAccepted> {
        let n = self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await?;
        }

        if self.fetch_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("API error (status 400): data source is not active"));
        }

        Ok(FetchAccepted {
            message: "fetch task started".to_string(),
            task_id: format!("task-{}", n),
            source_id: id,
        })
    }
}

/// Notifier that keeps everything it is given
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn severities(&self) -> Vec<Severity> {
        self.all().iter().map(|n| n.severity).collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.all()
            .iter()
            .filter(|n| n.message.contains(needle))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Sleeps on virtual time until `condition` holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}
