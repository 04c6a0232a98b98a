//! Resource snapshot store
//!
//! Holds the last-known state of every data source. Writes always replace
//! the whole snapshot, so a late refresh can never leave a half-merged view.
//! Every write is published to subscribers, which is how a view re-renders
//! after each poll tick.

use anyhow::Result;
use newsdesk_core::domain::source::{DataSource, SourceId};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::repository::SourceRepository;

/// One full read of the backend's data sources
#[derive(Debug, Default)]
pub struct Snapshot {
    revision: u64,
    sources: Vec<DataSource>,
}

impl Snapshot {
    /// Number of writes the store had seen when this snapshot was taken
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Data sources in backend order
    pub fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    /// Looks up a data source by ID
    pub fn get(&self, id: SourceId) -> Option<&DataSource> {
        self.sources.iter().find(|source| source.id == id)
    }
}

/// Shared store of the latest snapshot
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// Creates an empty store
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the whole snapshot and notifies subscribers
    pub fn replace_all(&self, sources: Vec<DataSource>) {
        self.tx.send_modify(|current| {
            *current = Arc::new(Snapshot {
                revision: current.revision + 1,
                sources,
            });
        });
    }

    /// The latest snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    /// Last-known state of one data source
    pub fn get(&self, id: SourceId) -> Option<DataSource> {
        self.tx.borrow().get(id).cloned()
    }

    /// Receiver that wakes up on every write
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    /// Re-reads every data source from the backend and stores the result
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh(&self, repository: &dyn SourceRepository) -> Result<Arc<Snapshot>> {
        let sources = repository.list_sources().await?;
        debug!("Refreshed snapshot with {} data source(s)", sources.len());
        self.replace_all(sources);
        Ok(self.current())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
