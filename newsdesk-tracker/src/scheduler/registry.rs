//! Poller registry
//!
//! Owns the set of live polling sessions, at most one per key. Every
//! registration gets a fresh generation number; a session may only act on a
//! refresh result while its generation is still the registered one, so a
//! refresh that lands after cancellation is discarded.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

use super::session::SessionState;

/// Identity of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

/// What a session receives when it is registered
#[derive(Debug, Clone)]
pub struct Registration {
    pub generation: Generation,
    /// Fired when the session is cancelled or replaced
    pub token: CancellationToken,
}

struct Entry {
    generation: Generation,
    token: CancellationToken,
    state: SessionState,
}

struct RegistryState<K> {
    next_generation: u64,
    sessions: HashMap<K, Entry>,
}

/// Registry of live sessions keyed by resource
pub struct PollerRegistry<K> {
    inner: Mutex<RegistryState<K>>,
}

impl<K: Eq + Hash + Clone> PollerRegistry<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryState {
                next_generation: 1,
                sessions: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<K>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new session for `key` in the `Starting` state
    ///
    /// A live session for the same key is cancelled first; it gets no
    /// notification of any kind.
    pub fn register(&self, key: K) -> Registration {
        let mut inner = self.lock();
        let generation = Generation(inner.next_generation);
        inner.next_generation += 1;

        let token = CancellationToken::new();
        let previous = inner.sessions.insert(
            key,
            Entry {
                generation,
                token: token.clone(),
                state: SessionState::Starting,
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        Registration { generation, token }
    }

    /// Whether `generation` is still the live session for `key`
    pub fn is_current(&self, key: &K, generation: Generation) -> bool {
        self.lock()
            .sessions
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
    }

    /// Records the state of a live session
    ///
    /// Returns false, and changes nothing, if the session is no longer current.
    pub fn update(&self, key: &K, generation: Generation, state: SessionState) -> bool {
        match self.lock().sessions.get_mut(key) {
            Some(entry) if entry.generation == generation => {
                entry.state = state;
                true
            }
            _ => false,
        }
    }

    /// Removes a session that ended on its own
    ///
    /// Returns false if the session had already been cancelled or replaced;
    /// the caller must then treat itself as cancelled.
    pub fn unregister(&self, key: &K, generation: Generation) -> bool {
        let mut inner = self.lock();
        match inner.sessions.get(key) {
            Some(entry) if entry.generation == generation => {
                inner.sessions.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Cancels the live session for `key`, if any
    pub fn cancel(&self, key: &K) -> bool {
        let removed = self.lock().sessions.remove(key);
        match removed {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every live session
    ///
    /// # Returns
    /// The number of sessions that were cancelled
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = self.lock().sessions.drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        drained.len()
    }

    /// State of the tracking for `key`; `Idle` when nothing is live
    pub fn state(&self, key: &K) -> SessionState {
        self.lock()
            .sessions
            .get(key)
            .map(|entry| entry.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().sessions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone> Default for PollerRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
