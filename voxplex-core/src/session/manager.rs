//! In-memory session manager keyed by session id

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared handle to one session's state.
///
/// The async mutex is held for a whole interaction, which serializes the
/// requests of a single visitor.
pub type SharedSession<S> = Arc<tokio::sync::Mutex<S>>;

struct Entry<S> {
    state: SharedSession<S>,
    last_seen: Instant,
}

/// Manages per-visitor sessions.
///
/// Nothing is persisted: a session lives until it is removed or evicted
/// for being idle, and an unknown id always yields fresh default state.
pub struct SessionManager<S> {
    entries: Mutex<HashMap<String, Entry<S>>>,
    max_sessions: usize,
}

/// Session cap used by [`SessionManager::new`]
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

impl<S: Default> SessionManager<S> {
    /// Create an empty session manager
    pub fn new() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }

    /// Create an empty session manager holding at most `max_sessions`.
    ///
    /// When full, creating a session drops the least recently seen one.
    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Generate a new random session id
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Get or create a session, refreshing its last-seen time.
    ///
    /// Returns the session and whether it was newly created.
    pub fn get_or_create(&self, id: &str) -> (SharedSession<S>, bool) {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if let Some(entry) = entries.get_mut(id) {
            entry.last_seen = now;
            return (entry.state.clone(), false);
        }

        if entries.len() >= self.max_sessions {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!("Session limit reached, dropped session {}", oldest);
            }
        }

        let state: SharedSession<S> = Arc::new(tokio::sync::Mutex::new(S::default()));
        entries.insert(
            id.to_string(),
            Entry {
                state: state.clone(),
                last_seen: now,
            },
        );
        debug!("Created session {}", id);
        (state, true)
    }

    /// Get a session if it exists; a lookup counts as activity
    pub fn get(&self, id: &str) -> Option<SharedSession<S>> {
        self.entries.lock().get_mut(id).map(|entry| {
            entry.last_seen = Instant::now();
            entry.state.clone()
        })
    }

    /// Remove a session, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    /// Drop sessions that have not been seen for longer than `ttl`
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.last_seen.elapsed() <= ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<S: Default> Default for SessionManager<S> {
    fn default() -> Self {
        Self::new()
    }
}
