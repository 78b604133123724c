// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDate};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-user conversation state. The conversation id is opaque: stored and
/// replayed, never parsed.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub conversation_id: Option<String>,
    pub last_interaction_date: Option<NaiveDate>,
    pub last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation_id: None,
            last_interaction_date: None,
            last_active: Instant::now(),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    // Create a fresh session and return its id.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone());

        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), session);
        id
    }

    // Ensure there's a session with this id.
    pub async fn ensure_session(&self, id: &str) -> String {
        {
            let guard = self.inner.read().await;
            if guard.contains_key(id) {
                return id.to_string();
            }
        }
        let mut guard = self.inner.write().await;
        guard
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id.to_string()));
        id.to_string()
    }

    /// Conversation id to replay on the next relay call, if any.
    pub async fn conversation_id(&self, session_id: &str) -> Option<String> {
        let guard = self.inner.read().await;
        guard.get(session_id).and_then(|s| s.conversation_id.clone())
    }

    /// Stores the conversation id a relay call returned. A response without
    /// one keeps the previous id so the dialogue continues.
    pub async fn record_conversation_id(&self, session_id: &str, conversation_id: Option<String>) {
        let Some(conversation_id) = conversation_id else {
            return;
        };
        let mut guard = self.inner.write().await;
        let entry = guard
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id.to_string()));
        entry.conversation_id = Some(conversation_id);
        entry.last_active = Instant::now();
    }

    /// True for the first interaction of the calendar day; also stamps today
    /// as the last interaction date.
    pub async fn first_interaction_today(&self, session_id: &str) -> bool {
        let today = Local::now().date_naive();
        let mut guard = self.inner.write().await;
        let entry = guard
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id.to_string()));
        let first = entry.last_interaction_date != Some(today);
        entry.last_interaction_date = Some(today);
        entry.last_active = Instant::now();
        first
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
