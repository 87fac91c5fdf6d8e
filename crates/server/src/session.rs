use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use server_api::FormSession;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "form_session";

struct SessionEntry {
    session: Arc<Mutex<FormSession>>,
    last_seen: Instant,
}

/// In-memory sessions keyed by the cookie id. Idle sessions are dropped after
/// `ttl`.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the session for `id`, or a fresh one under a new id when `id`
    /// is absent, unknown, or expired.
    pub async fn open(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<FormSession>>) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, entry.session.clone());
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(FormSession::default()));
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        (id, session)
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
