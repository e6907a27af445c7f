use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::OfferScope;
use crate::services::handlers::CalendarSession;
use crate::services::persistence::CalendarSink;

pub type SessionKey = (OfferScope, String);

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub sink: Box<dyn CalendarSink>,
    pub sessions: Mutex<SessionStore>,
}

struct SessionEntry {
    session: CalendarSession,
    touched: Instant,
}

// ── Session Store ──

// Open edit sessions, one per offering. A session nobody has touched for
// `ttl` is gone, whether or not it was swept yet.
pub struct SessionStore {
    ttl: Duration,
    entries: HashMap<SessionKey, SessionEntry>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: SessionKey, session: CalendarSession) {
        self.sweep();
        self.entries.insert(
            key,
            SessionEntry {
                session,
                touched: Instant::now(),
            },
        );
    }

    pub fn get_mut(&mut self, key: &SessionKey) -> Option<&mut CalendarSession> {
        if self.is_expired(key) {
            self.entries.remove(key);
            tracing::info!(offer_id = %key.1, scope = key.0.as_str(), "calendar session expired");
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.touched = Instant::now();
        Some(&mut entry.session)
    }

    pub fn remove(&mut self, key: &SessionKey) -> Option<CalendarSession> {
        let expired = self.is_expired(key);
        let entry = self.entries.remove(key)?;
        (!expired).then_some(entry.session)
    }

    pub fn open_count(&self) -> usize {
        self.entries.len()
    }

    fn is_expired(&self, key: &SessionKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.touched.elapsed() >= self.ttl)
    }

    fn sweep(&mut self) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.touched.elapsed() < ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle calendar sessions");
        }
    }
}
