use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use super::CalendarSink;
use crate::db::queries;
use crate::models::{CalendarPayload, OfferScope};

pub struct SqliteCalendarSink {
    db: Arc<Mutex<Connection>>,
}

impl SqliteCalendarSink {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CalendarSink for SqliteCalendarSink {
    async fn save_calendar(
        &self,
        scope: OfferScope,
        offer_id: &str,
        payload: &CalendarPayload,
    ) -> anyhow::Result<()> {
        let db = self.db.lock().unwrap();
        queries::save_offer_calendar(&db, scope, offer_id, payload)
    }
}
