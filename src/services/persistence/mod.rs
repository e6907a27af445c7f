pub mod http;
pub mod sqlite;

use async_trait::async_trait;

use crate::models::{CalendarPayload, OfferScope};

#[async_trait]
pub trait CalendarSink: Send + Sync {
    async fn save_calendar(
        &self,
        scope: OfferScope,
        offer_id: &str,
        payload: &CalendarPayload,
    ) -> anyhow::Result<()>;
}
