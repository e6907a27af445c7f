use anyhow::Context;
use async_trait::async_trait;

use super::CalendarSink;
use crate::models::{CalendarPayload, OfferScope};

// PUT {base_url}/{events|places}/{id}/calendar
pub struct HttpCalendarSink {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpCalendarSink {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn calendar_url(&self, scope: OfferScope, offer_id: &str) -> String {
        format!("{}/{}/{}/calendar", self.base_url, scope.as_str(), offer_id)
    }
}

#[async_trait]
impl CalendarSink for HttpCalendarSink {
    async fn save_calendar(
        &self,
        scope: OfferScope,
        offer_id: &str,
        payload: &CalendarPayload,
    ) -> anyhow::Result<()> {
        let url = self.calendar_url(scope, offer_id);

        let mut request = self.client.put(&url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .context("failed to send calendar to backend")?
            .error_for_status()
            .context("backend rejected calendar")?;

        tracing::info!(url = %url, calendar_type = payload.calendar_type.as_str(), "calendar sent to backend");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::put;
    use axum::{Json, Router};

    use super::*;
    use crate::models::CalendarType;

    type Seen = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    // Local stand-in for the offer backend: records each PUT and answers
    // with `status`.
    async fn spawn_backend(status: StatusCode) -> (SocketAddr, Seen) {
        let seen: Seen = Arc::new(Mutex::new(vec![]));
        let recorder = Arc::clone(&seen);
        let app = Router::new().route(
            "/:scope/:id/calendar",
            put(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                recorder.lock().unwrap().push((auth, body));
                status
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, seen)
    }

    fn local_sink(addr: SocketAddr, token: Option<&str>) -> HttpCalendarSink {
        HttpCalendarSink {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            ..HttpCalendarSink::new(format!("http://{addr}"), token.map(String::from))
        }
    }

    fn permanent_payload() -> CalendarPayload {
        CalendarPayload {
            calendar_type: CalendarType::Permanent,
            sub_event: None,
            opening_hours: Some(vec![]),
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_sends_bearer_token_and_payload() {
        let (addr, seen) = spawn_backend(StatusCode::NO_CONTENT).await;
        let sink = local_sink(addr, Some("secret"));

        sink.save_calendar(OfferScope::Place, "p1", &permanent_payload())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret"));
        assert_eq!(seen[0].1["calendarType"], "permanent");
    }

    #[tokio::test]
    async fn test_error_status_fails_the_save() {
        let (addr, seen) = spawn_backend(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = local_sink(addr, Some("secret"));

        let result = sink
            .save_calendar(OfferScope::Event, "e1", &permanent_payload())
            .await;

        assert!(result.is_err());
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization() {
        let (addr, seen) = spawn_backend(StatusCode::OK).await;
        let sink = local_sink(addr, None);

        sink.save_calendar(OfferScope::Event, "e1", &permanent_payload())
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap()[0].0, None);
    }

    #[test]
    fn test_calendar_url() {
        let sink = HttpCalendarSink::new("https://io.example.org/".to_string(), None);
        assert_eq!(
            sink.calendar_url(OfferScope::Event, "abc"),
            "https://io.example.org/events/abc/calendar"
        );
        assert_eq!(
            sink.calendar_url(OfferScope::Place, "xyz"),
            "https://io.example.org/places/xyz/calendar"
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let sink = HttpCalendarSink::new("http://localhost".to_string(), Some(String::new()));
        assert!(sink.token.is_none());
    }
}
