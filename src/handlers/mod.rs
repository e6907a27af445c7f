pub mod calendar;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/:scope/:id/calendar",
            get(calendar::get_calendar).put(calendar::submit_calendar),
        )
        .route(
            "/api/:scope/:id/calendar/actions",
            post(calendar::apply_calendar_action),
        )
        .route(
            "/api/:scope/:id/calendar/session",
            post(calendar::open_session).delete(calendar::discard_session),
        )
        .route(
            "/api/:scope/:id/calendar/session/reset",
            post(calendar::reset_session),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
