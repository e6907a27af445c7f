use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use offer_calendar::config::AppConfig;
use offer_calendar::db;
use offer_calendar::handlers;
use offer_calendar::services::persistence::http::HttpCalendarSink;
use offer_calendar::services::persistence::sqlite::SqliteCalendarSink;
use offer_calendar::services::persistence::CalendarSink;
use offer_calendar::state::{AppState, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(
        !config.api_token.is_empty(),
        "API_TOKEN must not be empty"
    );

    let db = Arc::new(Mutex::new(db::init_db(&config.database_url)?));

    let sink: Box<dyn CalendarSink> = if config.uses_remote_backend() {
        tracing::info!("sending calendars to backend (url: {})", config.backend_url);
        Box::new(HttpCalendarSink::new(
            config.backend_url.clone(),
            Some(config.backend_token.clone()),
        ))
    } else {
        tracing::info!("storing calendars locally (database: {})", config.database_url);
        Box::new(SqliteCalendarSink::new(Arc::clone(&db)))
    };

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        sink,
        sessions: Mutex::new(SessionStore::new(config.session_ttl())),
    });

    let app = handlers::router(state).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
