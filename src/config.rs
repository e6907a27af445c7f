use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub api_token: String,
    // Offer backend receiving calendars. Empty keeps them in the local database.
    pub backend_url: String,
    pub backend_token: String,
    pub session_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "offer-calendar.db".to_string()),
            api_token: env::var("API_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            backend_url: env::var("BACKEND_URL").unwrap_or_default(),
            backend_token: env::var("BACKEND_TOKEN").unwrap_or_default(),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1800),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn uses_remote_backend(&self) -> bool {
        !self.backend_url.is_empty()
    }
}
