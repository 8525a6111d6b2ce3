use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;
use crate::session::SessionStore;

/// Runtime settings, layered from built-in defaults, an optional `taxi.toml`
/// next to the binary and `TAXI_*` environment variables (in that order).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// How long an idle-or-not session stays valid.
    pub session_ttl_secs: u64,
    /// Upper bound on concurrently stored sessions.
    pub session_capacity: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load configuration
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", "sqlite://taxi.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_ttl_secs", 1_209_600_i64)? // two weeks
            .set_default("session_capacity", 10_000_i64)?
            .add_source(File::with_name("taxi").required(false))
            .add_source(Environment::with_prefix("TAXI"))
            .build()?
            .try_deserialize::<Settings>()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Apply values given on the command line.
    pub fn override_with(&mut self, database_url: Option<String>, bind_address: Option<String>) {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Initialize application configuration and state
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    // Connect to database
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let sessions = SessionStore::new(settings.session_ttl(), settings.session_capacity);

    Ok(AppState { db, sessions })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            database_url: "sqlite://taxi.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            session_ttl_secs: 60,
            session_capacity: 10,
        }
    }

    #[test]
    fn test_command_line_overrides() {
        let mut settings = settings();
        settings.override_with(Some("sqlite::memory:".to_string()), None);
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.bind_address, "0.0.0.0:3000");

        settings.override_with(None, Some("127.0.0.1:8080".to_string()));
        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert_eq!(settings.session_ttl(), Duration::from_secs(60));
    }
}
