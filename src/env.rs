use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

const DEFAULT_DATABASE_URL: &str = "sqlite://wellness.db?mode=rwc";

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

/// Settings that live outside Rocket's own figment (address, port, secret key).
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub session_ttl: chrono::Duration,
    pub session_cleanup_interval: Duration,
    /// Account promoted (or created) as admin at startup.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("session_ttl", &self.session_ttl)
            .field("session_cleanup_interval", &self.session_cleanup_interval)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: 5,
            session_ttl: chrono::Duration::hours(24),
            session_cleanup_interval: Duration::from_secs(3600),
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = non_blank_var("DATABASE_URL").unwrap_or(defaults.database_url);

        let db_max_connections =
            parse_var("DB_MAX_CONNECTIONS").unwrap_or(defaults.db_max_connections);

        let session_ttl = parse_var::<i64>("SESSION_TTL_HOURS")
            .filter(|hours| *hours > 0)
            .map(chrono::Duration::hours)
            .unwrap_or(defaults.session_ttl);

        let session_cleanup_interval = parse_var::<u64>("SESSION_CLEANUP_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_cleanup_interval);

        let admin_email = non_blank_var("ADMIN_EMAIL").map(|email| email.to_lowercase());
        let admin_password = std::env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());

        Self {
            database_url,
            db_max_connections,
            session_ttl,
            session_cleanup_interval,
            admin_email,
            admin_password,
        }
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = %name, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}
