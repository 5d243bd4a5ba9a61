#[macro_use]
extern crate rocket;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info};

use wellness_hub::database::init_schema;
use wellness_hub::db::ensure_admin;
use wellness_hub::env::{AppConfig, load_environment};
use wellness_hub::telemetry::init_tracing;
use wellness_hub::{init_rocket, spawn_session_cleanup};

#[launch]
async fn rocket() -> _ {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment: {}", e);
    }

    init_tracing();

    let config = AppConfig::from_env();

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Applying database schema...");
    if let Err(e) = init_schema(&pool).await {
        error!("Failed to apply schema: {}", e);
        panic!("Database schema setup failed: {}", e);
    }

    if let Some(email) = &config.admin_email {
        match ensure_admin(&pool, email, config.admin_password.as_deref()).await {
            Ok(id) => info!(user_id = id, "Admin account ready"),
            Err(e) => error!("Failed to bootstrap admin {}: {}", email, e),
        }
    }

    spawn_session_cleanup(pool.clone(), config.session_cleanup_interval);

    init_rocket(pool, config)
}
