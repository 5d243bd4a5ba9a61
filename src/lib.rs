#[macro_use]
extern crate rocket;

pub mod api;
pub mod auth;
pub mod client;
pub mod database;
pub mod db;
pub mod envelope;
pub mod env;
pub mod error;
pub mod models;
pub mod tags;
pub mod telemetry;
pub mod validation;
#[cfg(test)]
mod test;

use std::time::Duration;

use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::auth::{bad_request_api, default_api, forbidden_api, not_found_api, unauthorized_api, unprocessable_api};
use crate::db::clean_expired_sessions;
use crate::env::AppConfig;
use crate::telemetry::TelemetryFairing;

/// Spawns the periodic purge of expired sessions.
pub fn spawn_session_cleanup(pool: SqlitePool, interval: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(interval).await;
        }
    });
}

pub fn init_rocket(pool: SqlitePool, config: AppConfig) -> Rocket<Build> {
    info!("Starting wellness hub");

    rocket::build()
        .manage(pool)
        .manage(config)
        .mount("/api", api::routes())
        .register(
            "/api",
            catchers![
                bad_request_api,
                unauthorized_api,
                forbidden_api,
                not_found_api,
                unprocessable_api,
                default_api
            ],
        )
        .attach(TelemetryFairing)
}
