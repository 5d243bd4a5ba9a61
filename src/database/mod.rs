pub mod schema;

pub use schema::*;

use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;

/// Applies the declarative schema. Every statement is idempotent.
#[instrument(skip(pool))]
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::raw_sql(CURRENT_SCHEMA).execute(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
