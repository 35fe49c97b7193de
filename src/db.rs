use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Positive 63-bit id for users and categories.
pub fn generate_id() -> i64 {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    ((high >> 1) as i64).max(1)
}
