use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Sized so a full fleet ranking can hold one connection per in-flight
/// router fetch while the status endpoints keep a couple spare.
pub fn connect_lazy(database_url: &str, fleet_concurrency: usize) -> Result<PgPool> {
    let max_connections = u32::try_from(fleet_concurrency.saturating_add(2)).unwrap_or(u32::MAX);
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .context("Failed to create lazy database pool for the status log")
}
