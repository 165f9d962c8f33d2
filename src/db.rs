use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::DatabaseConfig;

/// connect
///
/// Opens the shared Postgres pool. A `max_lifetime_secs` of 0 keeps connections
/// open indefinitely.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let max_lifetime = (config.max_lifetime_secs > 0)
        .then(|| Duration::from_secs(config.max_lifetime_secs));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .max_lifetime(max_lifetime)
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Applies the embedded `migrations/` directory.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
