use anyhow::{Context, Result};
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

/// Opens a single, unpooled PostgreSQL connection.
pub async fn open_connection(database_url: &str) -> Result<PgConnection> {
    PgConnection::connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")
}

/// Closes a connection gracefully. A failed close is logged, not returned.
pub async fn close_connection(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close PostgreSQL connection: {e}");
    }
}

/// Applies the embedded migrations under `migrations/`.
pub async fn run_migrations(database_url: &str) -> Result<()> {
    info!("Applying database migrations...");

    let mut conn = open_connection(database_url).await?;
    let result = sqlx::migrate!("./migrations").run(&mut conn).await;
    close_connection(conn).await;
    result.context("Failed to apply database migrations")?;

    info!("Database migrations applied");
    Ok(())
}
