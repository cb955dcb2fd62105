use sqlx::PgPool;
use tracing::info;

/// Applies `./migrations`, embedded at compile time.
pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(db).await?;
    info!("database migrations applied");
    Ok(())
}
