use sqlx::{PgPool, Row};
use tracing::debug;

use crate::store::MemoryStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_store(pool: &PgPool) -> anyhow::Result<MemoryStore> {
    let rows = sqlx::query("SELECT key, value FROM outcome_tracker.kv_entries")
        .fetch_all(pool)
        .await?;

    debug!(entries = rows.len(), "loaded key-value snapshot");

    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>("key"), row.get::<String, _>("value")))
        .collect())
}

pub async fn flush_store(pool: &PgPool, store: &MemoryStore) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut written = 0usize;

    for (key, value) in store.entries() {
        sqlx::query(
            r#"
            INSERT INTO outcome_tracker.kv_entries (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}
