use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::StateSnapshot;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS state_snapshots (
    id          BIGSERIAL PRIMARY KEY,
    saved_at    TIMESTAMPTZ NOT NULL,
    wallets     INTEGER NOT NULL,
    signals     INTEGER NOT NULL,
    payload     JSONB NOT NULL
)
"#;

/// Create the snapshot table if it does not exist yet.
pub async fn ensure_table(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(CREATE_TABLE).execute(pool).await?;
    Ok(())
}

pub async fn insert_snapshot(pool: &PgPool, snapshot: &StateSnapshot) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO state_snapshots (saved_at, wallets, signals, payload)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(snapshot.saved_at)
    .bind(i32::try_from(snapshot.wallets.len()).unwrap_or(i32::MAX))
    .bind(i32::try_from(snapshot.signals.len()).unwrap_or(i32::MAX))
    .bind(Json(snapshot))
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent snapshot, if any.
pub async fn latest_snapshot(pool: &PgPool) -> anyhow::Result<Option<StateSnapshot>> {
    let row = sqlx::query_scalar::<_, Json<StateSnapshot>>(
        "SELECT payload FROM state_snapshots ORDER BY saved_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|Json(snapshot)| snapshot))
}

/// Keep only the newest `keep` snapshots. Returns the number of rows deleted.
pub async fn prune_snapshots(pool: &PgPool, keep: i64) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM state_snapshots
        WHERE id NOT IN (
            SELECT id FROM state_snapshots ORDER BY saved_at DESC, id DESC LIMIT $1
        )
        "#,
    )
    .bind(keep)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
