use std::path::PathBuf;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::gauge;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::db::snapshot_repo;
use crate::intelligence::{SignalGenerator, WalletLedger};
use crate::models::StateSnapshot;

/// Database snapshots kept after each save.
const PG_SNAPSHOTS_RETAINED: i64 = 48;

/// Snapshot as a JSON document on disk. Writes go to a sibling temp file
/// that is renamed over the target, so a crash never leaves a torn file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn save(&self, snapshot: &StateSnapshot) -> anyhow::Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn load(&self) -> anyhow::Result<Option<StateSnapshot>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// One JSONB row per snapshot; the newest row is loaded at start-up.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub async fn new(pool: PgPool) -> anyhow::Result<Self> {
        snapshot_repo::ensure_table(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn save(&self, snapshot: &StateSnapshot) -> anyhow::Result<()> {
        snapshot_repo::insert_snapshot(&self.pool, snapshot).await?;
        let pruned = snapshot_repo::prune_snapshots(&self.pool, PG_SNAPSHOTS_RETAINED).await?;
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned old snapshots");
        }
        Ok(())
    }

    pub async fn load(&self) -> anyhow::Result<Option<StateSnapshot>> {
        snapshot_repo::latest_snapshot(&self.pool).await
    }
}

#[derive(Debug, Clone)]
pub enum SnapshotStore {
    File(JsonFileStore),
    Postgres(PgSnapshotStore),
}

impl SnapshotStore {
    pub async fn save(&self, snapshot: &StateSnapshot) -> anyhow::Result<()> {
        match self {
            SnapshotStore::File(store) => store.save(snapshot).await,
            SnapshotStore::Postgres(store) => store.save(snapshot).await,
        }
    }

    pub async fn load(&self) -> anyhow::Result<Option<StateSnapshot>> {
        match self {
            SnapshotStore::File(store) => store.load().await,
            SnapshotStore::Postgres(store) => store.load().await,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotStore::File(_) => "file",
            SnapshotStore::Postgres(_) => "postgres",
        }
    }
}

pub async fn build_snapshot(
    ledger: &WalletLedger,
    signals: &SignalGenerator,
    now: DateTime<Utc>,
) -> StateSnapshot {
    StateSnapshot {
        saved_at: now,
        wallets: ledger.stats_snapshot().await,
        whale_history: ledger.history_snapshot().await,
        signals: signals.snapshot().await,
    }
}

pub async fn restore_snapshot(snapshot: StateSnapshot, ledger: &WalletLedger, signals: &SignalGenerator) {
    tracing::info!(
        saved_at = %snapshot.saved_at,
        wallets = snapshot.wallets.len(),
        history = snapshot.whale_history.len(),
        signals = snapshot.signals.len(),
        "Restoring state snapshot"
    );
    ledger.restore(snapshot.wallets, snapshot.whale_history).await;
    signals.restore(snapshot.signals).await;
}

/// Evict dormant wallets, then persist the analytics state, every
/// `interval_secs`. Store failures are logged and retried next tick.
pub async fn run_snapshot_job(
    store: SnapshotStore,
    ledger: WalletLedger,
    signals: SignalGenerator,
    interval_secs: u64,
    wallet_ttl: ChronoDuration,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.tick().await;
    tracing::info!(store = store.kind(), interval_secs, "Snapshot job started");

    loop {
        ticker.tick().await;
        let now = Utc::now();

        let evicted = ledger.evict_dormant(now, wallet_ttl).await;
        if evicted > 0 {
            tracing::info!(evicted, "Evicted dormant wallets");
            let tracked = ledger.len().await;
            gauge!("tracked_wallets").set(tracked as f64);
        }

        let snapshot = build_snapshot(&ledger, &signals, now).await;
        match store.save(&snapshot).await {
            Ok(()) => tracing::debug!(
                wallets = snapshot.wallets.len(),
                signals = snapshot.signals.len(),
                "State snapshot saved"
            ),
            Err(e) => tracing::error!(error = %e, store = store.kind(), "Failed to save state snapshot"),
        }
    }
}
