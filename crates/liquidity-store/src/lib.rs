//! The event journal (§6 "Persistence layout", §8 "Replay equivalence").
//!
//! A zone's durable state is nothing but its event stream: a
//! `ZoneEventEnvelope` persisted for every accepted command, keyed by
//! `persistence_id = "zone-" + zone_id`, ordered by a sequence number the
//! store itself assigns. [`EventJournal`] is the interface the Zone
//! Validator depends on; [`SqlJournal`] is the production Postgres-backed
//! implementation, [`InMemoryJournal`] is for tests and the demo binary.
//! Snapshots are intentionally absent - correctness must not depend on them
//! (§6), so there is nothing here to load or compact.

pub mod config;
pub mod error;

use async_trait::async_trait;
use liquidity_types::ZoneEventEnvelope;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};

/// One journal record as returned by a replay: the envelope plus the
/// sequence number the store assigned it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PersistedEnvelope {
    pub sequence_nr: i64,
    pub envelope: ZoneEventEnvelope,
}

/// Append-only, per-`persistence_id`-ordered event storage.
///
/// Implementors must guarantee: events appended for the same
/// `persistence_id` are assigned strictly increasing sequence numbers with
/// no gaps, and [`replay`](EventJournal::replay) returns them in that order.
/// The validator is the journal's only writer for a given `persistence_id`
/// at any moment (§5 "Shared resources") - the trait does not need to
/// arbitrate between concurrent writers of the same zone.
#[async_trait]
pub trait EventJournal: Send + Sync {
    async fn append(
        &self,
        persistence_id: &str,
        envelope: ZoneEventEnvelope,
    ) -> StoreResult<PersistedEnvelope>;

    async fn replay(&self, persistence_id: &str) -> StoreResult<Vec<PersistedEnvelope>>;

    async fn highest_sequence_nr(&self, persistence_id: &str) -> StoreResult<i64>;
}

/// Postgres-backed journal. One table, `zone_events`, keyed by
/// `(persistence_id, sequence_nr)`.
pub struct SqlJournal {
    pool: PgPool,
}

impl SqlJournal {
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        info!(url = %config.postgres_url_masked(), "connecting to event journal");
        let pool = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        info!("connected to event journal");
        Ok(Self { pool })
    }

    /// Create the `zone_events` table if it doesn't already exist. Stands in
    /// for a migration runner (`sqlx::migrate!`) since this journal is a
    /// single, stable table rather than an evolving schema.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS zone_events (
                persistence_id TEXT NOT NULL,
                sequence_nr BIGINT NOT NULL,
                payload JSONB NOT NULL,
                PRIMARY KEY (persistence_id, sequence_nr)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl EventJournal for SqlJournal {
    async fn append(
        &self,
        persistence_id: &str,
        envelope: ZoneEventEnvelope,
    ) -> StoreResult<PersistedEnvelope> {
        let payload = serde_json::to_value(&envelope)?;
        let mut tx = self.pool.begin().await?;
        let next_seq: i64 = sqlx::query(
            "SELECT COALESCE(MAX(sequence_nr), -1) + 1 AS next_seq \
             FROM zone_events WHERE persistence_id = $1 FOR UPDATE",
        )
        .bind(persistence_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("next_seq")?;

        sqlx::query(
            "INSERT INTO zone_events (persistence_id, sequence_nr, payload) VALUES ($1, $2, $3)",
        )
        .bind(persistence_id)
        .bind(next_seq)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(PersistedEnvelope {
            sequence_nr: next_seq,
            envelope,
        })
    }

    async fn replay(&self, persistence_id: &str) -> StoreResult<Vec<PersistedEnvelope>> {
        let rows = sqlx::query(
            "SELECT sequence_nr, payload FROM zone_events \
             WHERE persistence_id = $1 ORDER BY sequence_nr ASC",
        )
        .bind(persistence_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let sequence_nr: i64 = row.try_get("sequence_nr")?;
                let payload: serde_json::Value = row.try_get("payload")?;
                let envelope = serde_json::from_value(payload)?;
                Ok(PersistedEnvelope {
                    sequence_nr,
                    envelope,
                })
            })
            .collect()
    }

    async fn highest_sequence_nr(&self, persistence_id: &str) -> StoreResult<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(sequence_nr), -1) AS highest \
             FROM zone_events WHERE persistence_id = $1",
        )
        .bind(persistence_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("highest")?)
    }
}

/// In-process journal backing tests and the demo binary: no network, no
/// schema, same ordering contract as [`SqlJournal`].
#[derive(Clone, Default)]
pub struct InMemoryJournal {
    streams: Arc<RwLock<HashMap<String, Vec<ZoneEventEnvelope>>>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventJournal for InMemoryJournal {
    async fn append(
        &self,
        persistence_id: &str,
        envelope: ZoneEventEnvelope,
    ) -> StoreResult<PersistedEnvelope> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(persistence_id.to_string()).or_default();
        let sequence_nr = stream.len() as i64;
        stream.push(envelope.clone());
        Ok(PersistedEnvelope {
            sequence_nr,
            envelope,
        })
    }

    async fn replay(&self, persistence_id: &str) -> StoreResult<Vec<PersistedEnvelope>> {
        let streams = self.streams.read().await;
        Ok(match streams.get(persistence_id) {
            Some(stream) => stream
                .iter()
                .enumerate()
                .map(|(i, envelope)| PersistedEnvelope {
                    sequence_nr: i as i64,
                    envelope: envelope.clone(),
                })
                .collect(),
            None => Vec::new(),
        })
    }

    async fn highest_sequence_nr(&self, persistence_id: &str) -> StoreResult<i64> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(persistence_id)
            .map(|s| s.len() as i64 - 1)
            .unwrap_or(-1))
    }
}
