//! Postgres-backed incident store (sqlx).
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE incident_groups (
//!   id          BIGSERIAL PRIMARY KEY,
//!   fingerprint TEXT NOT NULL,
//!   service     TEXT NOT NULL,
//!   first_seen  TIMESTAMPTZ NOT NULL,
//!   last_seen   TIMESTAMPTZ NOT NULL,
//!   total_count BIGINT NOT NULL,
//!   UNIQUE (fingerprint, service)
//! );
//!
//! CREATE TABLE group_events (
//!   id       BIGSERIAL PRIMARY KEY,
//!   group_id BIGINT NOT NULL REFERENCES incident_groups(id),
//!   ts       TIMESTAMPTZ NOT NULL,
//!   level    TEXT,
//!   message  TEXT NOT NULL,
//!   service  TEXT,
//!   module   TEXT,
//!   line     BIGINT,
//!   stack    TEXT,
//!   meta     JSONB
//! );
//!
//! CREATE TABLE group_analyses (
//!   id             BIGSERIAL PRIMARY KEY,
//!   group_id       BIGINT NOT NULL REFERENCES incident_groups(id),
//!   created_at     TIMESTAMPTZ NOT NULL,
//!   level          TEXT,
//!   priority       TEXT,
//!   title          TEXT,
//!   probable_cause TEXT,
//!   confidence     DOUBLE PRECISION,
//!   files_to_check TEXT[] NOT NULL,
//!   checks         TEXT[] NOT NULL,
//!   commands       TEXT[] NOT NULL,
//!   fixes          TEXT[] NOT NULL,
//!   raw_summary    TEXT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::StoreError;
use crate::store::{AnalysisRecord, EventRecord, GroupKey, IncidentStore};

/// Incident store on a shared connection pool.
///
/// The composite unique index on (fingerprint, service) plus the
/// `ON CONFLICT` upsert keep concurrent records for the same key from ever
/// duplicating a group or losing an increment; no application-side locking.
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

fn db_err(e: sqlx::Error) -> StoreError {
  StoreError::backend(e.to_string())
}

#[async_trait]
impl IncidentStore for PgStore {
  async fn record(
    &self,
    key: &GroupKey,
    event: EventRecord,
    analysis: AnalysisRecord,
  ) -> Result<i64, StoreError> {
    let mut tx = self.pool.begin().await.map_err(db_err)?;

    let row = sqlx::query(
      r#"
      INSERT INTO incident_groups (fingerprint, service, first_seen, last_seen, total_count)
      VALUES ($1, $2, NOW(), NOW(), 1)
      ON CONFLICT (fingerprint, service) DO UPDATE SET
        last_seen = NOW(),
        total_count = incident_groups.total_count + 1
      RETURNING id
      "#,
    )
    .bind(&key.fingerprint)
    .bind(&key.service)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err)?;
    let group_id: i64 = row.get("id");

    let meta = serde_json::Value::Object(event.meta.into_iter().collect());
    sqlx::query(
      r#"
      INSERT INTO group_events (group_id, ts, level, message, service, module, line, stack, meta)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
      "#,
    )
    .bind(group_id)
    .bind(event.ts)
    .bind(event.level.map(|l| l.as_str()))
    .bind(&event.message)
    .bind(&event.service)
    .bind(&event.module)
    .bind(event.line.map(i64::from))
    .bind(&event.stack)
    .bind(meta)
    .execute(&mut *tx)
    .await
    .map_err(db_err)?;

    sqlx::query(
      r#"
      INSERT INTO group_analyses
        (group_id, created_at, level, priority, title, probable_cause, confidence,
         files_to_check, checks, commands, fixes, raw_summary)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
      "#,
    )
    .bind(group_id)
    .bind(analysis.created_at)
    .bind(&analysis.level)
    .bind(analysis.priority.map(|p| p.as_str()))
    .bind(&analysis.title)
    .bind(&analysis.probable_cause)
    .bind(analysis.confidence)
    .bind(&analysis.files_to_check)
    .bind(&analysis.checks)
    .bind(&analysis.commands)
    .bind(&analysis.fixes)
    .bind(&analysis.raw_summary)
    .execute(&mut *tx)
    .await
    .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;
    Ok(group_id)
  }
}
