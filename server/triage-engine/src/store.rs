//! Incident-group storage: the durable aggregate behind persistence sinks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::narrative;
use crate::types::{Level, Priority, Report};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Composite key identifying one incident group. Events with no service fall
/// into a shared empty-service bucket per fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
  pub fingerprint: String,
  pub service: String,
}

/// The durable aggregate: exactly one per (fingerprint, service).
#[derive(Debug, Clone, Serialize)]
pub struct IncidentGroup {
  pub id: i64,
  pub fingerprint: String,
  pub service: String,
  pub first_seen: DateTime<Utc>,
  pub last_seen: DateTime<Utc>,
  pub total_count: u64,
}

/// One raw event under a group. Append-only; one row per publish, identical
/// events are not deduplicated.
#[derive(Debug, Clone)]
pub struct EventRecord {
  pub ts: DateTime<Utc>,
  pub level: Option<Level>,
  pub message: String,
  pub service: Option<String>,
  pub module: Option<String>,
  pub line: Option<u32>,
  pub stack: Option<String>,
  pub meta: HashMap<String, serde_json::Value>,
}

/// One analysis under a group: denormalized structured fields for
/// queryability plus the raw narrative verbatim, kept for auditability and
/// recovery if parsing ever regresses.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
  pub created_at: DateTime<Utc>,
  pub level: Option<String>,
  pub priority: Option<Priority>,
  pub title: Option<String>,
  pub probable_cause: Option<String>,
  pub confidence: Option<f64>,
  pub files_to_check: Vec<String>,
  pub checks: Vec<String>,
  pub commands: Vec<String>,
  pub fixes: Vec<String>,
  pub raw_summary: String,
}

impl AnalysisRecord {
  /// Build from a structured report carried across the boundary directly.
  pub fn from_report(report: &Report, raw_summary: &str) -> Self {
    Self {
      created_at: Utc::now(),
      level: Some(report.error_level.as_str().to_string()),
      priority: Some(report.priority),
      title: Some(report.title.clone()),
      probable_cause: Some(report.probable_cause.clone()),
      confidence: Some(report.confidence),
      files_to_check: report.files_to_check.clone(),
      checks: report.checks.clone(),
      commands: report.commands_to_run.clone(),
      fixes: report.fixes.clone(),
      raw_summary: raw_summary.to_string(),
    }
  }

  /// Recover structure from narrative text; the event's own level fills in
  /// when the text carries none.
  pub fn from_narrative(raw_summary: &str, event_level: Option<Level>) -> Self {
    let parsed = narrative::parse(raw_summary);
    Self {
      created_at: Utc::now(),
      level: parsed
        .level
        .map(|l| l.as_str().to_string())
        .or_else(|| event_level.map(|l| l.as_str().to_string())),
      priority: parsed.priority,
      title: parsed.title,
      probable_cause: parsed.probable_cause,
      confidence: parsed.confidence,
      files_to_check: parsed.files_to_check,
      checks: parsed.checks,
      commands: parsed.commands,
      fixes: parsed.fixes,
      raw_summary: raw_summary.to_string(),
    }
  }
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Transactional incident storage.
///
/// `record` applies three writes atomically: upsert the group for `key`
/// (create at count 1, or increment and advance last_seen), append the event
/// row, append the analysis row. A failure applies nothing. Uniqueness of
/// (fingerprint, service) is the store's invariant: concurrent records for
/// the same key serialize through the upsert, never duplicate the group, and
/// never lose an increment.
#[async_trait]
pub trait IncidentStore: Send + Sync {
  async fn record(
    &self,
    key: &GroupKey,
    event: EventRecord,
    analysis: AnalysisRecord,
  ) -> Result<i64, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory incident store. One lock over all state makes every `record`
/// call atomic; used by the dev binary and as the test double for the
/// persistence contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
  next_id: i64,
  groups: HashMap<GroupKey, IncidentGroup>,
  events: Vec<(i64, EventRecord)>,
  analyses: Vec<(i64, AnalysisRecord)>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn groups(&self) -> Vec<IncidentGroup> {
    let inner = self.inner.lock().await;
    let mut groups: Vec<IncidentGroup> = inner.groups.values().cloned().collect();
    groups.sort_by_key(|g| g.id);
    groups
  }

  pub async fn events_for(&self, group_id: i64) -> Vec<EventRecord> {
    let inner = self.inner.lock().await;
    inner
      .events
      .iter()
      .filter(|(id, _)| *id == group_id)
      .map(|(_, event)| event.clone())
      .collect()
  }

  pub async fn analyses_for(&self, group_id: i64) -> Vec<AnalysisRecord> {
    let inner = self.inner.lock().await;
    inner
      .analyses
      .iter()
      .filter(|(id, _)| *id == group_id)
      .map(|(_, analysis)| analysis.clone())
      .collect()
  }
}

#[async_trait]
impl IncidentStore for MemoryStore {
  async fn record(
    &self,
    key: &GroupKey,
    event: EventRecord,
    analysis: AnalysisRecord,
  ) -> Result<i64, StoreError> {
    let mut guard = self.inner.lock().await;
    let inner = &mut *guard;
    let now = Utc::now();

    let id = if let Some(group) = inner.groups.get_mut(key) {
      group.total_count += 1;
      group.last_seen = now;
      group.id
    } else {
      inner.next_id += 1;
      let id = inner.next_id;
      inner.groups.insert(
        key.clone(),
        IncidentGroup {
          id,
          fingerprint: key.fingerprint.clone(),
          service: key.service.clone(),
          first_seen: now,
          last_seen: now,
          total_count: 1,
        },
      );
      id
    };

    inner.events.push((id, event));
    inner.analyses.push((id, analysis));
    Ok(id)
  }
}
