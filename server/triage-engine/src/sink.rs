//! Result sinks: where analysis results go after the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::SinkError;
use crate::store::{AnalysisRecord, EventRecord, GroupKey, IncidentStore};
use crate::types::AnalysisResult;

/// Consumes one immutable analysis result. Sinks must not mutate the result;
/// the same object is shared across all of them concurrently.
#[async_trait]
pub trait Sink: Send + Sync {
  /// Short name used when reporting fan-out failures.
  fn name(&self) -> &str;

  async fn publish(&self, result: &AnalysisResult) -> Result<(), SinkError>;
}

/// Emits the result through tracing. Default sink when nothing else is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl Sink for LogSink {
  fn name(&self) -> &str {
    "log"
  }

  async fn publish(&self, result: &AnalysisResult) -> Result<(), SinkError> {
    let fix = result
      .suggestions
      .first()
      .and_then(|s| s.fix.as_deref())
      .unwrap_or("(none)");
    tracing::info!(
      fingerprint = %result.fingerprint,
      suggested_fix = fix,
      summary = %result.summary.narrative,
      "analysis result"
    );
    Ok(())
  }
}

/// Persists results as incident groups with append-only event and analysis
/// history. The store's single transactional `record` operation keeps the
/// three writes atomic.
pub struct StoreSink {
  store: Arc<dyn IncidentStore>,
}

impl StoreSink {
  pub fn new(store: Arc<dyn IncidentStore>) -> Self {
    Self { store }
  }
}

#[async_trait]
impl Sink for StoreSink {
  fn name(&self) -> &str {
    "store"
  }

  async fn publish(&self, result: &AnalysisResult) -> Result<(), SinkError> {
    // A result with no events has nothing to group under.
    let first = match result.events.first() {
      Some(event) => event,
      None => return Ok(()),
    };

    let key = GroupKey {
      fingerprint: result.fingerprint.clone(),
      service: first.service.clone().unwrap_or_default(),
    };

    let event = EventRecord {
      ts: first.timestamp.unwrap_or_else(Utc::now),
      level: first.level,
      message: first.message.clone(),
      service: first.service.clone(),
      module: first.module.clone(),
      line: first.line,
      stack: first.stack.clone(),
      meta: first.meta.clone(),
    };

    // Structured report when one crossed the boundary; narrative parse at
    // the text-only boundary otherwise.
    let analysis = match &result.summary.report {
      Some(report) => AnalysisRecord::from_report(report, &result.summary.narrative),
      None => AnalysisRecord::from_narrative(&result.summary.narrative, first.level),
    };

    let group_id = self.store.record(&key, event, analysis).await?;
    tracing::debug!(fingerprint = %result.fingerprint, group_id, "result persisted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use crate::types::{Event, Level, Priority, Report, ReportLevel, Summary};
  use crate::narrative;

  fn result_with(summary: Summary, events: Vec<Event>) -> AnalysisResult {
    AnalysisResult {
      fingerprint: "connectiontimeouterror".to_string(),
      summary,
      suggestions: Vec::new(),
      events,
    }
  }

  fn error_event() -> Event {
    Event {
      level: Some(Level::Error),
      service: Some("api".into()),
      ..Event::new("ConnectionTimeoutError at db.rs:45")
    }
  }

  #[tokio::test]
  async fn empty_batch_is_a_no_op() {
    let store = Arc::new(MemoryStore::new());
    let sink = StoreSink::new(store.clone());
    sink
      .publish(&result_with(Summary::narrative_only("x"), Vec::new()))
      .await
      .unwrap();
    assert!(store.groups().await.is_empty());
  }

  #[tokio::test]
  async fn publish_uses_structured_report_directly() {
    let store = Arc::new(MemoryStore::new());
    let sink = StoreSink::new(store.clone());

    let report = Report {
      title: "DB timeout".into(),
      probable_cause: "db unreachable".into(),
      error_level: ReportLevel::Error,
      priority: Priority::P1,
      files_to_check: vec!["src/db.rs".into()],
      commands_to_run: vec![],
      checks: vec![],
      fixes: vec!["check firewall".into()],
      related_docs: vec![],
      confidence: 0.8,
    };
    let summary = Summary {
      narrative: narrative::render(&report),
      report: Some(report),
    };

    sink
      .publish(&result_with(summary, vec![error_event()]))
      .await
      .unwrap();

    let groups = store.groups().await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].service, "api");

    let analyses = store.analyses_for(groups[0].id).await;
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].title.as_deref(), Some("DB timeout"));
    assert_eq!(analyses[0].priority, Some(Priority::P1));
    assert_eq!(analyses[0].files_to_check, vec!["src/db.rs".to_string()]);
  }

  #[tokio::test]
  async fn publish_parses_narrative_when_no_report() {
    let store = Arc::new(MemoryStore::new());
    let sink = StoreSink::new(store.clone());

    let narrative_text = "Title: Cache stampede\nProbable Cause: cold keys\nLevel: warn   Priority: P2   Confidence: 70%\nFiles to Check: (none)\nChecks: (none)\nCommands: (none)\nFixes:\n - add jitter";
    sink
      .publish(&result_with(
        Summary::narrative_only(narrative_text),
        vec![error_event()],
      ))
      .await
      .unwrap();

    let groups = store.groups().await;
    let analyses = store.analyses_for(groups[0].id).await;
    assert_eq!(analyses[0].title.as_deref(), Some("Cache stampede"));
    assert_eq!(analyses[0].level.as_deref(), Some("warn"));
    assert_eq!(analyses[0].fixes, vec!["add jitter".to_string()]);
    assert_eq!(analyses[0].raw_summary, narrative_text);
  }

  #[tokio::test]
  async fn missing_service_groups_under_empty_bucket() {
    let store = Arc::new(MemoryStore::new());
    let sink = StoreSink::new(store.clone());
    let event = Event::new("boom");
    sink
      .publish(&result_with(Summary::narrative_only("boom"), vec![event]))
      .await
      .unwrap();
    let groups = store.groups().await;
    assert_eq!(groups[0].service, "");
  }

  #[tokio::test]
  async fn event_row_copies_event_fields() {
    let store = Arc::new(MemoryStore::new());
    let sink = StoreSink::new(store.clone());
    let mut event = error_event();
    event.module = Some("db".into());
    event.line = Some(45);
    event.stack = Some("at connect (db.rs:30)".into());

    sink
      .publish(&result_with(Summary::narrative_only("x"), vec![event]))
      .await
      .unwrap();

    let groups = store.groups().await;
    let events = store.events_for(groups[0].id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "ConnectionTimeoutError at db.rs:45");
    assert_eq!(events[0].module.as_deref(), Some("db"));
    assert_eq!(events[0].line, Some(45));
    assert!(events[0].ts <= Utc::now());
  }
}
