//! Untrusted-output normalization: oracle free text to a validated [`Report`].
//!
//! The oracle is never trusted to return well-formed JSON. The first `{...}`
//! span is extracted (leading/trailing prose tolerated), trailing commas are
//! stripped, and every field is validated and defaulted independently. A
//! response with no parseable object degrades to a synthetic report instead
//! of failing the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::types::{Event, Level, Report, ReportLevel};

pub const FALLBACK_CONFIDENCE: f64 = 0.6;
const FALLBACK_EXCERPT_CHARS: usize = 200;
const FALLBACK_CAUSE: &str =
  "Insufficient details; verify service status, connectivity, and recent changes.";

static TRAILING_COMMA_OBJ: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*\}").expect("comma regex"));
static TRAILING_COMMA_ARR: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*\]").expect("comma regex"));

/// Highest severity class across the batch, by precedence (error > warn >
/// info), independent of position. Fatal events count as the error class.
pub fn infer_highest_level(events: &[Event]) -> ReportLevel {
  let mut highest = ReportLevel::Info;
  for event in events {
    match event.level {
      Some(Level::Error) | Some(Level::Fatal) => return ReportLevel::Error,
      Some(Level::Warn) => highest = ReportLevel::Warn,
      _ => {}
    }
  }
  highest
}

/// Normalize raw oracle text into a fully-populated report.
pub fn normalize(raw: &str, events: &[Event]) -> Report {
  let highest = infer_highest_level(events);

  let obj = match extract_object(raw) {
    Some(obj) => obj,
    None => return fallback(raw, highest),
  };

  let error_level = str_field(&obj, "error_level")
    .and_then(|s| ReportLevel::from_str_loose(&s))
    .unwrap_or(highest);

  Report {
    title: str_field(&obj, "title").unwrap_or_else(|| "Analysis".to_string()),
    probable_cause: str_field(&obj, "probable_cause")
      .unwrap_or_else(|| FALLBACK_CAUSE.to_string()),
    error_level,
    priority: str_field(&obj, "priority")
      .and_then(|s| crate::types::Priority::parse(&s))
      .unwrap_or_else(|| error_level.default_priority()),
    files_to_check: list_field(&obj, "files_to_check"),
    commands_to_run: list_field(&obj, "commands_to_run"),
    checks: list_field(&obj, "checks"),
    fixes: list_field(&obj, "fixes"),
    related_docs: list_field(&obj, "related_docs"),
    confidence: obj
      .get("confidence")
      .and_then(Value::as_f64)
      .map(|n| n.clamp(0.0, 1.0))
      .unwrap_or(FALLBACK_CONFIDENCE),
  }
}

/// First `{...}` span of the response, trailing commas stripped, parsed as an
/// object. `None` when nothing parseable is there.
fn extract_object(raw: &str) -> Option<serde_json::Map<String, Value>> {
  let start = raw.find('{')?;
  let end = raw.rfind('}')?;
  if end < start {
    return None;
  }
  let candidate = &raw[start..=end];
  let cleaned = TRAILING_COMMA_OBJ.replace_all(candidate, "}");
  let cleaned = TRAILING_COMMA_ARR.replace_all(&cleaned, "]");
  match serde_json::from_str::<Value>(&cleaned) {
    Ok(Value::Object(map)) => Some(map),
    _ => None,
  }
}

fn fallback(raw: &str, highest: ReportLevel) -> Report {
  let excerpt: String = raw.chars().take(FALLBACK_EXCERPT_CHARS).collect();
  let excerpt = excerpt.trim().to_string();
  Report {
    title: "Analysis".to_string(),
    probable_cause: if excerpt.is_empty() {
      FALLBACK_CAUSE.to_string()
    } else {
      excerpt
    },
    error_level: highest,
    priority: highest.default_priority(),
    files_to_check: Vec::new(),
    commands_to_run: Vec::new(),
    checks: Vec::new(),
    fixes: Vec::new(),
    related_docs: Vec::new(),
    confidence: FALLBACK_CONFIDENCE,
  }
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
  obj
    .get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// String elements of an array field; anything else (missing, wrong type,
/// non-string elements) contributes nothing.
fn list_field(obj: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
  match obj.get(key) {
    Some(Value::Array(items)) => items
      .iter()
      .filter_map(Value::as_str)
      .map(str::to_string)
      .collect(),
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Priority;
  use pretty_assertions::assert_eq;

  fn leveled(level: Option<Level>) -> Event {
    Event {
      level,
      ..Event::new("x")
    }
  }

  #[test]
  fn highest_level_precedence_not_position() {
    let batch = vec![
      leveled(Some(Level::Info)),
      leveled(Some(Level::Error)),
      leveled(Some(Level::Warn)),
    ];
    assert_eq!(infer_highest_level(&batch), ReportLevel::Error);

    let batch = vec![leveled(Some(Level::Warn)), leveled(Some(Level::Info))];
    assert_eq!(infer_highest_level(&batch), ReportLevel::Warn);

    let batch = vec![leveled(Some(Level::Debug)), leveled(None)];
    assert_eq!(infer_highest_level(&batch), ReportLevel::Info);
  }

  #[test]
  fn fatal_counts_as_error_class() {
    let batch = vec![leveled(Some(Level::Fatal))];
    assert_eq!(infer_highest_level(&batch), ReportLevel::Error);
  }

  #[test]
  fn parses_json_with_prose_and_trailing_commas() {
    let raw = r#"Sure! Here is the analysis you asked for:
{
  "title": "Redis down",
  "probable_cause": "redis is unreachable",
  "error_level": "error",
  "priority": "P1",
  "files_to_check": ["src/cache.rs",],
  "commands_to_run": ["redis-cli ping"],
  "checks": [],
  "fixes": ["restart redis",],
  "confidence": 0.9,
}
Hope that helps!"#;
    let report = normalize(raw, &[]);
    assert_eq!(report.title, "Redis down");
    assert_eq!(report.probable_cause, "redis is unreachable");
    assert_eq!(report.error_level, ReportLevel::Error);
    assert_eq!(report.priority, Priority::P1);
    assert_eq!(report.files_to_check, vec!["src/cache.rs".to_string()]);
    assert_eq!(report.fixes, vec!["restart redis".to_string()]);
    assert_eq!(report.related_docs, Vec::<String>::new());
    assert!((report.confidence - 0.9).abs() < 1e-9);
  }

  #[test]
  fn missing_fields_get_defaults() {
    let raw = r#"{"title": "Partial"}"#;
    let events = vec![leveled(Some(Level::Warn))];
    let report = normalize(raw, &events);
    assert_eq!(report.title, "Partial");
    assert_eq!(report.error_level, ReportLevel::Warn);
    assert_eq!(report.priority, Priority::P2);
    assert!(report.files_to_check.is_empty());
    assert!((report.confidence - FALLBACK_CONFIDENCE).abs() < 1e-9);
  }

  #[test]
  fn invalid_list_fields_become_empty() {
    let raw = r#"{"title": "x", "files_to_check": "not-a-list", "checks": 7}"#;
    let report = normalize(raw, &[]);
    assert!(report.files_to_check.is_empty());
    assert!(report.checks.is_empty());
  }

  #[test]
  fn confidence_is_clamped() {
    let report = normalize(r#"{"confidence": 3.5}"#, &[]);
    assert!((report.confidence - 1.0).abs() < 1e-9);
    let report = normalize(r#"{"confidence": -1}"#, &[]);
    assert_eq!(report.confidence, 0.0);
  }

  #[test]
  fn priority_derived_from_reported_level() {
    // Level present, priority absent: derive from the reported level, not
    // from the batch.
    let raw = r#"{"error_level": "info"}"#;
    let events = vec![leveled(Some(Level::Error))];
    let report = normalize(raw, &events);
    assert_eq!(report.error_level, ReportLevel::Info);
    assert_eq!(report.priority, Priority::P3);
  }

  #[test]
  fn no_json_degrades_to_excerpt_fallback() {
    let raw = "The model went completely off the rails and wrote a poem.";
    let events = vec![leveled(Some(Level::Error))];
    let report = normalize(raw, &events);
    assert_eq!(report.title, "Analysis");
    assert!(raw.starts_with(&report.probable_cause));
    assert_eq!(report.error_level, ReportLevel::Error);
    assert_eq!(report.priority, Priority::P1);
    assert!((report.confidence - FALLBACK_CONFIDENCE).abs() < 1e-9);
  }

  #[test]
  fn fallback_excerpt_is_bounded() {
    let raw = "x".repeat(1000);
    let report = normalize(&raw, &[]);
    assert_eq!(report.probable_cause.chars().count(), 200);
  }

  #[test]
  fn unbalanced_braces_fall_back() {
    let report = normalize("} nope {", &[]);
    assert_eq!(report.title, "Analysis");
    assert!((report.confidence - FALLBACK_CONFIDENCE).abs() < 1e-9);
  }
}
