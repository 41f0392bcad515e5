//! The labeled-section narrative layout shared by summarizers and sinks.
//!
//! [`render`] and [`parse`] agree on one fixed layout; any summarizer
//! rendering through here round-trips through the persistence sink's parser.
//! Parsing only runs at the true text boundary, when a result carries no
//! structured report.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Priority, Report, ReportLevel};

static LEVEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Level:\s*([a-z]+)").expect("level regex"));
static PRIORITY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)Priority:\s*(P[0-3])").expect("priority regex"));
static CONFIDENCE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)Confidence:\s*(\d+)%").expect("confidence regex"));

fn section(items: &[String]) -> String {
  if items.is_empty() {
    " (none)".to_string()
  } else {
    format!("\n - {}", items.join("\n - "))
  }
}

/// Serialize a report into the narrative layout.
pub fn render(report: &Report) -> String {
  let mut lines = vec![
    format!("Title: {}", report.title),
    format!("Probable Cause: {}", report.probable_cause),
    format!(
      "Level: {}   Priority: {}   Confidence: {}%",
      report.error_level,
      report.priority,
      (report.confidence * 100.0).round() as i64
    ),
    format!("Files to Check:{}", section(&report.files_to_check)),
    format!("Checks:{}", section(&report.checks)),
    format!("Commands:{}", section(&report.commands_to_run)),
    format!("Fixes:{}", section(&report.fixes)),
  ];
  if !report.related_docs.is_empty() {
    lines.push(format!("Docs:\n - {}", report.related_docs.join("\n - ")));
  }
  lines.join("\n")
}

/// Fields recovered from a narrative. Absent fields stay `None`/empty: free
/// text from a rule-based summarizer parses to an all-empty value rather
/// than failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedNarrative {
  pub title: Option<String>,
  pub probable_cause: Option<String>,
  pub level: Option<ReportLevel>,
  pub priority: Option<Priority>,
  pub confidence: Option<f64>,
  pub files_to_check: Vec<String>,
  pub checks: Vec<String>,
  pub commands: Vec<String>,
  pub fixes: Vec<String>,
}

enum ListLabel {
  Files,
  Checks,
  Commands,
  Fixes,
}

fn list_label(line: &str) -> Option<ListLabel> {
  if line.starts_with("Files to Check:") {
    Some(ListLabel::Files)
  } else if line.starts_with("Checks:") {
    Some(ListLabel::Checks)
  } else if line.starts_with("Commands:") {
    Some(ListLabel::Commands)
  } else if line.starts_with("Fixes:") {
    Some(ListLabel::Fixes)
  } else {
    None
  }
}

fn non_empty(s: &str) -> Option<String> {
  let t = s.trim();
  if t.is_empty() {
    None
  } else {
    Some(t.to_string())
  }
}

/// Recover structure from a narrative produced by [`render`].
pub fn parse(summary: &str) -> ParsedNarrative {
  let mut parsed = ParsedNarrative::default();
  let lines: Vec<&str> = summary.lines().collect();
  let mut i = 0;

  while i < lines.len() {
    let line = lines[i];
    i += 1;

    if let Some(rest) = line.strip_prefix("Title:") {
      parsed.title = non_empty(rest);
    } else if let Some(rest) = line.strip_prefix("Probable Cause:") {
      parsed.probable_cause = non_empty(rest);
    } else if line.starts_with("Level:") {
      parsed.level = LEVEL
        .captures(line)
        .and_then(|c| ReportLevel::from_str_loose(&c[1]));
      parsed.priority = PRIORITY.captures(line).and_then(|c| Priority::parse(&c[1]));
      parsed.confidence = CONFIDENCE
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|pct| pct / 100.0);
    } else if let Some(label) = list_label(line) {
      let mut items = Vec::new();
      while i < lines.len() {
        match lines[i].trim().strip_prefix("- ") {
          Some(item) => {
            items.push(item.trim().to_string());
            i += 1;
          }
          None => break,
        }
      }
      match label {
        ListLabel::Files => parsed.files_to_check = items,
        ListLabel::Checks => parsed.checks = items,
        ListLabel::Commands => parsed.commands = items,
        ListLabel::Fixes => parsed.fixes = items,
      }
    }
  }

  parsed
}
