//! Core types for the triage engine (event vocabulary + analysis contracts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Severity level (inbound scale)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
}

impl Level {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "trace" => Some(Self::Trace),
      "debug" => Some(Self::Debug),
      "info" => Some(Self::Info),
      "warn" | "warning" => Some(Self::Warn),
      "error" | "err" => Some(Self::Error),
      "fatal" | "critical" | "crit" => Some(Self::Fatal),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Trace => "trace",
      Self::Debug => "debug",
      Self::Info => "info",
      Self::Warn => "warn",
      Self::Error => "error",
      Self::Fatal => "fatal",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ---------------------------------------------------------------------------
// Event (inbound contract: what logging adapters send)
// ---------------------------------------------------------------------------

/// One normalized occurrence. Immutable once created; passed by reference
/// through the pipeline. Unknown JSON fields are silently ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  /// Defaults to ingestion time when absent.
  #[serde(default)]
  pub timestamp: Option<DateTime<Utc>>,
  #[serde(default)]
  pub level: Option<Level>,
  pub message: String,
  #[serde(default)]
  pub service: Option<String>,
  /// Originating logging framework, e.g. "tracing", "env_logger".
  #[serde(default)]
  pub logger: Option<String>,
  #[serde(default)]
  pub module: Option<String>,
  #[serde(default)]
  pub line: Option<u32>,
  #[serde(default)]
  pub stack: Option<String>,
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub meta: HashMap<String, serde_json::Value>,
}

impl Event {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      timestamp: None,
      level: None,
      message: message.into(),
      service: None,
      logger: None,
      module: None,
      line: None,
      stack: None,
      meta: HashMap::new(),
    }
  }
}

// ---------------------------------------------------------------------------
// Structured report (summarizer output scale)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
  Error,
  Warn,
  Info,
}

impl ReportLevel {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "error" => Some(Self::Error),
      "warn" => Some(Self::Warn),
      "info" => Some(Self::Info),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Error => "error",
      Self::Warn => "warn",
      Self::Info => "info",
    }
  }

  /// Priority assigned when the oracle omits one: error maps to P1, warn to
  /// P2, info to P3. P0 is never assigned by default.
  pub fn default_priority(self) -> Priority {
    match self {
      Self::Error => Priority::P1,
      Self::Warn => Priority::P2,
      Self::Info => Priority::P3,
    }
  }
}

impl fmt::Display for ReportLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
  P0,
  P1,
  P2,
  P3,
}

impl Priority {
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "P0" => Some(Self::P0),
      "P1" => Some(Self::P1),
      "P2" => Some(Self::P2),
      "P3" => Some(Self::P3),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::P0 => "P0",
      Self::P1 => "P1",
      Self::P2 => "P2",
      Self::P3 => "P3",
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Structured root-cause analysis for one event batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
  pub title: String,
  pub probable_cause: String,
  pub error_level: ReportLevel,
  pub priority: Priority,
  pub files_to_check: Vec<String>,
  pub commands_to_run: Vec<String>,
  pub checks: Vec<String>,
  pub fixes: Vec<String>,
  pub related_docs: Vec<String>,
  /// In [0, 1].
  pub confidence: f64,
}

/// Narrative summary plus, when the summarizer produced one, the structured
/// report it was rendered from. Sinks prefer the report and fall back to
/// parsing the narrative when only text crossed the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
  pub narrative: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub report: Option<Report>,
}

impl Summary {
  pub fn narrative_only(text: impl Into<String>) -> Self {
    Self {
      narrative: text.into(),
      report: None,
    }
  }
}

// ---------------------------------------------------------------------------
// Suggestions + knowledge base entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
  KnowledgeBase,
  Oracle,
  Rule,
}

/// A candidate remediation. Ordering is significant: the first suggestion in
/// a result is the primary one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
  pub title: String,
  #[serde(default)]
  pub fix: Option<String>,
  pub source: SuggestionSource,
  /// Ranking score in [0, 1].
  #[serde(default)]
  pub score: Option<f64>,
}

/// One knowledge-base entry: a pattern and its associated fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KBItem {
  /// Substring (or regex source) matched against analysis text.
  pub pattern: String,
  pub fix: String,
  #[serde(default)]
  pub doc: Option<String>,
}

// ---------------------------------------------------------------------------
// Analysis result (pipeline output)
// ---------------------------------------------------------------------------

/// Output of one pipeline run over one batch. Created once per ingest,
/// immutable, consumed by all sinks concurrently.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
  /// Stable grouping key.
  pub fingerprint: String,
  pub summary: Summary,
  pub suggestions: Vec<Suggestion>,
  /// The events that produced this result.
  pub events: Vec<Event>,
}
