//! Structured error types for the triage engine.

use std::time::Duration;
use thiserror::Error;

/// Failure from the external text generator.
#[derive(Debug, Error)]
pub enum OracleError {
  #[error("oracle returned status {code}: {message}")]
  Status { code: u16, message: String },

  #[error("oracle transport error: {0}")]
  Transport(String),

  #[error("oracle call timed out after {0:?}")]
  Timeout(Duration),
}

impl OracleError {
  pub fn status(code: u16, message: impl Into<String>) -> Self {
    Self::Status {
      code,
      message: message.into(),
    }
  }

  /// Rate limits, server-side failures, transport errors, and timeouts are
  /// worth retrying; everything else surfaces immediately.
  pub fn is_retriable(&self) -> bool {
    match self {
      Self::Status { code, .. } => *code == 429 || (500..600).contains(code),
      Self::Transport(_) | Self::Timeout(_) => true,
    }
  }
}

#[derive(Debug, Error)]
pub enum SummarizeError {
  /// Misconfiguration, not an outage: never retried.
  #[error("model or endpoint not found ({0}); check the configured model id")]
  ModelNotFound(String),

  #[error(transparent)]
  Oracle(#[from] OracleError),
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage backend: {0}")]
  Backend(String),
}

impl StoreError {
  pub fn backend(msg: impl Into<String>) -> Self {
    Self::Backend(msg.into())
  }
}

#[derive(Debug, Error)]
pub enum SinkError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("{0}")]
  Other(String),
}

/// One sink's failure inside a fan-out.
#[derive(Debug)]
pub struct SinkFailure {
  pub sink: String,
  pub error: SinkError,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
  #[error(transparent)]
  Summarize(#[from] SummarizeError),

  /// Every sink was invoked; these are the ones that failed.
  #[error("publish failed for {} sink(s): {}", .0.len(), format_failures(.0))]
  Publish(Vec<SinkFailure>),
}

fn format_failures(failures: &[SinkFailure]) -> String {
  failures
    .iter()
    .map(|f| format!("{}: {}", f.sink, f.error))
    .collect::<Vec<_>>()
    .join("; ")
}
