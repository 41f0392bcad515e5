//! Summarizer tuning with sane defaults.

use std::time::Duration;

/// Knobs for the oracle-backed summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
  /// Max stack-trace lines forwarded per event (bounds prompt size).
  pub include_stack_lines: usize,
  /// Extra attempts after the first failure, for retriable failures only.
  pub max_retries: u32,
  /// Deadline for a single oracle call; a lapse counts as retriable.
  pub timeout: Duration,
  /// Base delay for exponential backoff between attempts (base * 2^attempt).
  pub backoff_base: Duration,
}

impl Default for SummarizerConfig {
  fn default() -> Self {
    Self {
      include_stack_lines: 6,
      max_retries: 2,
      timeout: Duration::from_secs(15),
      backoff_base: Duration::from_millis(200),
    }
  }
}
