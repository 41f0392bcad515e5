//! Summarization: the rule-based fallback and the resilient oracle adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};

use crate::config::SummarizerConfig;
use crate::error::{OracleError, SummarizeError};
use crate::narrative;
use crate::normalize;
use crate::oracle::GenerativeClient;
use crate::prompt;
use crate::types::{Event, Summary};

/// Maps a batch of events to a narrative (and, when available, structured)
/// analysis.
#[async_trait]
pub trait Summarizer: Send + Sync {
  async fn summarize(&self, events: &[Event]) -> Result<Summary, SummarizeError>;
}

/// Chars kept from the first message by the rule-based policy.
const RULE_SUMMARY_MAX_CHARS: usize = 120;

/// No oracle: condense to the first event's message, truncated. The minimal
/// legal summarizer, and the default when no oracle client is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSummarizer;

#[async_trait]
impl Summarizer for RuleSummarizer {
  async fn summarize(&self, events: &[Event]) -> Result<Summary, SummarizeError> {
    let narrative: String = match events.first() {
      Some(first) => first.message.chars().take(RULE_SUMMARY_MAX_CHARS).collect(),
      None => "No events".to_string(),
    };
    Ok(Summary::narrative_only(narrative))
  }
}

/// Wraps an external oracle with redaction, truncation, a per-call deadline,
/// retry with exponential backoff, and untrusted-output normalization.
///
/// The oracle's text is never trusted: whatever comes back is normalized into
/// a fully-populated report, so a malformed response degrades the analysis
/// instead of failing it.
pub struct OracleSummarizer {
  client: Arc<dyn GenerativeClient>,
  config: SummarizerConfig,
}

impl OracleSummarizer {
  pub fn new(client: Arc<dyn GenerativeClient>, config: SummarizerConfig) -> Self {
    Self { client, config }
  }

  pub fn with_defaults(client: Arc<dyn GenerativeClient>) -> Self {
    Self::new(client, SummarizerConfig::default())
  }

  async fn call_with_retries(&self, prompt: &str) -> Result<String, SummarizeError> {
    let mut attempt: u32 = 0;
    loop {
      let outcome = match timeout(self.config.timeout, self.client.generate(prompt)).await {
        Ok(result) => result,
        // Deadline elapsed: the in-flight call was dropped (cooperatively
        // cancelled) and the lapse counts as a retriable failure.
        Err(_) => Err(OracleError::Timeout(self.config.timeout)),
      };

      match outcome {
        Ok(text) => return Ok(text.trim().to_string()),
        Err(OracleError::Status { code: 404, message }) => {
          return Err(SummarizeError::ModelNotFound(message));
        }
        Err(err) => {
          if attempt >= self.config.max_retries || !err.is_retriable() {
            return Err(err.into());
          }
          let delay = self.config.backoff_base * 2u32.pow(attempt);
          tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "oracle call failed, retrying");
          sleep(delay).await;
          attempt += 1;
        }
      }
    }
  }
}

#[async_trait]
impl Summarizer for OracleSummarizer {
  async fn summarize(&self, events: &[Event]) -> Result<Summary, SummarizeError> {
    let prompt = prompt::build(events, self.config.include_stack_lines);
    let raw = self.call_with_retries(&prompt).await?;
    let report = normalize::normalize(&raw, events);
    let narrative = narrative::render(&report);
    Ok(Summary {
      narrative,
      report: Some(report),
    })
  }
}
