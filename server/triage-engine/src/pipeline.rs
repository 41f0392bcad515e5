//! Sequential pipeline composition: fingerprint, summarize, knowledge base.

use crate::error::SummarizeError;
use crate::fingerprint::{Fingerprinter, SENTINEL_KEY};
use crate::kb::KnowledgeBase;
use crate::summarize::Summarizer;
use crate::types::{AnalysisResult, Event, Suggestion, SuggestionSource};

/// Fixed relevance score attached to knowledge-base suggestions.
const KB_SCORE: f64 = 0.7;

pub struct PipelineDeps<'a> {
  pub fingerprinter: &'a dyn Fingerprinter,
  pub summarizer: &'a dyn Summarizer,
  pub kb: &'a dyn KnowledgeBase,
}

/// Run the analysis pipeline over one batch.
///
/// Batches are fingerprinted by their first member only; an empty batch maps
/// to the sentinel key. The knowledge base is queried with the summary
/// narrative. Stage failures propagate to the caller untouched.
pub async fn run(
  events: Vec<Event>,
  deps: PipelineDeps<'_>,
) -> Result<AnalysisResult, SummarizeError> {
  let fingerprint = events
    .first()
    .map(|event| deps.fingerprinter.fingerprint(event))
    .unwrap_or_else(|| SENTINEL_KEY.to_string());

  let summary = deps.summarizer.summarize(&events).await?;

  let suggestions: Vec<Suggestion> = deps
    .kb
    .lookup(&summary.narrative)
    .await
    .into_iter()
    .map(|item| Suggestion {
      title: item.pattern,
      fix: Some(item.fix),
      source: SuggestionSource::KnowledgeBase,
      score: Some(KB_SCORE),
    })
    .collect();

  Ok(AnalysisResult {
    fingerprint,
    summary,
    suggestions,
    events,
  })
}
