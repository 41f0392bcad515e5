//! Ingestion entry point: runs the pipeline and fans results out to sinks.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::{AnalyzeError, SinkError, SinkFailure};
use crate::fingerprint::{Fingerprinter, FirstTokenFingerprinter};
use crate::kb::{KnowledgeBase, StaticKb};
use crate::pipeline::{self, PipelineDeps};
use crate::sink::{LogSink, Sink};
use crate::summarize::{RuleSummarizer, Summarizer};
use crate::types::Event;

/// The analysis front door. Built once via [`Analyzer::builder`] with
/// explicitly injected collaborators; every omitted part falls back to the
/// rule-based defaults.
pub struct Analyzer {
  fingerprinter: Arc<dyn Fingerprinter>,
  summarizer: Arc<dyn Summarizer>,
  kb: Arc<dyn KnowledgeBase>,
  sinks: Vec<Arc<dyn Sink>>,
}

impl Analyzer {
  pub fn builder() -> AnalyzerBuilder {
    AnalyzerBuilder::default()
  }

  pub fn with_defaults() -> Self {
    Self::builder().build()
  }

  /// Analyze one event and publish the result to every sink concurrently.
  ///
  /// Every sink is invoked regardless of the others' outcomes; failures are
  /// collected into one aggregate error after all publishes settle, so a
  /// failing sink never hides what the rest did. Adapters on a logging call
  /// path discard the returned error (log and continue) rather than letting
  /// it propagate into the host application.
  pub async fn ingest(&self, event: Event) -> Result<(), AnalyzeError> {
    let result = pipeline::run(
      vec![event],
      PipelineDeps {
        fingerprinter: self.fingerprinter.as_ref(),
        summarizer: self.summarizer.as_ref(),
        kb: self.kb.as_ref(),
      },
    )
    .await?;

    let result = Arc::new(result);
    let mut tasks = JoinSet::new();
    for sink in &self.sinks {
      let sink = Arc::clone(sink);
      let result = Arc::clone(&result);
      tasks.spawn(async move {
        let name = sink.name().to_string();
        (name, sink.publish(&result).await)
      });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((_, Ok(()))) => {}
        Ok((name, Err(error))) => failures.push(SinkFailure { sink: name, error }),
        Err(join_error) => failures.push(SinkFailure {
          sink: "(panicked)".to_string(),
          error: SinkError::Other(join_error.to_string()),
        }),
      }
    }

    if failures.is_empty() {
      Ok(())
    } else {
      Err(AnalyzeError::Publish(failures))
    }
  }
}

#[derive(Default)]
pub struct AnalyzerBuilder {
  fingerprinter: Option<Arc<dyn Fingerprinter>>,
  summarizer: Option<Arc<dyn Summarizer>>,
  kb: Option<Arc<dyn KnowledgeBase>>,
  sinks: Vec<Arc<dyn Sink>>,
}

impl AnalyzerBuilder {
  pub fn fingerprinter(mut self, fingerprinter: impl Fingerprinter + 'static) -> Self {
    self.fingerprinter = Some(Arc::new(fingerprinter));
    self
  }

  pub fn summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
    self.summarizer = Some(Arc::new(summarizer));
    self
  }

  pub fn kb(mut self, kb: impl KnowledgeBase + 'static) -> Self {
    self.kb = Some(Arc::new(kb));
    self
  }

  /// Register a sink. May be called repeatedly; registration order does not
  /// order publishes, which run concurrently.
  pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
    self.sinks.push(Arc::new(sink));
    self
  }

  pub fn build(self) -> Analyzer {
    Analyzer {
      fingerprinter: self
        .fingerprinter
        .unwrap_or_else(|| Arc::new(FirstTokenFingerprinter)),
      summarizer: self.summarizer.unwrap_or_else(|| Arc::new(RuleSummarizer)),
      kb: self.kb.unwrap_or_else(|| Arc::new(StaticKb::with_defaults())),
      sinks: if self.sinks.is_empty() {
        vec![Arc::new(LogSink)]
      } else {
        self.sinks
      },
    }
  }
}
