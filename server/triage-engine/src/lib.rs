//! Triage Engine: event-analysis pipeline for application log/error events.
//!
//! Ingests normalized events, groups them by stable fingerprint, produces an
//! actionable root-cause analysis (rule-based, or through an external
//! reasoning model wrapped in a resilience layer), matches known fix
//! patterns, and fans results out to sinks. The persistence sink aggregates
//! unboundedly many raw events into a bounded set of incident groups, each
//! with append-only event and analysis history.
//!
//! Collaborators plug in through four one-method traits (fingerprinter,
//! summarizer, knowledge base, sink) injected into the [`Analyzer`].

pub mod analyzer;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod kb;
pub mod narrative;
pub mod normalize;
pub mod oracle;
pub mod pg;
pub mod pipeline;
pub mod prompt;
pub mod redact;
pub mod sink;
pub mod store;
pub mod summarize;
pub mod types;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use config::SummarizerConfig;
pub use error::{AnalyzeError, OracleError, SinkError, StoreError, SummarizeError};
pub use fingerprint::{Fingerprinter, FirstTokenFingerprinter, StackHashFingerprinter};
pub use kb::{KnowledgeBase, StaticKb};
pub use oracle::GenerativeClient;
pub use pg::PgStore;
pub use sink::{LogSink, Sink, StoreSink};
pub use store::{IncidentStore, MemoryStore};
pub use summarize::{OracleSummarizer, RuleSummarizer, Summarizer};
pub use types::{AnalysisResult, Event, KBItem, Level, Suggestion, SuggestionSource, Summary};
