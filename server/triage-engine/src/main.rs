//! Binary entrypoint: read JSON-lines events from stdin, analyze, report.
//!
//! Each input line is one Event. Results go to the log sink (stderr, via
//! tracing) and an in-memory incident store; at EOF the aggregated incident
//! groups are written to stdout as JSON lines. Invalid lines are reported on
//! stderr and skipped; an ingestion failure never stops the stream.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use triage_engine::{Analyzer, Event, LogSink, MemoryStore, StoreSink};

#[tokio::main(flavor = "current_thread")]
async fn main() {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .init();

  let store = Arc::new(MemoryStore::new());
  let analyzer = Analyzer::builder()
    .sink(LogSink)
    .sink(StoreSink::new(store.clone()))
    .build();

  let stdin = io::stdin();
  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        eprintln!("triage-engine: read error: {}", e);
        std::process::exit(1);
      }
    };

    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let event: Event = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        eprintln!("triage-engine: json parse: {}", e);
        continue;
      }
    };

    // Discard-and-continue on purpose: the stream outlives one bad ingest.
    if let Err(e) = analyzer.ingest(event).await {
      eprintln!("triage-engine: ingest: {}", e);
    }
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  for group in store.groups().await {
    if serde_json::to_writer(&mut out, &group).is_ok() {
      let _ = writeln!(out);
    }
  }
}
