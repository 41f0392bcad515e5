//! Prompt assembly for the oracle summarizer: scrubbed per-event blocks,
//! seed file hints, and the output-contract instructions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::redact;
use crate::types::Event;

/// Cap on seed path hints per prompt.
const MAX_SEED_PATHS: usize = 10;

// Extension-qualified tokens, optionally followed by a :line / (line) suffix.
static PATH: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?:[A-Za-z]:)?[./\w-]+?\.(?:rs|ts|tsx|js|jsx|mjs|cjs|py|go|rb|java|cs|sql|toml|yml|yaml|json|conf|ini)(?:[:(]\d+[:)]?)?",
  )
  .expect("path regex")
});

static LINE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[(:]\d+\)?$").expect("suffix regex"));

/// File-path-like substrings found in free text, line suffixes stripped,
/// deduplicated, capped at 10. These seed the oracle's "files to check" so it
/// stays grounded in identifiers actually present in the logs.
pub fn extract_paths(text: &str) -> Vec<String> {
  let mut paths: Vec<String> = Vec::new();
  for m in PATH.find_iter(text) {
    let cleaned = LINE_SUFFIX.replace(m.as_str(), "").into_owned();
    if !paths.contains(&cleaned) {
      paths.push(cleaned);
      if paths.len() == MAX_SEED_PATHS {
        break;
      }
    }
  }
  paths
}

const SCHEMA_HINT: &str = r#"Return ONLY valid JSON (no backticks). Use this exact shape:
{
  "title": string,
  "probable_cause": string,
  "error_level": "error"|"warn"|"info",
  "priority": "P0"|"P1"|"P2"|"P3",
  "files_to_check": string[],
  "commands_to_run": string[],
  "checks": string[],
  "fixes": string[],
  "related_docs": string[] | [],
  "confidence": number
}"#;

/// One scrubbed, truncated block per event, plus seed file hints.
fn event_block(index: usize, event: &Event, stack_lines: usize) -> String {
  let level = event.level.map(|l| l.as_str()).unwrap_or("info");
  let header = format!("#{} [{}] {}", index + 1, level, redact::scrub(&event.message));

  let raw_stack = event.stack.as_deref().unwrap_or("");
  let truncated: String = raw_stack
    .lines()
    .take(stack_lines)
    .collect::<Vec<_>>()
    .join("\n");
  let truncated = truncated.trim();

  // Seeds come from the untruncated text so deep frames still contribute.
  let seeds = extract_paths(&format!("{}\n{}", event.message, raw_stack));

  let mut parts = vec![header];
  if !truncated.is_empty() {
    parts.push(format!("STACK:\n{}", redact::scrub(truncated)));
  }
  if !seeds.is_empty() {
    parts.push(format!("SEED_FILES:\n{}", seeds.join("\n")));
  }
  parts.join("\n")
}

/// Assemble the full request: role framing, guidelines, output contract, and
/// the event blocks.
pub fn build(events: &[Event], stack_lines: usize) -> String {
  let blocks = events
    .iter()
    .enumerate()
    .map(|(i, e)| event_block(i, e, stack_lines))
    .collect::<Vec<_>>()
    .join("\n\n");

  format!(
    r#"You are a senior SRE. Read the logs and produce a terse, actionable incident analysis.

Guidelines:
- Be specific about files/modules (e.g., "src/db.rs", "docker-compose.yml", "nginx.conf").
- Include concrete CLI checks (e.g., "redis-cli ping", "lsof -i :6379", "kubectl logs <pod>").
- Prioritize least-risk, fastest fixes first; if unsure, propose useful checks and set confidence.
- Map severity to "error_level": use the most severe level seen in logs.
- If SEED_FILES are provided, consider them in "files_to_check".

{SCHEMA_HINT}

Logs:
{blocks}
"#
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Level;

  #[test]
  fn extracts_paths_with_line_suffixes_stripped() {
    let paths = extract_paths("Error at src/db.rs:45 and config/app.yml(12)");
    assert_eq!(paths, vec!["src/db.rs".to_string(), "config/app.yml".to_string()]);
  }

  #[test]
  fn deduplicates_paths() {
    let paths = extract_paths("src/db.rs:45 then src/db.rs:99 then src/db.rs");
    assert_eq!(paths, vec!["src/db.rs".to_string()]);
  }

  #[test]
  fn caps_at_ten_paths() {
    let text: String = (0..15).map(|i| format!("src/mod{}.rs ", i)).collect();
    assert_eq!(extract_paths(&text).len(), 10);
  }

  #[test]
  fn no_paths_in_plain_prose() {
    assert!(extract_paths("the request simply timed out").is_empty());
  }

  #[test]
  fn block_carries_level_and_scrubbed_message() {
    let e = Event {
      level: Some(Level::Error),
      ..Event::new("refused by 10.0.0.1")
    };
    let block = event_block(0, &e, 6);
    assert!(block.starts_with("#1 [error] "));
    assert!(block.contains("***.***.***.***"));
    assert!(!block.contains("10.0.0.1"));
  }

  #[test]
  fn block_truncates_stack_lines() {
    let stack = (0..12).map(|i| format!("frame {}", i)).collect::<Vec<_>>().join("\n");
    let e = Event {
      stack: Some(stack),
      ..Event::new("boom")
    };
    let block = event_block(0, &e, 6);
    assert!(block.contains("frame 5"));
    assert!(!block.contains("frame 6"));
  }

  #[test]
  fn seeds_survive_truncation() {
    // The path only appears in a frame past the truncation bound.
    let stack = (0..8)
      .map(|i| format!("frame {}", i))
      .chain(std::iter::once("at deep (src/deep.rs:7)".to_string()))
      .collect::<Vec<_>>()
      .join("\n");
    let e = Event {
      stack: Some(stack),
      ..Event::new("boom")
    };
    let block = event_block(0, &e, 6);
    assert!(block.contains("SEED_FILES:\nsrc/deep.rs"));
  }

  #[test]
  fn prompt_contains_contract_and_blocks() {
    let events = vec![Event::new("ConnectionTimeoutError at db.rs:45")];
    let prompt = build(&events, 6);
    assert!(prompt.contains("senior SRE"));
    assert!(prompt.contains("Return ONLY valid JSON"));
    assert!(prompt.contains("#1 [info] ConnectionTimeoutError"));
    assert!(prompt.contains("SEED_FILES:\ndb.rs"));
  }
}
