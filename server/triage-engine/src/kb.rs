//! Knowledge-base lookup: analysis text to candidate fix patterns.

use async_trait::async_trait;

use crate::types::KBItem;

/// Maps a query string to known fix patterns.
///
/// Lookups degrade, never abort: the signature is infallible on purpose, and
/// implementations consulting network or storage must swallow backend
/// failures and return an empty list.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
  async fn lookup(&self, query: &str) -> Vec<KBItem>;
}

/// In-memory knowledge base matched by substring containment.
#[derive(Debug, Clone, Default)]
pub struct StaticKb {
  entries: Vec<KBItem>,
}

impl StaticKb {
  pub fn new(entries: Vec<KBItem>) -> Self {
    Self { entries }
  }

  /// Starter entries for common connectivity failures.
  pub fn with_defaults() -> Self {
    Self::new(vec![
      KBItem {
        pattern: "ConnectionTimeoutError".to_string(),
        fix: "Check DB connection string, network reachability, and firewall rules.".to_string(),
        doc: None,
      },
      KBItem {
        pattern: "ECONNREFUSED".to_string(),
        fix: "Verify target service is listening on the given host:port and not blocked by firewall."
          .to_string(),
        doc: None,
      },
    ])
  }
}

#[async_trait]
impl KnowledgeBase for StaticKb {
  async fn lookup(&self, query: &str) -> Vec<KBItem> {
    self
      .entries
      .iter()
      .filter(|item| query.contains(&item.pattern))
      .cloned()
      .collect()
  }
}
