//! Stable grouping keys for events.

use crate::types::Event;

/// Key returned for degenerate input (empty or whitespace-only message).
pub const SENTINEL_KEY: &str = "unknown";

/// Maps one event to a stable grouping key.
///
/// Implementations must be pure, deterministic, and total: a non-empty key
/// comes back for any event, and the call never fails.
pub trait Fingerprinter: Send + Sync {
  fn fingerprint(&self, event: &Event) -> String;
}

/// Default policy: lower-cased first whitespace-delimited token of the
/// message. Cheap and stable; callers wanting real error-signature grouping
/// substitute [`StackHashFingerprinter`] or their own implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstTokenFingerprinter;

impl Fingerprinter for FirstTokenFingerprinter {
  fn fingerprint(&self, event: &Event) -> String {
    event
      .message
      .split_whitespace()
      .next()
      .map(|token| token.to_lowercase())
      .unwrap_or_else(|| SENTINEL_KEY.to_string())
  }
}

/// Hash-based policy: blake3 over service, the first message token, and the
/// top trimmed stack lines. Distinguishes the same error type thrown from
/// different call sites, which the first-token default cannot.
#[derive(Debug, Clone, Copy)]
pub struct StackHashFingerprinter {
  /// Max stack lines folded into the key.
  pub max_stack_lines: usize,
}

impl Default for StackHashFingerprinter {
  fn default() -> Self {
    Self { max_stack_lines: 5 }
  }
}

impl Fingerprinter for StackHashFingerprinter {
  fn fingerprint(&self, event: &Event) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(event.service.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    let token = event.message.split_whitespace().next().unwrap_or(SENTINEL_KEY);
    hasher.update(token.as_bytes());

    if let Some(stack) = &event.stack {
      for line in stack.lines().take(self.max_stack_lines) {
        hasher.update(b"|");
        hasher.update(line.trim().as_bytes());
      }
    }

    let hex = hasher.finalize().to_hex();
    // First 16 bytes (32 hex chars): compact but collision-resistant.
    hex[..32].to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Event;

  #[test]
  fn first_token_lowercased() {
    let e = Event::new("ConnectionTimeoutError at db.rs:45");
    assert_eq!(
      FirstTokenFingerprinter.fingerprint(&e),
      "connectiontimeouterror"
    );
  }

  #[test]
  fn empty_message_maps_to_sentinel() {
    let e = Event::new("");
    assert_eq!(FirstTokenFingerprinter.fingerprint(&e), SENTINEL_KEY);
  }

  #[test]
  fn whitespace_only_message_maps_to_sentinel() {
    let e = Event::new("   \t  \n ");
    assert_eq!(FirstTokenFingerprinter.fingerprint(&e), SENTINEL_KEY);
  }

  #[test]
  fn first_token_never_empty() {
    for msg in ["", " ", "x", "multi word message", "\n\n"] {
      let key = FirstTokenFingerprinter.fingerprint(&Event::new(msg));
      assert!(!key.is_empty(), "empty key for message {:?}", msg);
    }
  }

  fn stack_event(service: &str, msg: &str, stack: &str) -> Event {
    Event {
      service: Some(service.into()),
      stack: Some(stack.into()),
      ..Event::new(msg)
    }
  }

  #[test]
  fn stack_hash_same_input_same_key() {
    let e1 = stack_event("api", "TypeError: boom", "at handler (src/a.rs:10)");
    let e2 = stack_event("api", "TypeError: boom", "at handler (src/a.rs:10)");
    assert_eq!(
      StackHashFingerprinter::default().fingerprint(&e1),
      StackHashFingerprinter::default().fingerprint(&e2)
    );
  }

  #[test]
  fn stack_hash_distinguishes_call_sites() {
    let e1 = stack_event("api", "TypeError: boom", "at handler (src/a.rs:10)");
    let e2 = stack_event("api", "TypeError: boom", "at worker (src/b.rs:99)");
    assert_ne!(
      StackHashFingerprinter::default().fingerprint(&e1),
      StackHashFingerprinter::default().fingerprint(&e2)
    );
  }

  #[test]
  fn stack_hash_distinguishes_services() {
    let e1 = stack_event("api", "TypeError: boom", "at handler (src/a.rs:10)");
    let e2 = stack_event("worker", "TypeError: boom", "at handler (src/a.rs:10)");
    assert_ne!(
      StackHashFingerprinter::default().fingerprint(&e1),
      StackHashFingerprinter::default().fingerprint(&e2)
    );
  }

  #[test]
  fn stack_hash_ignores_lines_beyond_max() {
    let long = "a\nb\nc\nd\ne\nf\ng";
    let short = "a\nb\nc\nd\ne";
    let e1 = stack_event("api", "TypeError", long);
    let e2 = stack_event("api", "TypeError", short);
    assert_eq!(
      StackHashFingerprinter::default().fingerprint(&e1),
      StackHashFingerprinter::default().fingerprint(&e2)
    );
  }

  #[test]
  fn stack_hash_is_32_hex_chars() {
    let key = StackHashFingerprinter::default().fingerprint(&Event::new(""));
    assert_eq!(key.len(), 32);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
  }
}
