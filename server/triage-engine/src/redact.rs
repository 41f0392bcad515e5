//! Sensitive-data scrubbing, applied before any text leaves the process.
//!
//! Scrubbing is lossy by design: matches become fixed placeholders and the
//! original text is not recoverable.

use once_cell::sync::Lazy;
use regex::Regex;

static BEARER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)(bearer|api[-_ ]?key)\s+[a-z0-9_\-]{8,}").expect("bearer regex"));

static EMAIL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").expect("email regex"));

static IPV4: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b").expect("ipv4 regex"));

// Three dot-delimited base64url segments, structurally resembling a JWT.
static SIGNED_TOKEN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").expect("signed token regex")
});

/// Replace credentials, signing tokens, emails, and IPv4 addresses with fixed
/// placeholders. Address categories scrub before the token pattern, which
/// would otherwise consume dotted quads and leave partial addresses behind.
pub fn scrub(text: &str) -> String {
  let t = BEARER.replace_all(text, "${1} ****");
  let t = EMAIL.replace_all(&t, "****@****");
  let t = IPV4.replace_all(&t, "***.***.***.***");
  let t = SIGNED_TOKEN.replace_all(&t, "***.***.***");
  t.into_owned()
}
