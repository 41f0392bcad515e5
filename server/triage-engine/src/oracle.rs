//! Contract for the external text generator.

use async_trait::async_trait;

use crate::error::OracleError;

/// One round trip to the external reasoning model: prompt in, free text out.
///
/// Clients are constructed once at startup, shared read-only across calls,
/// and dropped at shutdown. Cancellation is cooperative: when the caller's
/// deadline elapses the in-flight future is dropped, and a client that does
/// not observe the drop keeps working in the background.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, OracleError>;
}
