//! Word-definition hints.
//!
//! After a round ends the bot posts a short definition of the secret word (or
//! a found pangram). Definitions come from a language-model API behind the
//! [`DefinitionProvider`] port; this module owns the retry policy and the
//! fallback text so game flow never depends on the API being up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

pub const FALLBACK_DEFINITION: &str = "(definition unavailable)";

/// Port for the external definition source. The adapter crate implements this
/// over a real HTTP API; tests implement it inline.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    async fn define(&self, word: &str) -> Result<String>;
}

/// Provider used when no API key is configured: every lookup fails, so
/// callers land on the fallback text immediately.
pub struct NoDefinitions;

#[async_trait]
impl DefinitionProvider for NoDefinitions {
    async fn define(&self, _word: &str) -> Result<String> {
        Err(crate::Error::Config(
            "no definition provider configured".to_string(),
        ))
    }
}

/// Fetch a definition with bounded retries. Transient failures are retried
/// with a short linear backoff; after the last attempt the caller gets the
/// fallback text instead of an error, so a flaky API never blocks a round
/// summary.
pub async fn definition_or_fallback(
    provider: &Arc<dyn DefinitionProvider>,
    word: &str,
    retries: u32,
) -> String {
    let attempts = retries + 1;
    for attempt in 1..=attempts {
        match provider.define(word).await {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => {
                tracing::warn!(word, attempt, "definition provider returned empty text");
            }
            Err(e) => {
                tracing::warn!(word, attempt, error = %e, "definition lookup failed");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
        }
    }
    FALLBACK_DEFINITION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl DefinitionProvider for FlakyProvider {
        async fn define(&self, _word: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(Error::External("upstream 503".to_string()))
            } else {
                Ok("a small domesticated feline".to_string())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds() {
        let provider: Arc<dyn DefinitionProvider> = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });
        let text = definition_or_fallback(&provider, "cat", 2).await;
        assert_eq!(text, "a small domesticated feline");
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_after_exhausting_retries() {
        let provider: Arc<dyn DefinitionProvider> = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first: 10,
        });
        let text = definition_or_fallback(&provider, "cat", 2).await;
        assert_eq!(text, FALLBACK_DEFINITION);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_counts_as_failure() {
        struct EmptyProvider;
        #[async_trait]
        impl DefinitionProvider for EmptyProvider {
            async fn define(&self, _word: &str) -> Result<String> {
                Ok("   ".to_string())
            }
        }
        let provider: Arc<dyn DefinitionProvider> = Arc::new(EmptyProvider);
        let text = definition_or_fallback(&provider, "cat", 1).await;
        assert_eq!(text, FALLBACK_DEFINITION);
    }
}
