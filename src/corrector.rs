//! Orchestrator for the punctuation pipeline.
//!
//! Validates input, consults the cache, calls the remote backend on a miss,
//! runs post-processing, and always returns a usable string. Correction is
//! strictly best effort: any failure falls back to the original fragment.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CorrectionCache};
use crate::client::{build_system_prompt, CompletionBackend, HttpCompletionClient};
use crate::config::CorrectorConfig;
use crate::error::CorrectionError;
use crate::patterns::rules_for;
use crate::postprocess::post_process;

/// One fragment awaiting correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
    pub language: String,
}

/// Punctuation corrector for live-caption fragments.
///
/// Cheap to clone; clones share the configuration, backend and cache, so
/// concurrent invocations are the expected mode of use.
#[derive(Clone)]
pub struct PunctuationCorrector {
    config: Arc<CorrectorConfig>,
    backend: Arc<dyn CompletionBackend>,
    cache: Arc<CorrectionCache>,
}

impl PunctuationCorrector {
    pub fn new(config: CorrectorConfig) -> Result<Self, CorrectionError> {
        let config = Arc::new(config);
        let backend = Arc::new(HttpCompletionClient::new(config.clone())?);
        Ok(Self::assemble(config, backend))
    }

    /// Build a corrector over a custom backend. Used by tests and by hosts
    /// that bring their own completion transport.
    pub fn with_backend(config: CorrectorConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self::assemble(Arc::new(config), backend)
    }

    fn assemble(config: Arc<CorrectorConfig>, backend: Arc<dyn CompletionBackend>) -> Self {
        let cache = Arc::new(CorrectionCache::new(config.cache_capacity));
        Self {
            config,
            backend,
            cache,
        }
    }

    /// Correct punctuation in a single fragment. Never fails: on any remote
    /// or post-processing problem the trimmed original comes back unchanged.
    pub async fn correct(&self, text: &str, language: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        if trimmed.chars().count() < self.config.min_input_len {
            // Too short to safely judge sentence completeness.
            return trimmed.to_string();
        }

        let key = self.cache_key(trimmed, language);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for fragment ({} chars)", trimmed.len());
            return cached;
        }

        match self.correct_uncached(trimmed, language).await {
            Ok(corrected) => {
                self.cache.put(&key, &corrected);
                corrected
            }
            Err(err) => {
                warn!("Punctuation correction failed, returning original: {}", err);
                trimmed.to_string()
            }
        }
    }

    async fn correct_uncached(
        &self,
        trimmed: &str,
        language: &str,
    ) -> Result<String, CorrectionError> {
        let prompt = build_system_prompt(language);
        let candidate = self.backend.complete(&prompt, trimmed).await?;
        debug!("Candidate correction: '{}'", candidate);

        let rules = rules_for(language);
        Ok(post_process(
            &candidate,
            trimmed,
            rules,
            self.config.max_word_drift,
        ))
    }

    /// Correct a batch of fragments concurrently. Results come back in input
    /// order regardless of completion order.
    pub async fn correct_batch(&self, requests: Vec<CorrectionRequest>) -> Vec<String> {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let corrector = self.clone();
                let fallback = request.text.trim().to_string();
                let handle = tokio::spawn(async move {
                    corrector.correct(&request.text, &request.language).await
                });
                (handle, fallback)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, fallback) in handles {
            match handle.await {
                Ok(corrected) => results.push(corrected),
                Err(err) => {
                    warn!("Batch correction task failed: {}", err);
                    results.push(fallback);
                }
            }
        }
        results
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Verify that the required configuration is present. No network call.
    pub fn health_check(&self) -> bool {
        let healthy = !self.config.api_key.trim().is_empty() && !self.config.endpoint.is_empty();
        if !healthy {
            info!("Health check failed: completion credential not configured");
        }
        healthy
    }

    fn cache_key(&self, trimmed: &str, language: &str) -> String {
        format!("{}:{}:{}", self.config.pipeline_version, language, trimmed)
    }
}

/// Estimate the correction cost for a transcript of `word_count` words.
///
/// Pure arithmetic over the fixed fragment size and per-token pricing; each
/// ~8-word fragment costs one completion request (instruction prompt plus
/// fragment plus response).
pub fn estimate_cost(word_count: usize) -> String {
    const WORDS_PER_CHUNK: f64 = 8.0;
    const TOKENS_PER_REQUEST: f64 = 420.0;
    const PRICE_PER_1K_TOKENS: f64 = 0.002;

    let chunks = (word_count as f64 / WORDS_PER_CHUNK).ceil();
    let cost = chunks * TOKENS_PER_REQUEST / 1000.0 * PRICE_PER_1K_TOKENS;
    format!("${cost:.4}")
}
