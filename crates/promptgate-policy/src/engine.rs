//! Policy decision engine
//!
//! Turns a prompt into exactly one verdict by applying the checks in strict
//! precedence: length, keyword, semantic, redaction. The ordering is the
//! central contract — a blocked prompt must never leak a partially
//! sanitized variant, so blocking checks run before any text is rewritten.

use std::sync::Arc;

use promptgate_core::Verdict;
use promptgate_filters::SimilarityGuard;
use tracing::debug;

use crate::config::CompiledPolicy;
use crate::store::PolicyStore;

/// The decision engine. Safe to call concurrently; the only shared state is
/// the immutable snapshot reference read per evaluation.
pub struct PolicyEngine {
    store: Arc<PolicyStore>,
    guard: SimilarityGuard,
}

impl PolicyEngine {
    /// Create an engine over the given store and similarity guard
    pub fn new(store: Arc<PolicyStore>, guard: SimilarityGuard) -> Self {
        Self { store, guard }
    }

    /// The policy store backing this engine
    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// Evaluate a prompt against the current policy snapshot.
    ///
    /// Total: every input yields a verdict. Deterministic for a given
    /// snapshot (the semantic check degrades to "no hit" when its oracle is
    /// unavailable, which keeps the remaining checks deterministic).
    pub async fn evaluate(&self, prompt: &str) -> Verdict {
        let snapshot = self.store.current();
        self.evaluate_with(prompt, &snapshot).await
    }

    /// Evaluate a prompt against a pinned snapshot
    pub async fn evaluate_with(&self, prompt: &str, policy: &CompiledPolicy) -> Verdict {
        let config = policy.config();

        // 1. Length. Oversized input must never reach the matchers or the
        //    embedding oracle.
        let length = prompt.chars().count();
        if length > config.max_prompt_chars {
            debug!(length, limit = config.max_prompt_chars, "blocking oversized prompt");
            return Verdict::block(
                prompt,
                format!(
                    "prompt is {} characters, limit is {}",
                    length, config.max_prompt_chars
                ),
            );
        }

        // 2. Keyword blocklist.
        if let Some(term) = policy.blocklist().matches(prompt) {
            debug!(term, "blocking on banned keyword");
            return Verdict::block(prompt, format!("matched banned keyword: {}", term));
        }

        // 3. Semantic similarity, only when the keyword pass found nothing.
        if let Some(hit) = self.guard.check(prompt, &config.semantic_blocking).await {
            debug!(phrase = %hit.phrase, score = hit.score, "blocking on semantic similarity");
            return Verdict::block(
                prompt,
                format!(
                    "semantically similar to banned phrase \"{}\" (score {:.2})",
                    hit.phrase, hit.score
                ),
            );
        }

        // 4. Redaction, only for prompts no blocking check claimed.
        let outcome = policy.redaction().apply(prompt, &config.redaction_rules);
        if outcome.is_redacted() {
            let kinds = outcome
                .applied
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            debug!(kinds = %kinds, "redacting prompt");
            return Verdict::redact(outcome.text, format!("redacted: {}", kinds));
        }

        Verdict::allow(prompt)
    }
}
