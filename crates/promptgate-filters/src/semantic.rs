//! Semantic similarity guard
//!
//! Compares the input prompt against a configured set of banned concept
//! phrases via a pluggable embedding oracle. The oracle is a capability:
//! when it is absent, disabled, erroring, or slow, the guard degrades to
//! "no hit" so keyword and redaction coverage keep working.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use promptgate_core::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default bound on a single oracle interaction
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Pluggable text-embedding capability
#[async_trait]
pub trait EmbeddingOracle: Send + Sync {
    /// Embed the given text into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Oracle name for logging
    fn name(&self) -> &str;
}

/// Semantic blocking configuration, parsed from the policy document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Whether semantic blocking is active
    #[serde(default)]
    pub enabled: bool,

    /// Similarity threshold in [0, 1]; scores at or above it block
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Banned concept phrases, in priority order
    #[serde(default)]
    pub banned_phrases: Vec<String>,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_threshold(),
            banned_phrases: Vec::new(),
        }
    }
}

fn default_threshold() -> f64 {
    0.6
}

/// A banned phrase the input scored against
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    /// The matched concept phrase
    pub phrase: String,

    /// Similarity score in [0, 1]
    pub score: f64,
}

/// Cosine similarity of two vectors, mapped into [0, 1].
///
/// Zero-length or mismatched vectors score 0; negative cosine clamps to 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

/// Optional capability wrapping the embedding oracle
#[derive(Clone)]
pub struct SimilarityGuard {
    oracle: Option<Arc<dyn EmbeddingOracle>>,
    timeout: Duration,
}

impl SimilarityGuard {
    /// Guard with no oracle: every check returns no hit
    pub fn disabled() -> Self {
        Self {
            oracle: None,
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Guard backed by the given oracle
    pub fn with_oracle(oracle: Arc<dyn EmbeddingOracle>) -> Self {
        Self {
            oracle: Some(oracle),
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Override the per-check oracle timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether an oracle is wired in
    pub fn is_available(&self) -> bool {
        self.oracle.is_some()
    }

    /// Score the input against every banned phrase and report the best one
    /// iff its score reaches the threshold. Ties go to the phrase earliest
    /// in configuration order.
    ///
    /// Returns `None` when semantic blocking is disabled, the oracle is
    /// absent, the oracle errors, or the check exceeds the timeout.
    pub async fn check(&self, text: &str, config: &SemanticConfig) -> Option<SemanticHit> {
        if !config.enabled || config.banned_phrases.is_empty() {
            return None;
        }

        let oracle = self.oracle.as_ref()?;

        let scored = tokio::time::timeout(
            self.timeout,
            best_match(oracle.as_ref(), text, &config.banned_phrases),
        )
        .await;

        match scored {
            Ok(Ok(Some(hit))) if hit.score >= config.threshold => {
                debug!(
                    phrase = %hit.phrase,
                    score = hit.score,
                    threshold = config.threshold,
                    "semantic hit"
                );
                Some(hit)
            }
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(oracle = oracle.name(), "embedding oracle failed, degrading: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    oracle = oracle.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "embedding oracle timed out, degrading"
                );
                None
            }
        }
    }
}

/// Embed the input once, then score it against every phrase.
async fn best_match(
    oracle: &dyn EmbeddingOracle,
    text: &str,
    phrases: &[String],
) -> Result<Option<SemanticHit>> {
    let input = oracle.embed(text).await?;

    let mut best: Option<SemanticHit> = None;
    for phrase in phrases {
        let candidate = oracle.embed(phrase).await?;
        let score = cosine_similarity(&input, &candidate);

        // Strict > keeps the earliest phrase on ties.
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(SemanticHit {
                phrase: phrase.clone(),
                score,
            });
        }
    }

    Ok(best)
}
