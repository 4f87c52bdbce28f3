//! PromptGate Filters
//!
//! The matchers the decision engine composes:
//! - Pattern-based PII redactors with per-kind sentinels
//! - Case-insensitive keyword blocklist (Aho-Corasick)
//! - Semantic similarity guard over a pluggable embedding oracle
//!
//! All matchers are pure with respect to the text they inspect; only the
//! similarity guard performs async work, and it degrades to "no hit" when
//! its oracle capability is missing or slow.

pub mod keywords;
pub mod redact;
pub mod semantic;

pub use keywords::KeywordBlocklist;
pub use redact::{RedactionOutcome, RedactionPipeline, RedactionRules};
pub use semantic::{
    cosine_similarity, EmbeddingOracle, SemanticConfig, SemanticHit, SimilarityGuard,
    DEFAULT_ORACLE_TIMEOUT,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::keywords::KeywordBlocklist;
    pub use crate::redact::{RedactionOutcome, RedactionPipeline, RedactionRules};
    pub use crate::semantic::{EmbeddingOracle, SemanticConfig, SemanticHit, SimilarityGuard};
}
