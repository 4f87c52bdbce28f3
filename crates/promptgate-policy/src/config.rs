//! Policy configuration: parsing, validation, compilation
//!
//! A policy document is declarative YAML (JSON parses too). Parsing and
//! validation happen together: a `PolicyConfig` that exists is a valid one,
//! and it is never mutated afterwards — reload builds a new instance.

use promptgate_core::{Error, Result};
use promptgate_filters::{KeywordBlocklist, RedactionPipeline, RedactionRules, SemanticConfig};
use serde::{Deserialize, Serialize};

/// Validated, immutable policy snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Terms that block a prompt outright (substring, case-insensitive)
    pub banned_keywords: Vec<String>,

    /// Prompts longer than this (in characters) are blocked unseen
    pub max_prompt_chars: usize,

    /// Per-kind redaction toggles
    #[serde(default)]
    pub redaction_rules: RedactionRules,

    /// Semantic blocking configuration
    #[serde(default)]
    pub semantic_blocking: SemanticConfig,
}

impl PolicyConfig {
    /// Parse and validate a policy document
    pub fn from_yaml(document: &str) -> Result<Self> {
        let config: PolicyConfig = serde_yaml::from_str(document)
            .map_err(|e| Error::config(format!("failed to parse policy document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a policy document from a file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read policy file {:?}: {}", path, e))
        })?;
        Self::from_yaml(&content)
    }

    /// Reject documents a correct engine cannot run under
    fn validate(&self) -> Result<()> {
        if self.max_prompt_chars == 0 {
            return Err(Error::config("max_prompt_chars must be greater than zero"));
        }

        let threshold = self.semantic_blocking.threshold;
        if !(0.0..=1.0).contains(&threshold) || threshold.is_nan() {
            return Err(Error::config(format!(
                "semantic_blocking.threshold must be in [0, 1], got {}",
                threshold
            )));
        }

        if self.semantic_blocking.enabled && self.semantic_blocking.banned_phrases.is_empty() {
            return Err(Error::config(
                "semantic_blocking.enabled requires at least one banned phrase",
            ));
        }

        Ok(())
    }

    /// Build the compiled matchers for this snapshot
    pub fn compile(self) -> Result<CompiledPolicy> {
        let blocklist = KeywordBlocklist::new(&self.banned_keywords)?;
        Ok(CompiledPolicy {
            blocklist,
            redaction: RedactionPipeline::new(),
            config: self,
        })
    }
}

/// A policy snapshot plus its compiled matchers.
///
/// Built once per (re)load and shared behind an `Arc`; evaluations hold a
/// clone of that `Arc` for their whole run, so a concurrent reload never
/// changes the rules mid-decision.
pub struct CompiledPolicy {
    config: PolicyConfig,
    blocklist: KeywordBlocklist,
    redaction: RedactionPipeline,
}

impl CompiledPolicy {
    /// The validated configuration
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// The compiled banned-keyword matcher
    pub fn blocklist(&self) -> &KeywordBlocklist {
        &self.blocklist
    }

    /// The redaction pipeline
    pub fn redaction(&self) -> &RedactionPipeline {
        &self.redaction
    }
}
