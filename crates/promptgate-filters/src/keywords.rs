//! Keyword blocklist matcher
//!
//! Case-insensitive unanchored substring matching against the configured
//! banned-term set, built on an Aho-Corasick automaton so a single scan
//! covers every term. Note this deliberately matches inside words
//! ("killer" matches a banned "kill").

use aho_corasick::AhoCorasick;
use promptgate_core::{Error, Result};

/// Compiled banned-term matcher
pub struct KeywordBlocklist {
    automaton: Option<AhoCorasick>,
    terms: Vec<String>,
}

impl KeywordBlocklist {
    /// Build a blocklist from the configured terms, preserving their order
    pub fn new(terms: &[String]) -> Result<Self> {
        let automaton = if terms.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(terms)
                    .map_err(|e| Error::filter(format!("failed to build keyword matcher: {}", e)))?,
            )
        };

        Ok(Self {
            automaton,
            terms: terms.to_vec(),
        })
    }

    /// Return the matched banned term, if any.
    ///
    /// When several terms occur, the one earliest in configuration order is
    /// reported regardless of where it appears in the text.
    pub fn matches(&self, text: &str) -> Option<&str> {
        let automaton = self.automaton.as_ref()?;

        let mut best: Option<usize> = None;
        for mat in automaton.find_overlapping_iter(text) {
            let idx = mat.pattern().as_usize();
            if best.map_or(true, |b| idx < b) {
                best = Some(idx);
                if idx == 0 {
                    break;
                }
            }
        }

        best.map(|idx| self.terms[idx].as_str())
    }

    /// Number of configured terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no terms are configured
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
