//! PII redaction pipeline
//!
//! Each redactor kind masks one category of sensitive data with a sentinel
//! token unique to that kind. Kinds run in a fixed order over the cumulative
//! output of the previous step, so later patterns see already-masked spans
//! and the pipeline is a fixed point on its own output.

use promptgate_core::RedactorKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-kind enable toggles, parsed from the policy document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionRules {
    /// Mask email addresses
    #[serde(default)]
    pub redact_emails: bool,

    /// Mask phone numbers (e.g. 123-456-7890)
    #[serde(default)]
    pub redact_phone_numbers: bool,

    /// Mask SECRET{...} tokens
    #[serde(default)]
    pub redact_secrets: bool,

    /// Mask card numbers (13-16 digits)
    #[serde(default)]
    pub redact_credit_cards: bool,
}

impl RedactionRules {
    /// Whether the given kind is enabled
    pub fn is_enabled(&self, kind: RedactorKind) -> bool {
        match kind {
            RedactorKind::Email => self.redact_emails,
            RedactorKind::Phone => self.redact_phone_numbers,
            RedactorKind::Secret => self.redact_secrets,
            RedactorKind::Card => self.redact_credit_cards,
        }
    }

    /// Rules with every kind enabled
    pub fn all_enabled() -> Self {
        Self {
            redact_emails: true,
            redact_phone_numbers: true,
            redact_secrets: true,
            redact_credit_cards: true,
        }
    }
}

/// A single pattern-based redactor
struct Redactor {
    kind: RedactorKind,
    pattern: Regex,
}

impl Redactor {
    fn new(kind: RedactorKind) -> Result<Self, regex::Error> {
        let pattern = Regex::new(Self::pattern_for(kind))?;
        Ok(Self { kind, pattern })
    }

    fn pattern_for(kind: RedactorKind) -> &'static str {
        match kind {
            RedactorKind::Email => r"[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9-.]+",
            RedactorKind::Phone => r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b",
            RedactorKind::Secret => r"SECRET\{[^}]*\}",
            RedactorKind::Card => r"\b(?:\d[ -]*?){13,16}\b",
        }
    }

    /// Replace every non-overlapping match with this kind's sentinel.
    ///
    /// Masking can splice previously separated spans into a fresh match
    /// (e.g. `a@b.com@c.de` leaves `<EMAIL>@c.de` after one pass), so
    /// iterate until the text is a fixed point. Sentinels never match their
    /// own pattern, and every pass strictly consumes the characters the
    /// pattern requires, so the loop terminates.
    fn redact(&self, text: &str) -> String {
        const MAX_PASSES: usize = 16;

        let mut current = text.to_string();
        for _ in 0..MAX_PASSES {
            let next = self
                .pattern
                .replace_all(&current, self.kind.sentinel())
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// Result of a pipeline pass
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    /// The (possibly sanitized) text
    pub text: String,

    /// Kinds that fired, in pipeline order; empty means `text` is unchanged
    pub applied: Vec<RedactorKind>,
}

impl RedactionOutcome {
    /// Whether any redactor fired
    pub fn is_redacted(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Ordered set of independent pattern-based redactors
pub struct RedactionPipeline {
    redactors: Vec<Redactor>,
}

impl RedactionPipeline {
    /// Compile all redactor kinds.
    ///
    /// A kind whose pattern fails to compile is dropped with a warning and
    /// behaves as "no match" rather than aborting the pipeline.
    pub fn new() -> Self {
        let mut redactors = Vec::with_capacity(RedactorKind::ALL.len());
        for kind in RedactorKind::ALL {
            match Redactor::new(kind) {
                Ok(redactor) => redactors.push(redactor),
                Err(e) => warn!(kind = %kind, "dropping redactor with invalid pattern: {}", e),
            }
        }
        Self { redactors }
    }

    /// Run every enabled redactor in order over the cumulative output of the
    /// previous step. Returns the sanitized text and the kinds that fired.
    pub fn apply(&self, text: &str, rules: &RedactionRules) -> RedactionOutcome {
        let mut current = text.to_string();
        let mut applied = Vec::new();

        for redactor in &self.redactors {
            if !rules.is_enabled(redactor.kind) {
                continue;
            }

            let next = redactor.redact(&current);
            if next != current {
                applied.push(redactor.kind);
                current = next;
            }
        }

        RedactionOutcome {
            text: current,
            applied,
        }
    }
}

impl Default for RedactionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pipeline() -> RedactionPipeline {
        RedactionPipeline::new()
    }

    #[test]
    fn test_email_redaction() {
        let out = pipeline().apply(
            "Contact me at elon@tesla.com please.",
            &RedactionRules::all_enabled(),
        );
        assert_eq!(out.text, "Contact me at <EMAIL> please.");
        assert_eq!(out.applied, vec![RedactorKind::Email]);
    }

    #[test]
    fn test_phone_redaction() {
        let out = pipeline().apply("call 555-123-4567 now", &RedactionRules::all_enabled());
        assert_eq!(out.text, "call <PHONE> now");
        assert_eq!(out.applied, vec![RedactorKind::Phone]);
    }

    #[test]
    fn test_secret_redaction() {
        let out = pipeline().apply(
            "my api key is SECRET{1234567890}",
            &RedactionRules::all_enabled(),
        );
        assert_eq!(out.text, "my api key is <SECRET>");
        assert_eq!(out.applied, vec![RedactorKind::Secret]);
    }

    #[test]
    fn test_card_redaction() {
        let out = pipeline().apply(
            "card: 4111 1111 1111 1111",
            &RedactionRules::all_enabled(),
        );
        assert!(out.text.contains("<CARD>"));
        assert_eq!(out.applied, vec![RedactorKind::Card]);
    }

    #[test]
    fn test_multiple_kinds_fire_in_order() {
        let out = pipeline().apply(
            "mail a@b.com, key SECRET{x}",
            &RedactionRules::all_enabled(),
        );
        assert_eq!(out.text, "mail <EMAIL>, key <SECRET>");
        assert_eq!(out.applied, vec![RedactorKind::Email, RedactorKind::Secret]);
    }

    #[test]
    fn test_clean_text_untouched() {
        let out = pipeline().apply("nothing sensitive here", &RedactionRules::all_enabled());
        assert_eq!(out.text, "nothing sensitive here");
        assert!(out.applied.is_empty());
        assert!(!out.is_redacted());
    }

    #[test]
    fn test_disabled_kind_does_not_fire() {
        let rules = RedactionRules {
            redact_emails: false,
            ..RedactionRules::all_enabled()
        };
        let out = pipeline().apply("mail a@b.com", &rules);
        assert_eq!(out.text, "mail a@b.com");
        assert!(out.applied.is_empty());
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let p = pipeline();
        let rules = RedactionRules::all_enabled();
        let first = p.apply(
            "a@b.com and 555-123-4567 and SECRET{k} and 4111 1111 1111 1111",
            &rules,
        );
        let second = p.apply(&first.text, &rules);
        assert_eq!(second.text, first.text);
        assert!(second.applied.is_empty());
    }

    proptest! {
        // Redaction is a fixed point: a second pass over sanitized output
        // never changes it.
        #[test]
        fn prop_redaction_idempotent(input in ".{0,200}") {
            let p = pipeline();
            let rules = RedactionRules::all_enabled();
            let once = p.apply(&input, &rules);
            let twice = p.apply(&once.text, &rules);
            prop_assert_eq!(&twice.text, &once.text);
            prop_assert!(twice.applied.is_empty());
        }
    }
}
