//! Core types for PromptGate

use serde::{Deserialize, Serialize};

/// Terminal action for an evaluated prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Prompt passes through untouched
    Allow,
    /// Prompt passes through with sensitive spans masked
    Redact,
    /// Prompt must not reach the downstream model
    Block,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Redact => write!(f, "redact"),
            Self::Block => write!(f, "block"),
        }
    }
}

impl Action {
    /// Parse an action from its wire form (case-insensitive)
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "redact" => Some(Self::Redact),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// The engine's decision for a single prompt.
///
/// Invariants upheld by the constructors:
/// - `Block` carries the original prompt, never a partially sanitized one.
/// - `Redact` carries text with every enabled pattern masked.
/// - `Allow` carries the original prompt and an empty reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Terminal action
    pub action: Action,

    /// The prompt as it may propagate downstream
    pub prompt_out: String,

    /// Human-readable explanation of the decision
    pub reason: String,
}

impl Verdict {
    /// Prompt is safe as-is
    pub fn allow(prompt: impl Into<String>) -> Self {
        Self {
            action: Action::Allow,
            prompt_out: prompt.into(),
            reason: String::new(),
        }
    }

    /// Prompt passes with sensitive content masked
    pub fn redact(sanitized: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Redact,
            prompt_out: sanitized.into(),
            reason: reason.into(),
        }
    }

    /// Prompt must not propagate; carries the original text unmodified
    pub fn block(original: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Block,
            prompt_out: original.into(),
            reason: reason.into(),
        }
    }

    /// Whether the prompt may continue downstream (possibly sanitized)
    pub fn is_passed(&self) -> bool {
        !matches!(self.action, Action::Block)
    }
}

/// One category of sensitive data a redactor can mask.
///
/// A closed set rather than a dynamic registry so every kind is handled
/// exhaustively at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactorKind {
    Email,
    Phone,
    Secret,
    Card,
}

impl RedactorKind {
    /// All kinds in pipeline execution order
    pub const ALL: [RedactorKind; 4] = [Self::Email, Self::Phone, Self::Secret, Self::Card];

    /// The sentinel token this kind substitutes for matched spans
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::Email => "<EMAIL>",
            Self::Phone => "<PHONE>",
            Self::Secret => "<SECRET>",
            Self::Card => "<CARD>",
        }
    }
}

impl std::fmt::Display for RedactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
            Self::Secret => write!(f, "secret"),
            Self::Card => write!(f, "card"),
        }
    }
}
