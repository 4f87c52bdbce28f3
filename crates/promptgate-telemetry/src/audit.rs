//! Bounded decision audit log
//!
//! A fixed-capacity, append-only record of the most recent decisions.
//! Created once at startup, lives for the process lifetime, and is the only
//! contended resource in the request path: `append` and `tail` exclude each
//! other via a mutex but never serialize unrelated evaluations.

use std::collections::VecDeque;
use std::time::SystemTime;

use parking_lot::Mutex;
use promptgate_core::{Action, Verdict};
use serde::{Deserialize, Serialize};

/// Default number of records `tail` returns when no count is given
pub const DEFAULT_TAIL: usize = 20;

/// Ring capacity; at or above the maximum tail a query can request
pub const DEFAULT_CAPACITY: usize = 256;

/// One decision, captured immediately after evaluation. Never mutated after
/// insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the decision was made
    pub timestamp: SystemTime,

    /// Caller-supplied user identifier (opaque to the core)
    pub user_id: String,

    /// The prompt as submitted
    pub prompt_in: String,

    /// Terminal action
    pub action: Action,

    /// Why the engine decided as it did
    pub reason: String,
}

impl AuditRecord {
    /// Capture a verdict for the audit trail
    pub fn from_verdict(user_id: impl Into<String>, prompt_in: impl Into<String>, verdict: &Verdict) -> Self {
        Self {
            timestamp: SystemTime::now(),
            user_id: user_id.into(),
            prompt_in: prompt_in.into(),
            action: verdict.action,
            reason: verdict.reason.clone(),
        }
    }
}

/// Fixed-capacity, thread-safe decision history
pub struct AuditLog {
    records: Mutex<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl AuditLog {
    /// Create a log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a log bounded at `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest once at capacity
    pub fn append(&self, record: AuditRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// The up-to-`n` most recent records in chronological order (most
    /// recent last). `n == 0` maps to [`DEFAULT_TAIL`]; an `n` larger than
    /// the stored history returns everything available.
    pub fn tail(&self, n: usize) -> Vec<AuditRecord> {
        let n = if n == 0 { DEFAULT_TAIL } else { n };

        let records = self.records.lock();
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// The fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
