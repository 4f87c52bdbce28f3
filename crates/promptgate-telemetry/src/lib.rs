//! PromptGate Telemetry
//!
//! Decision auditing and metrics for PromptGate.
//!
//! Provides:
//! - A bounded in-memory audit log of recent decisions (no persistence;
//!   cleared by process restart)
//! - Metric names and recording helpers shared by the transport adapters

pub mod audit;
pub mod metrics;

pub use audit::{AuditLog, AuditRecord, DEFAULT_CAPACITY, DEFAULT_TAIL};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditLog, AuditRecord};
}
