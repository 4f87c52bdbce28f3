//! Application state shared across all requests

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;
use promptgate_core::Verdict;
use promptgate_policy::PolicyEngine;
use promptgate_telemetry::{audit::AuditRecord, metrics as gate_metrics, AuditLog};
use tracing::info;

/// Shared state for both transport adapters
#[derive(Clone)]
pub struct AppState {
    /// The decision engine (holds the reloadable policy store)
    pub engine: Arc<PolicyEngine>,

    /// Bounded decision history
    pub audit: Arc<AuditLog>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Assemble the state both adapters share
    pub fn new(engine: Arc<PolicyEngine>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            engine,
            audit: Arc::new(AuditLog::new()),
            metrics_handle,
        }
    }

    /// Evaluate one prompt and record the transaction.
    ///
    /// This is the single entry point for both adapters, so HTTP and TCP
    /// share identical decision, metrics, and audit semantics.
    pub async fn decide(&self, transport: &'static str, user_id: &str, prompt: &str) -> Verdict {
        gate_metrics::record_request(transport);

        let start = Instant::now();
        let verdict = self.engine.evaluate(prompt).await;
        gate_metrics::record_decision(verdict.action, start.elapsed().as_micros() as u64);

        self.audit
            .append(AuditRecord::from_verdict(user_id, prompt, &verdict));

        info!(
            transport,
            user_id,
            action = %verdict.action,
            "decision recorded"
        );

        verdict
    }

    /// Re-read the policy document and swap it in if valid
    pub fn reload_policy(&self) -> promptgate_core::Result<()> {
        let result = self.engine.store().reload();
        gate_metrics::record_reload(result.is_ok());
        result
    }
}
