//! Metric names and recording helpers
//!
//! Thin wrappers over the `metrics` facade so both transport adapters emit
//! the same series.

use promptgate_core::Action;

/// Total requests seen, by transport
pub const REQUESTS_TOTAL: &str = "promptgate_requests_total";

/// Decisions taken, by action
pub const DECISIONS_TOTAL: &str = "promptgate_decisions_total";

/// Policy reload attempts, by outcome
pub const RELOADS_TOTAL: &str = "promptgate_policy_reloads_total";

/// End-to-end evaluation latency in microseconds
pub const EVAL_LATENCY_US: &str = "promptgate_eval_latency_us";

/// Register metric descriptions with the installed recorder
pub fn describe() {
    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of requests by transport");
    metrics::describe_counter!(DECISIONS_TOTAL, "Total number of decisions by action");
    metrics::describe_counter!(RELOADS_TOTAL, "Total number of policy reload attempts by outcome");
    metrics::describe_histogram!(
        EVAL_LATENCY_US,
        metrics::Unit::Microseconds,
        "Evaluation latency in microseconds"
    );
}

/// Record one inbound request
pub fn record_request(transport: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "transport" => transport).increment(1);
}

/// Record a decision and its latency
pub fn record_decision(action: Action, latency_us: u64) {
    let label = match action {
        Action::Allow => "allow",
        Action::Redact => "redact",
        Action::Block => "block",
    };
    metrics::counter!(DECISIONS_TOTAL, "action" => label).increment(1);
    metrics::histogram!(EVAL_LATENCY_US).record(latency_us as f64);
}

/// Record a reload attempt
pub fn record_reload(success: bool) {
    let outcome = if success { "ok" } else { "rejected" };
    metrics::counter!(RELOADS_TOTAL, "outcome" => outcome).increment(1);
}
