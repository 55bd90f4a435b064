//! Metrics collection.
//!
//! # Metrics
//! - `poolstake_key_imports_total` (counter): imports by credential kind, outcome
//! - `poolstake_submissions_total` (counter): submissions by terminal outcome
//! - `poolstake_submission_phase_seconds` (histogram): latency per phase
//! - `poolstake_status_polls_total` (counter): ledger polls by result
//! - `poolstake_rpc_errors_total` (counter): chain RPC failures by operation

/// Record a key import attempt.
pub fn record_import(kind: &'static str, outcome: &'static str) {
    metrics::counter!("poolstake_key_imports_total", "kind" => kind, "outcome" => outcome).increment(1);
}

/// Record the terminal outcome of a submission.
pub fn record_submission(outcome: &'static str) {
    metrics::counter!("poolstake_submissions_total", "outcome" => outcome).increment(1);
}

/// Record how long a submission phase took.
pub fn record_phase_latency(phase: &'static str, seconds: f64) {
    metrics::histogram!("poolstake_submission_phase_seconds", "phase" => phase).record(seconds);
}

/// Record a stake-ledger poll.
pub fn record_poll(result: &'static str) {
    metrics::counter!("poolstake_status_polls_total", "result" => result).increment(1);
}

/// Record a failed chain RPC call.
pub fn record_rpc_error(operation: &'static str) {
    metrics::counter!("poolstake_rpc_errors_total", "operation" => operation).increment(1);
}
