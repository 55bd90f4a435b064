//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (fmt layer, filtered by RUST_LOG or config)
//!     → any `metrics` recorder installed by the embedding process
//! ```
//!
//! # Design Decisions
//! - Submission id and tx hash flow through every log line of a submission
//! - Credentials and passphrases are never recorded
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
