//! Post-submission status reconciliation.
//!
//! After registration the stake ledger is polled at a fixed interval until
//! the transaction is verified or failed. Polling ends early on shutdown or
//! sign-out and never outlives either.

pub mod poller;
pub mod status;

pub use poller::{ReconcileOutcome, StatusReconciler};
pub use status::LedgerStatus;
