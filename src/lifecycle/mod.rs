//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Trigger → every subscribed background loop exits
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Only status polling is cancellable; an in-flight submission runs to its
//!   terminal state even after Ctrl-C

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
