//! Stake submission subsystem.
//!
//! # Data Flow
//! ```text
//! TransferIntent
//!     → intent.rs (amount, destination, memo rules)
//!     → coordinator.rs prepare (balance check) → confirm (unlock signer)
//!     → coordinator.rs submit, holding a guard.rs entry for the intent
//!         sign (blockchain::TransferSigner)
//!         relay (POST /user/submit-tx)
//!         register (POST /stake/transaction)
//!     → SettledSubmission | SubmissionFailure
//! ```
//!
//! Every step is a transition in state.rs; an illegal ordering is an error,
//! not a silent skip.

pub mod coordinator;
pub mod error;
pub mod guard;
pub mod intent;
pub mod state;

pub use coordinator::{register_manual, ConfirmRejected, ConfirmedSubmission, Coordinator, CoordinatorConfig, PendingSubmission, SettledSubmission};
pub use error::{SubmissionError, SubmissionFailure};
pub use guard::{InFlightGuard, InFlightSet};
pub use intent::{format_token_amount, parse_token_amount, IntentError, TransferIntent, MICRO_UNITS_PER_TOKEN};
pub use state::{InvalidTransition, SubmissionEvent, SubmissionPhase, SubmissionState};
