use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::staking::intent::{format_token_amount, IntentError};
use crate::staking::state::{InvalidTransition, SubmissionState};
use crate::wallet::error::ImportError;

/// Why a stake submission stopped.
///
/// Messages from the signer and the backend are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    InvalidIntent(#[from] IntentError),

    #[error(
        "insufficient balance: {} available, {} needed",
        format_token_amount(*.available),
        format_token_amount(*.needed)
    )]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("could not check wallet balance: {0}")]
    BalanceLookup(ApiError),

    #[error("a submission for this transfer is already in progress")]
    AlreadyInFlight,

    #[error("confirmation failed: {0}")]
    Confirmation(ImportError),

    #[error("{0}")]
    Signing(String),

    #[error("{0}")]
    Relay(ApiError),

    /// The transfer is on-chain but the stake ledger does not know about it.
    #[error(
        "your transfer succeeded on-chain but we could not record it ({source}); \
         do not resend, contact support with transaction hash {tx_hash}"
    )]
    Registration { tx_hash: String, source: ApiError },

    /// A manually entered hash was refused by the ledger.
    #[error("could not register transaction hash: {0}")]
    Ledger(ApiError),

    #[error("'{0}' is not a transaction hash")]
    InvalidHash(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl SubmissionError {
    /// Metrics label for the outcome this error represents.
    pub fn outcome(&self) -> &'static str {
        match self {
            SubmissionError::InvalidIntent(_) | SubmissionError::InvalidHash(_) => "invalid_input",
            SubmissionError::InsufficientBalance { .. } => "insufficient_balance",
            SubmissionError::BalanceLookup(_) => "balance_lookup_failed",
            SubmissionError::AlreadyInFlight => "already_in_flight",
            SubmissionError::Confirmation(_) => "confirmation_failed",
            SubmissionError::Signing(_) => "signing_failed",
            SubmissionError::Relay(_) => "relay_failed",
            SubmissionError::Registration { .. } => "registration_failed",
            SubmissionError::Ledger(_) => "ledger_rejected",
            SubmissionError::InvalidTransition(_) => "internal",
        }
    }

    /// True when value may have moved on-chain without being recorded.
    pub fn needs_support(&self) -> bool {
        matches!(self, SubmissionError::Registration { .. })
    }
}

/// A submission that ended before settling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFailure {
    pub submission_id: Uuid,
    /// Last state reached; `Failed` when an in-flight phase failed.
    pub state: SubmissionState,
    /// Every state the submission passed through, in order.
    pub trail: Vec<SubmissionState>,
    pub error: SubmissionError,
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for SubmissionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
