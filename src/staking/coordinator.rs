//! Transaction submission coordinator.
//!
//! # Flow
//! ```text
//! prepare(identity, intent)      validate, balance check      → PendingSubmission
//! PendingSubmission::confirm(pw) unlock the signer            → ConfirmedSubmission
//! submit(confirmed)              guard → sign → relay → register → SettledSubmission
//! ```
//!
//! Phases run strictly in order. Nothing is retried: a failure ends the
//! attempt and the member starts again from `prepare`.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::api::client::StakeApi;
use crate::api::types::StakeMethod;
use crate::blockchain::transaction::TransferSigner;
use crate::api::error::ApiError;
use crate::blockchain::types::{address_hex, is_tx_hash, normalize_hex};
use crate::config::PoolstakeConfig;
use crate::observability::metrics;
use crate::staking::error::{SubmissionError, SubmissionFailure};
use crate::staking::guard::InFlightSet;
use crate::staking::intent::{IntentError, TransferIntent};
use crate::staking::state::{SubmissionEvent, SubmissionState};
use crate::wallet::identity::SigningIdentity;

/// Fixed inputs for every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// The only destination stake transfers may use.
    pub pool_address: Address,
    pub memo_max_len: usize,
    /// Account the stake ledger records transfers against.
    pub customer_id: u64,
}

impl CoordinatorConfig {
    /// Build from validated configuration. Returns `None` without a customer id.
    pub fn from_config(config: &PoolstakeConfig) -> Option<Self> {
        let pool_address = config.pool.receiving_address.parse().ok()?;
        Some(Self {
            pool_address,
            memo_max_len: config.pool.memo_max_len,
            customer_id: config.account.customer_id?,
        })
    }
}

/// Drives submissions through sign, relay and register.
pub struct Coordinator<A, S> {
    api: A,
    signer: S,
    config: CoordinatorConfig,
    in_flight: InFlightSet,
}

/// An accepted intent waiting for the member to confirm.
pub struct PendingSubmission {
    submission_id: Uuid,
    identity: Arc<SigningIdentity>,
    intent: TransferIntent,
    state: SubmissionState,
}

/// A confirmed submission holding an unlocked signer.
pub struct ConfirmedSubmission {
    submission_id: Uuid,
    intent: TransferIntent,
    key: PrivateKeySigner,
    state: SubmissionState,
}

/// A submission the stake ledger has recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledSubmission {
    pub submission_id: Uuid,
    pub tx_hash: String,
    pub trail: Vec<SubmissionState>,
}

impl PendingSubmission {
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn intent(&self) -> &TransferIntent {
        &self.intent
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Whether confirming needs the session passphrase.
    pub fn requires_passphrase(&self) -> bool {
        self.identity.requires_passphrase()
    }

    /// Confirm the send, consuming the pending submission.
    ///
    /// Raw-key identities need the session passphrase. A wrong one hands the
    /// submission back inside [`ConfirmRejected`] so the member can retry.
    pub fn confirm(self, passphrase: Option<&str>) -> Result<ConfirmedSubmission, ConfirmRejected> {
        match self.identity.unlock(passphrase) {
            Ok(key) => Ok(ConfirmedSubmission {
                submission_id: self.submission_id,
                intent: self.intent,
                key,
                state: self.state,
            }),
            Err(e) => {
                tracing::warn!(submission_id = %self.submission_id, reason = %e.reason, "Confirmation rejected");
                Err(ConfirmRejected {
                    pending: self,
                    error: SubmissionError::Confirmation(e),
                })
            }
        }
    }
}

/// A refused confirmation. The submission is still awaiting confirmation.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ConfirmRejected {
    pub pending: PendingSubmission,
    pub error: SubmissionError,
}

impl ConfirmedSubmission {
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn intent(&self) -> &TransferIntent {
        &self.intent
    }
}

impl fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("submission_id", &self.submission_id)
            .field("intent", &self.intent)
            .field("state", &self.state)
            .finish()
    }
}

impl fmt::Debug for ConfirmedSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmedSubmission")
            .field("submission_id", &self.submission_id)
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

/// States one submission has passed through.
struct Attempt {
    submission_id: Uuid,
    state: SubmissionState,
    trail: Vec<SubmissionState>,
}

impl Attempt {
    fn resume(submission_id: Uuid, state: SubmissionState) -> Self {
        Self {
            submission_id,
            trail: vec![SubmissionState::Idle, state.clone()],
            state,
        }
    }

    fn apply(&mut self, event: SubmissionEvent) -> Result<(), SubmissionError> {
        let next = self.state.transition(event)?;
        tracing::debug!(
            submission_id = %self.submission_id,
            from = self.state.name(),
            to = next.name(),
            "Submission state changed"
        );
        self.trail.push(next.clone());
        self.state = next;
        Ok(())
    }

    fn fail(mut self, error: SubmissionError) -> SubmissionFailure {
        if self.state.is_in_flight() {
            if let Ok(next) = self.state.transition(SubmissionEvent::Failed {
                reason: error.to_string(),
            }) {
                self.trail.push(next.clone());
                self.state = next;
            }
        }
        metrics::record_submission(error.outcome());
        SubmissionFailure {
            submission_id: self.submission_id,
            state: self.state,
            trail: self.trail,
            error,
        }
    }
}

impl<A: StakeApi, S: TransferSigner> Coordinator<A, S> {
    pub fn new(api: A, signer: S, config: CoordinatorConfig) -> Self {
        Self {
            api,
            signer,
            config,
            in_flight: InFlightSet::new(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Whether a submission for `intent` is signing, relaying or registering.
    pub fn is_in_flight(&self, intent: &TransferIntent) -> bool {
        self.in_flight.contains(intent)
    }

    /// Build an intent from the identity to the pool.
    pub fn intent_for(&self, identity: &SigningIdentity, amount_micro: u64, memo: impl Into<String>) -> TransferIntent {
        TransferIntent::to_pool(identity.address(), self.config.pool_address, amount_micro, memo)
    }

    /// Validate `intent` and move it to awaiting confirmation.
    ///
    /// The balance check is advisory: the balance may change before signing.
    pub async fn prepare(
        &self,
        identity: Arc<SigningIdentity>,
        intent: TransferIntent,
    ) -> Result<PendingSubmission, SubmissionError> {
        if intent.from != identity.address() {
            return Err(IntentError::IdentityMismatch {
                intent: intent.from,
                identity: identity.address(),
            }
            .into());
        }
        intent.validate(self.config.pool_address, self.config.memo_max_len)?;

        let available = self
            .api
            .wallet_balance(&address_hex(&intent.from))
            .await
            .map_err(SubmissionError::BalanceLookup)?;
        if available < intent.amount_micro {
            return Err(SubmissionError::InsufficientBalance {
                needed: intent.amount_micro,
                available,
            });
        }

        let submission_id = Uuid::new_v4();
        let state = SubmissionState::Idle.transition(SubmissionEvent::IntentAccepted)?;
        tracing::info!(
            submission_id = %submission_id,
            from = %address_hex(&intent.from),
            amount_micro = intent.amount_micro,
            "Stake transfer awaiting confirmation"
        );

        Ok(PendingSubmission {
            submission_id,
            identity,
            intent,
            state,
        })
    }

    /// Sign, relay and register a confirmed submission.
    ///
    /// Refused with `AlreadyInFlight` while an identical intent is still being
    /// processed. Registration is only attempted after relay returns a hash.
    pub async fn submit(&self, confirmed: ConfirmedSubmission) -> Result<SettledSubmission, SubmissionFailure> {
        let ConfirmedSubmission {
            submission_id,
            intent,
            key,
            state,
        } = confirmed;
        let mut attempt = Attempt::resume(submission_id, state);

        let Some(_guard) = self.in_flight.try_acquire(&intent, submission_id) else {
            tracing::warn!(submission_id = %submission_id, "Identical submission already in flight");
            return Err(attempt.fail(SubmissionError::AlreadyInFlight));
        };

        if let Err(e) = attempt.apply(SubmissionEvent::Confirmed) {
            return Err(attempt.fail(e));
        }

        let started = Instant::now();
        let signed = match self.signer.build_and_sign(&key, &intent).await {
            Ok(signed) => signed,
            Err(e) => {
                tracing::warn!(submission_id = %submission_id, error = %e, "Signing failed");
                return Err(attempt.fail(SubmissionError::Signing(e.to_string())));
            }
        };
        metrics::record_phase_latency("signing", started.elapsed().as_secs_f64());
        if let Err(e) = attempt.apply(SubmissionEvent::Signed) {
            return Err(attempt.fail(e));
        }

        let started = Instant::now();
        let tx_hash = match self.api.submit_tx(&signed.payload_hex()).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                tracing::warn!(submission_id = %submission_id, error = %e, "Relay failed");
                return Err(attempt.fail(SubmissionError::Relay(e)));
            }
        };
        metrics::record_phase_latency("relaying", started.elapsed().as_secs_f64());
        if !is_tx_hash(&tx_hash) {
            tracing::warn!(submission_id = %submission_id, relayed = %tx_hash, "Relay returned no usable hash");
            let error = ApiError::Decode(format!("relay returned an invalid transaction hash '{}'", tx_hash));
            return Err(attempt.fail(SubmissionError::Relay(error)));
        }
        if normalize_hex(&tx_hash) != normalize_hex(signed.tx_hash()) {
            tracing::warn!(
                submission_id = %submission_id,
                relayed = %tx_hash,
                signed = %signed.tx_hash(),
                "Relay returned a different hash than the signer computed"
            );
        }
        tracing::info!(submission_id = %submission_id, tx_hash = %tx_hash, "Transaction relayed");
        if let Err(e) = attempt.apply(SubmissionEvent::Relayed { tx_hash: tx_hash.clone() }) {
            return Err(attempt.fail(e));
        }

        let started = Instant::now();
        if let Err(e) = self
            .api
            .register_stake_tx(self.config.customer_id, &tx_hash, StakeMethod::WalletIntegration)
            .await
        {
            tracing::error!(
                submission_id = %submission_id,
                tx_hash = %tx_hash,
                error = %e,
                "Transfer relayed but stake registration failed"
            );
            return Err(attempt.fail(SubmissionError::Registration { tx_hash, source: e }));
        }
        metrics::record_phase_latency("registering", started.elapsed().as_secs_f64());
        if let Err(e) = attempt.apply(SubmissionEvent::Registered) {
            return Err(attempt.fail(e));
        }

        metrics::record_submission("settled");
        tracing::info!(submission_id = %submission_id, tx_hash = %tx_hash, "Stake transfer settled");
        Ok(SettledSubmission {
            submission_id,
            tx_hash,
            trail: attempt.trail,
        })
    }

    /// Register a hash the member entered by hand.
    pub async fn register_manual(&self, tx_hash: &str) -> Result<(), SubmissionError> {
        register_manual(&self.api, self.config.customer_id, tx_hash).await
    }
}

/// Register a manually entered transaction hash with the stake ledger.
pub async fn register_manual<A: StakeApi>(api: &A, customer_id: u64, tx_hash: &str) -> Result<(), SubmissionError> {
    let tx_hash = tx_hash.trim();
    if !is_tx_hash(tx_hash) {
        return Err(SubmissionError::InvalidHash(tx_hash.to_string()));
    }

    api.register_stake_tx(customer_id, tx_hash, StakeMethod::TransactionHashEntry)
        .await
        .map_err(SubmissionError::Ledger)?;
    tracing::info!(tx_hash = %tx_hash, customer_id, "Transaction hash registered");
    Ok(())
}
