//! Fixed-interval status polling.

use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::api::client::StakeApi;
use crate::api::error::{ApiError, ApiResult};
use crate::blockchain::types::normalize_hex;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::reconcile::status::LedgerStatus;
use crate::session::AuthSession;

/// Why polling stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The ledger reached a terminal status.
    Settled(LedgerStatus),
    /// The view was torn down.
    Cancelled,
    /// The access token went away.
    Deauthenticated,
}

/// Polls the stake ledger until a transaction settles.
pub struct StatusReconciler<A> {
    api: A,
    auth: AuthSession,
    customer_id: u64,
    interval: Duration,
}

impl<A: StakeApi> StatusReconciler<A> {
    pub fn new(api: A, auth: AuthSession, customer_id: u64, interval: Duration) -> Self {
        Self {
            api,
            auth,
            customer_id,
            interval,
        }
    }

    /// Fetch the ledger once. `None` while the hash is not listed yet.
    pub async fn poll_once(&self, tx_hash: &str) -> ApiResult<Option<LedgerStatus>> {
        let wanted = normalize_hex(tx_hash);
        let rows = self.api.stake_transactions(self.customer_id).await?;
        Ok(rows
            .iter()
            .find(|row| normalize_hex(&row.network_txn_id) == wanted)
            .map(|row| LedgerStatus::from_description(&row.verification_desc)))
    }

    /// Poll every interval until the transaction settles, `shutdown` fires or
    /// the session signs out. The first poll runs immediately.
    ///
    /// A failed poll is logged and the loop keeps its interval.
    pub async fn run(&self, tx_hash: &str, mut shutdown: ShutdownSignal) -> ReconcileOutcome {
        let mut auth_rx = self.auth.subscribe();
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tx_hash = %tx_hash,
            interval_secs = self.interval.as_secs(),
            "Status polling starting"
        );

        let outcome = loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break ReconcileOutcome::Cancelled,
                changed = auth_rx.changed() => {
                    if changed.is_err() || auth_rx.borrow().is_none() {
                        break ReconcileOutcome::Deauthenticated;
                    }
                }
                _ = ticker.tick() => {
                    if !self.auth.is_authenticated() {
                        break ReconcileOutcome::Deauthenticated;
                    }
                    let polled = tokio::select! {
                        biased;
                        _ = shutdown.recv() => break ReconcileOutcome::Cancelled,
                        result = self.poll_once(tx_hash) => result,
                    };
                    match polled {
                        Ok(Some(status)) if status.is_terminal() => {
                            metrics::record_poll(status.as_str());
                            break ReconcileOutcome::Settled(status);
                        }
                        Ok(Some(_)) => metrics::record_poll("pending"),
                        Ok(None) => {
                            tracing::debug!(tx_hash = %tx_hash, "Transaction not listed yet");
                            metrics::record_poll("not_listed");
                        }
                        Err(ApiError::Unauthenticated) => break ReconcileOutcome::Deauthenticated,
                        Err(e) => {
                            tracing::warn!(tx_hash = %tx_hash, error = %e, "Status poll failed");
                            metrics::record_poll("error");
                        }
                    }
                }
            }
        };

        tracing::info!(tx_hash = %tx_hash, outcome = ?outcome, "Status polling stopped");
        outcome
    }
}
