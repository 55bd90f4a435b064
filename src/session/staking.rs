//! The member's signing identity for the current session.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use thiserror::Error;

use crate::api::types::WalletRecord;
use crate::blockchain::types::address_hex;
use crate::wallet::error::ImportError;
use crate::wallet::identity::SigningIdentity;
use crate::wallet::registry::WalletMatch;

/// Why an imported identity was not adopted.
#[derive(Debug, Error)]
pub enum AdoptError {
    #[error(transparent)]
    NotRegistered(#[from] ImportError),

    /// The wallet is registered but not active; the member must confirm the switch.
    #[error("wallet {} is registered but not active; confirm switching the active wallet", .wallet.p_wallet_id)]
    ConfirmationRequired { wallet: WalletRecord },
}

/// In-memory slot for the identity used to stake.
///
/// Never persisted. Clearing it drops the signer handle.
#[derive(Debug, Default)]
pub struct StakingSession {
    identity: ArcSwapOption<SigningIdentity>,
    active_wallet: ArcSwapOption<String>,
}

impl StakingSession {
    pub fn new(active_wallet: Option<String>) -> Self {
        Self {
            identity: ArcSwapOption::empty(),
            active_wallet: ArcSwapOption::new(active_wallet.map(Arc::new)),
        }
    }

    /// Install `identity` according to its registry classification.
    ///
    /// `switch_confirmed` must be true to adopt a registered wallet that is
    /// not the active one; doing so makes it active.
    pub fn adopt(
        &self,
        identity: SigningIdentity,
        classification: WalletMatch,
        switch_confirmed: bool,
    ) -> Result<Arc<SigningIdentity>, AdoptError> {
        let address = identity.address();
        match classification.into_result(&address)? {
            WalletMatch::OtherRegistered { wallet } if !switch_confirmed => {
                return Err(AdoptError::ConfirmationRequired { wallet });
            }
            WalletMatch::OtherRegistered { .. } => {
                tracing::info!(address = %address_hex(&address), "Active wallet switched");
                self.active_wallet.store(Some(Arc::new(address_hex(&address))));
            }
            _ => {}
        }

        let identity = Arc::new(identity);
        self.identity.store(Some(identity.clone()));
        Ok(identity)
    }

    pub fn identity(&self) -> Option<Arc<SigningIdentity>> {
        self.identity.load_full()
    }

    pub fn active_wallet(&self) -> Option<String> {
        self.active_wallet.load_full().map(|w| w.as_ref().clone())
    }

    /// Drop the identity, e.g. on sign-out.
    pub fn clear(&self) {
        self.identity.store(None);
    }
}
