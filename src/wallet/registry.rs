//! Classifying an imported wallet against the account's registry.

use alloy::primitives::Address;

use crate::api::types::{WalletList, WalletRecord};
use crate::blockchain::types::{address_hex, normalize_hex};
use crate::wallet::error::ImportError;

/// Where an imported address sits relative to the member's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletMatch {
    /// The account's current active wallet; proceed.
    ActiveWallet,
    /// Registered to the account but not active; switching needs the
    /// member's confirmation.
    OtherRegistered { wallet: WalletRecord },
    /// Not registered to the account.
    NotRegistered,
}

impl WalletMatch {
    /// Reject unregistered wallets; pass the other outcomes through.
    pub fn into_result(self, address: &Address) -> Result<WalletMatch, ImportError> {
        match self {
            WalletMatch::NotRegistered => Err(ImportError::wallet_not_registered(&address_hex(address))),
            other => Ok(other),
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, WalletMatch::OtherRegistered { .. })
    }
}

/// Classify `address` against the registry.
///
/// Only wallets in the `active` list count as registered. `current_active`
/// names the wallet the account treats as active, if known.
pub fn classify_wallet(address: &Address, registry: &WalletList, current_active: Option<&str>) -> WalletMatch {
    let target = normalize_hex(&address_hex(address));

    let Some(record) = registry
        .active
        .iter()
        .find(|w| normalize_hex(&w.p_wallet_id) == target)
    else {
        return WalletMatch::NotRegistered;
    };

    match current_active {
        Some(active) if normalize_hex(active) == target => WalletMatch::ActiveWallet,
        _ => WalletMatch::OtherRegistered { wallet: record.clone() },
    }
}

/// The account's active wallet: the configured one, else the first
/// registered wallet.
pub fn resolve_active_wallet(configured: Option<&str>, registry: &WalletList) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| registry.active.first().map(|w| w.p_wallet_id.clone()))
}
