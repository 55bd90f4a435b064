//! Transfer intents and amount parsing.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base units per whole token.
pub const MICRO_UNITS_PER_TOKEN: u64 = 1_000_000;

/// Decimal places a token amount may carry.
const TOKEN_DECIMALS: usize = 6;

/// What the member asked to send, before anything is signed.
///
/// Two intents with equal fields are the same intent; the coordinator keys
/// its in-flight guard on this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Address of the signing identity.
    pub from: Address,
    /// Destination; must be the pool's receiving address.
    pub to: Address,
    /// Amount in micro-units.
    pub amount_micro: u64,
    pub memo: String,
}

/// Rejections raised before an intent reaches the signer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("amount must be at least 1 micro-unit")]
    ZeroAmount,

    #[error("destination {actual} is not the pool receiving address {expected}")]
    WrongDestination { expected: Address, actual: Address },

    #[error("memo is {len} characters, limit is {max}")]
    MemoTooLong { len: usize, max: usize },

    #[error("intent is signed by {intent} but the active identity is {identity}")]
    IdentityMismatch { intent: Address, identity: Address },

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
}

impl TransferIntent {
    /// Build an intent addressed to the pool.
    pub fn to_pool(from: Address, pool: Address, amount_micro: u64, memo: impl Into<String>) -> Self {
        Self {
            from,
            to: pool,
            amount_micro,
            memo: memo.into(),
        }
    }

    /// Check the intent against pool rules.
    pub fn validate(&self, pool: Address, memo_max_len: usize) -> Result<(), IntentError> {
        if self.amount_micro == 0 {
            return Err(IntentError::ZeroAmount);
        }
        if self.to != pool {
            return Err(IntentError::WrongDestination {
                expected: pool,
                actual: self.to,
            });
        }
        let len = self.memo.chars().count();
        if len > memo_max_len {
            return Err(IntentError::MemoTooLong {
                len,
                max: memo_max_len,
            });
        }
        Ok(())
    }
}

/// Parse a decimal token amount ("5", "5.25", "0.000001") into micro-units.
pub fn parse_token_amount(input: &str) -> Result<u64, IntentError> {
    let invalid = || IntentError::InvalidAmount(input.to_string());
    let trimmed = input.trim();

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > TOKEN_DECIMALS {
        return Err(invalid());
    }

    let whole_units: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let padded = format!("{:0<width$}", fraction, width = TOKEN_DECIMALS);
    let fraction_units: u64 = padded.parse().map_err(|_| invalid())?;

    whole_units
        .checked_mul(MICRO_UNITS_PER_TOKEN)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or_else(invalid)
}

/// Render micro-units as a decimal token amount.
pub fn format_token_amount(amount_micro: u64) -> String {
    let whole = amount_micro / MICRO_UNITS_PER_TOKEN;
    let fraction = amount_micro % MICRO_UNITS_PER_TOKEN;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:06}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
