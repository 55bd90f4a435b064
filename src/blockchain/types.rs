//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes};
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Reasons the signer refuses to produce a transaction.
///
/// The display text is shown to the member verbatim.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("insufficient balance: transfer plus fee needs {needed}, wallet holds {available}")]
    InsufficientBalance { needed: String, available: String },

    #[error("invalid destination address {0}")]
    InvalidDestination(Address),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    #[error("chain unavailable: {0}")]
    Chain(#[from] ChainError),

    #[error("signing failed: {0}")]
    Signer(String),
}

/// A signed, encoded transfer ready for relay.
///
/// Immutable once produced; the coordinator relays it at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Bytes,
    tx_hash: String,
}

impl SignedTransaction {
    pub fn new(raw: Bytes, tx_hash: impl Into<String>) -> Self {
        Self {
            raw,
            tx_hash: tx_hash.into(),
        }
    }

    /// Encoded transaction bytes.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Hash computed by the signer over the encoded bytes.
    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    /// `0x`-prefixed hex of the encoded bytes, as sent to the relay.
    pub fn payload_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

/// Canonical form for comparing hex identifiers (hashes, addresses):
/// lowercase, no `0x` prefix, surrounding whitespace removed.
pub fn normalize_hex(value: &str) -> String {
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    stripped.to_ascii_lowercase()
}

/// Whether `value` looks like a transaction hash: non-empty hex, optional `0x`.
pub fn is_tx_hash(value: &str) -> bool {
    let digits = normalize_hex(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// `0x`-prefixed lowercase hex for an address, the form the backend stores.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_error_display() {
        let err = SigningError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));

        let err = SigningError::from(ChainError::Rpc("All RPC providers failed".into()));
        assert_eq!(err.to_string(), "chain unavailable: RPC error: All RPC providers failed");
    }

    #[test]
    fn normalize_hex_ignores_prefix_and_case() {
        assert_eq!(normalize_hex("0xDEADbeef"), "deadbeef");
        assert_eq!(normalize_hex(" deadbeef "), "deadbeef");
        assert_eq!(normalize_hex("0XAB"), "ab");
    }

    #[test]
    fn tx_hash_shape() {
        assert!(is_tx_hash("deadbeef"));
        assert!(is_tx_hash(" 0xDEADBEEF "));
        for bad in ["", "0x", "   ", "not-a-hash", "0xzz"] {
            assert!(!is_tx_hash(bad), "accepted {:?}", bad);
        }
    }

    #[test]
    fn payload_is_prefixed_hex() {
        let tx = SignedTransaction::new(Bytes::from(vec![0xde, 0xad]), "0x01");
        assert_eq!(tx.payload_hex(), "0xdead");
        assert_eq!(tx.tx_hash(), "0x01");
    }

    #[test]
    fn address_hex_is_lowercase() {
        let addr: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert_eq!(address_hex(&addr), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    }
}
