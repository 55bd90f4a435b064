use std::fmt;
use thiserror::Error;

/// Why a credential could not become a signing identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorReason {
    BadPassphrase,
    CorruptKeyfile,
    InvalidKeyFormat,
    WalletNotRegistered,
    Unknown,
}

impl ImportErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportErrorReason::BadPassphrase => "bad-passphrase",
            ImportErrorReason::CorruptKeyfile => "corrupt-keyfile",
            ImportErrorReason::InvalidKeyFormat => "invalid-key-format",
            ImportErrorReason::WalletNotRegistered => "wallet-not-registered",
            ImportErrorReason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ImportErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential import failure.
///
/// Messages are written by this crate, never copied from decrypted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {message}")]
pub struct ImportError {
    pub reason: ImportErrorReason,
    pub message: String,
}

impl ImportError {
    pub fn new(reason: ImportErrorReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// The derived wallet is not registered to the member's account.
    pub fn wallet_not_registered(address: &str) -> Self {
        Self::new(
            ImportErrorReason::WalletNotRegistered,
            format!("wallet {} is not registered to this account; register it first", address),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_leads_with_reason_token() {
        let err = ImportError::new(ImportErrorReason::BadPassphrase, "passphrase does not unlock this keyfile");
        assert_eq!(err.to_string(), "bad-passphrase: passphrase does not unlock this keyfile");
    }

    #[test]
    fn not_registered_names_wallet() {
        let err = ImportError::wallet_not_registered("0xabc");
        assert_eq!(err.reason, ImportErrorReason::WalletNotRegistered);
        assert!(err.to_string().contains("0xabc"));
    }
}
