//! Signing identities and the signer handles behind them.
//!
//! # Security
//! - A handle either holds an unlocked signer (keyfile imports) or the key
//!   re-sealed under the session passphrase (raw key imports)
//! - Keys are never logged or serialized; `Debug` shows the address only
//! - Identities live in memory for one session and are dropped with it

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use zeroize::Zeroizing;

use crate::wallet::error::{ImportError, ImportErrorReason};
use crate::wallet::keyfile::Keyfile;

/// How an identity's key entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Keyfile,
    RawKey,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Keyfile => "keyfile",
            CredentialKind::RawKey => "raw_key",
        }
    }
}

/// Opaque capability to sign as one address.
pub enum SignerHandle {
    /// Decrypted signer, ready to use.
    Unlocked(PrivateKeySigner),
    /// Key sealed under the session passphrase; unlocks per submission.
    Sealed(Keyfile),
}

/// Address plus the capability to sign for it.
pub struct SigningIdentity {
    address: Address,
    handle: SignerHandle,
    kind: CredentialKind,
}

impl SigningIdentity {
    pub(crate) fn new(address: Address, handle: SignerHandle, kind: CredentialKind) -> Self {
        Self { address, handle, kind }
    }

    /// The derived wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Whether sending requires the session passphrase again.
    pub fn requires_passphrase(&self) -> bool {
        matches!(self.handle, SignerHandle::Sealed(_))
    }

    /// Produce a signer for one submission.
    ///
    /// Sealed handles need the session passphrase; unlocked handles ignore it.
    pub fn unlock(&self, passphrase: Option<&str>) -> Result<PrivateKeySigner, ImportError> {
        match &self.handle {
            SignerHandle::Unlocked(signer) => Ok(signer.clone()),
            SignerHandle::Sealed(keyfile) => {
                let passphrase = passphrase.filter(|p| !p.is_empty()).ok_or_else(|| {
                    ImportError::new(ImportErrorReason::BadPassphrase, "session passphrase required to send")
                })?;
                let key = keyfile.open(passphrase)?;
                let signer = signer_from_bytes(&key)?;
                if signer.address() != self.address {
                    return Err(ImportError::new(ImportErrorReason::Unknown, "unlocked key does not match identity"));
                }
                Ok(signer)
            }
        }
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .field("sealed", &self.requires_passphrase())
            .finish()
    }
}

/// Build a signer from raw key bytes.
pub(crate) fn signer_from_bytes(key: &Zeroizing<[u8; 32]>) -> Result<PrivateKeySigner, ImportError> {
    PrivateKeySigner::from_bytes(&B256::from(**key))
        .map_err(|_| ImportError::new(ImportErrorReason::InvalidKeyFormat, "not a valid secp256k1 private key"))
}
