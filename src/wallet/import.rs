//! Credential import: keyfile or raw private key to a signing identity.

use alloy::primitives::Address;
use std::fmt;
use zeroize::Zeroizing;

use crate::blockchain::types::{address_hex, normalize_hex};
use crate::observability::metrics;
use crate::wallet::error::{ImportError, ImportErrorReason};
use crate::wallet::identity::{signer_from_bytes, CredentialKind, SignerHandle, SigningIdentity};
use crate::wallet::keyfile::Keyfile;

/// Argon2 time cost for keys re-sealed under a session passphrase.
///
/// The sealed copy never leaves memory, so it is cheaper than an export.
pub const SESSION_SECPARAM: u32 = 1;

/// Hex characters in a 32-byte private key.
const PRIVATE_KEY_HEX_LEN: usize = 64;

/// A credential supplied by the member.
pub enum ImportCredential {
    Keyfile {
        keyfile: Keyfile,
        passphrase: Zeroizing<String>,
    },
    RawKey {
        private_key_hex: Zeroizing<String>,
        session_passphrase: Zeroizing<String>,
    },
}

impl ImportCredential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            ImportCredential::Keyfile { .. } => CredentialKind::Keyfile,
            ImportCredential::RawKey { .. } => CredentialKind::RawKey,
        }
    }
}

impl fmt::Debug for ImportCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportCredential::Keyfile { keyfile, .. } => f
                .debug_struct("Keyfile")
                .field("hint", &keyfile.hint)
                .field("passphrase", &"<redacted>")
                .finish(),
            ImportCredential::RawKey { .. } => f
                .debug_struct("RawKey")
                .field("private_key_hex", &"<redacted>")
                .field("session_passphrase", &"<redacted>")
                .finish(),
        }
    }
}

/// Import any credential.
pub fn import(credential: &ImportCredential) -> Result<SigningIdentity, ImportError> {
    match credential {
        ImportCredential::Keyfile { keyfile, passphrase } => import_from_keyfile(keyfile, passphrase),
        ImportCredential::RawKey {
            private_key_hex,
            session_passphrase,
        } => import_from_private_key(private_key_hex, session_passphrase),
    }
}

/// Unlock a keyfile with its passphrase.
pub fn import_from_keyfile(keyfile: &Keyfile, passphrase: &str) -> Result<SigningIdentity, ImportError> {
    let result = keyfile.open(passphrase).and_then(|key| signer_from_bytes(&key));
    let signer = record(CredentialKind::Keyfile, result)?;

    let address = signer.address();
    tracing::info!(address = %address_hex(&address), "Keyfile imported");
    Ok(SigningIdentity::new(address, SignerHandle::Unlocked(signer), CredentialKind::Keyfile))
}

/// Import a hex private key, sealing it under a passphrase for this session.
///
/// Accepts 64 hex characters with or without a `0x` prefix.
pub fn import_from_private_key(private_key_hex: &str, session_passphrase: &str) -> Result<SigningIdentity, ImportError> {
    let result = decode_private_key(private_key_hex).and_then(|key| {
        if session_passphrase.is_empty() {
            return Err(ImportError::new(
                ImportErrorReason::BadPassphrase,
                "a session passphrase is required",
            ));
        }
        let signer = signer_from_bytes(&key)?;
        let sealed = Keyfile::seal(&key, session_passphrase, "", SESSION_SECPARAM)?;
        Ok((signer.address(), sealed))
    });
    let (address, sealed) = record(CredentialKind::RawKey, result)?;

    tracing::info!(address = %address_hex(&address), "Private key imported");
    Ok(SigningIdentity::new(address, SignerHandle::Sealed(sealed), CredentialKind::RawKey))
}

/// Seal a hex private key into a keyfile for export.
///
/// Returns the address the key controls alongside the keyfile.
pub fn export_keyfile(
    private_key_hex: &str,
    passphrase: &str,
    hint: &str,
    secparam: u32,
) -> Result<(Address, Keyfile), ImportError> {
    if passphrase.is_empty() {
        return Err(ImportError::new(ImportErrorReason::BadPassphrase, "an export passphrase is required"));
    }
    let key = decode_private_key(private_key_hex)?;
    let signer = signer_from_bytes(&key)?;
    let keyfile = Keyfile::seal(&key, passphrase, hint, secparam)?;
    tracing::info!(address = %address_hex(&signer.address()), "Keyfile exported");
    Ok((signer.address(), keyfile))
}

fn decode_private_key(input: &str) -> Result<Zeroizing<[u8; 32]>, ImportError> {
    let invalid = || {
        ImportError::new(
            ImportErrorReason::InvalidKeyFormat,
            "private key must be 64 hex characters",
        )
    };
    let hex_key = Zeroizing::new(normalize_hex(input));
    if hex_key.len() != PRIVATE_KEY_HEX_LEN {
        return Err(invalid());
    }
    let mut key = Zeroizing::new([0u8; 32]);
    hex::decode_to_slice(hex_key.as_str(), &mut key[..]).map_err(|_| invalid())?;
    Ok(key)
}

fn record<T>(kind: CredentialKind, result: Result<T, ImportError>) -> Result<T, ImportError> {
    match &result {
        Ok(_) => metrics::record_import(kind.as_str(), "success"),
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), reason = %e.reason, "Credential import failed");
            metrics::record_import(kind.as_str(), e.reason.as_str());
        }
    }
    result
}
