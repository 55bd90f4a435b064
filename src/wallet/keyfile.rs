//! Encrypted keyfiles.
//!
//! A keyfile holds a hex-encoded 32-byte private key sealed under a passphrase:
//! 1. Argon2id derives a 32-byte key from the passphrase + random salt,
//!    with the time cost taken from `secparam`
//! 2. AES-256-GCM encrypts the key hex; the nonce is the first 12 bytes of
//!    the derived key, so the salt alone makes every file unique
//! 3. `salt` and `ciphertext` are stored as hex in a flat JSON object

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use zeroize::Zeroizing;

use crate::wallet::error::{ImportError, ImportErrorReason};

/// Argon2id memory cost: 19 MiB, one lane.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_PARALLELISM: u32 = 1;
const DERIVED_KEY_LEN: usize = 32;

/// Salt length in bytes.
const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Time cost written into exported keyfiles.
pub const DEFAULT_SECPARAM: u32 = 3;

/// Highest time cost a keyfile may ask for; each step is a full pass over
/// the Argon2 memory.
pub const MAX_SECPARAM: u32 = 64;

/// The only key derivation this format supports.
pub const KDF_NAME: &str = "argon2id";

/// The keyfile JSON structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<String>,
    /// Hex-encoded salt.
    pub salt: String,
    /// Argon2 time cost, kept as a string like the rest of the format.
    pub secparam: String,
    /// Free-form passphrase hint chosen at export time.
    #[serde(default)]
    pub hint: String,
    /// Hex-encoded AES-256-GCM ciphertext (tag appended).
    pub ciphertext: String,
}

impl Keyfile {
    /// Seal a 32-byte private key under `passphrase`.
    pub fn seal(private_key: &[u8; 32], passphrase: &str, hint: &str, secparam: u32) -> Result<Self, ImportError> {
        if !(1..=MAX_SECPARAM).contains(&secparam) {
            return Err(ImportError::new(
                ImportErrorReason::Unknown,
                format!("secparam must be between 1 and {}", MAX_SECPARAM),
            ));
        }
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let derived = derive_key(passphrase, &salt, secparam)?;
        let cipher = Aes256Gcm::new_from_slice(&derived[..])
            .map_err(|_| ImportError::new(ImportErrorReason::Unknown, "cipher initialisation failed"))?;

        let plaintext = Zeroizing::new(hex::encode(private_key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&derived[..NONCE_LEN]), plaintext.as_bytes())
            .map_err(|_| ImportError::new(ImportErrorReason::Unknown, "encryption failed"))?;

        Ok(Self {
            kdf: Some(KDF_NAME.to_string()),
            salt: hex::encode(salt),
            secparam: secparam.to_string(),
            hint: hint.to_string(),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Decrypt the keyfile, returning the 32-byte private key.
    ///
    /// An authentication failure means the passphrase is wrong; every other
    /// failure means the file itself is damaged.
    pub fn open(&self, passphrase: &str) -> Result<Zeroizing<[u8; 32]>, ImportError> {
        let corrupt = |detail: &str| ImportError::new(ImportErrorReason::CorruptKeyfile, detail);

        if let Some(kdf) = &self.kdf {
            if kdf != KDF_NAME {
                return Err(corrupt("unsupported key derivation"));
            }
        }
        let salt = hex::decode(self.salt.trim()).map_err(|_| corrupt("salt is not hex"))?;
        if salt.len() < 8 {
            return Err(corrupt("salt too short"));
        }
        let secparam: u32 = self
            .secparam
            .trim()
            .parse()
            .map_err(|_| corrupt("secparam is not a number"))?;
        if !(1..=MAX_SECPARAM).contains(&secparam) {
            return Err(corrupt("secparam out of range"));
        }
        let ciphertext = hex::decode(self.ciphertext.trim()).map_err(|_| corrupt("ciphertext is not hex"))?;

        let derived = derive_key(passphrase, &salt, secparam)?;
        let cipher = Aes256Gcm::new_from_slice(&derived[..])
            .map_err(|_| ImportError::new(ImportErrorReason::Unknown, "cipher initialisation failed"))?;

        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&derived[..NONCE_LEN]), ciphertext.as_ref())
                .map_err(|_| ImportError::new(ImportErrorReason::BadPassphrase, "passphrase does not unlock this keyfile"))?,
        );

        let key_hex = std::str::from_utf8(&plaintext).map_err(|_| corrupt("decrypted key is not text"))?;
        let mut key = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(key_hex.trim(), &mut key[..]).map_err(|_| corrupt("decrypted key is not a 32-byte hex key"))?;
        Ok(key)
    }

    /// Load a keyfile from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ImportError::new(ImportErrorReason::CorruptKeyfile, format!("cannot read keyfile: {}", e)))?;
        Self::from_json(&json)
    }

    /// Parse keyfile JSON.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        serde_json::from_str(json)
            .map_err(|e| ImportError::new(ImportErrorReason::CorruptKeyfile, format!("invalid keyfile JSON: {}", e)))
    }

    /// Save the keyfile as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Derive the 32-byte encryption key with Argon2id.
fn derive_key(passphrase: &str, salt: &[u8], secparam: u32) -> Result<Zeroizing<[u8; DERIVED_KEY_LEN]>, ImportError> {
    let params = Params::new(ARGON2_MEMORY_KIB, secparam, ARGON2_PARALLELISM, Some(DERIVED_KEY_LEN))
        .map_err(|_| ImportError::new(ImportErrorReason::CorruptKeyfile, "invalid key derivation parameters"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut output[..])
        .map_err(|_| ImportError::new(ImportErrorReason::CorruptKeyfile, "key derivation failed"))?;
    Ok(output)
}
