//! Key import subsystem.
//!
//! # Data Flow
//! ```text
//! Keyfile + passphrase ──┐
//!                        ├→ import.rs → SigningIdentity (address + SignerHandle)
//! raw key + session pw ──┘         → registry.rs classify_wallet against GET /wallet/list
//!                                       → ActiveWallet | OtherRegistered | NotRegistered
//! ```
//!
//! # Security Constraints
//! - Decrypted keys live only inside a `SignerHandle`
//! - Passphrases and key hex are zeroized on drop
//! - Errors never carry key material

pub mod error;
pub mod identity;
pub mod import;
pub mod keyfile;
pub mod registry;

pub use error::{ImportError, ImportErrorReason};
pub use identity::{CredentialKind, SignerHandle, SigningIdentity};
pub use import::{export_keyfile, import, import_from_keyfile, import_from_private_key, ImportCredential};
pub use keyfile::Keyfile;
pub use registry::{classify_wallet, resolve_active_wallet, WalletMatch};
