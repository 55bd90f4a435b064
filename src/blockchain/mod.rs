//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Unlocked signer + TransferIntent
//!     → client.rs (nonce, gas price, balance over JSON-RPC with timeouts)
//!     → transaction.rs (build, sign, encode)
//!     → SignedTransaction handed to the coordinator for relay
//! ```
//!
//! # Security Constraints
//! - Key material only enters through an unlocked `PrivateKeySigner`
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;

pub use client::BlockchainClient;
pub use transaction::{sign_transfer, ChainTransferSigner, TransferParams, TransferSigner};
pub use types::{BlockchainConfig, ChainError, ChainId, SignedTransaction, SigningError};
