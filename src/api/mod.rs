//! Pool backend API.
//!
//! # Endpoints
//! ```text
//! POST /user/submit-tx                    relay a signed transaction
//! POST /stake/transaction?customerId=<id> register a hash with the stake ledger
//! GET  /wallet/list                       wallets registered to the account
//! GET  /user/wallet-balance?address=<hex> balance in micro-units
//! GET  /stake/transactions?customerId=<id> ledger rows for status polling
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{BackendClient, StakeApi};
pub use error::{ApiError, ApiResult};
pub use types::{StakeMethod, StakeTransaction, WalletList, WalletRecord};
