//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Receiving wallet of the pool on the production network.
///
/// Deployments override it through `[pool] receiving_address`; members never
/// choose the destination of a stake transfer.
pub const DEFAULT_POOL_RECEIVING_ADDRESS: &str = "0x8a4cd5b1b1e6b7a5b6c2d5f0c3e8d1f7a9e0b4c6";

/// Longest memo accepted on a transfer.
pub const DEFAULT_MEMO_MAX_LEN: usize = 75;

/// Root configuration for the staking client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PoolstakeConfig {
    /// Pool backend REST API.
    pub api: ApiConfig,

    /// Pool-wide constants.
    pub pool: PoolConfig,

    /// The member account this client acts for.
    pub account: AccountConfig,

    /// Chain RPC settings used by the transfer signer.
    pub chain: BlockchainConfig,

    /// Status polling after a submission.
    pub reconcile: ReconcileConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Environment variable holding the member's bearer token.
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/".to_string(),
            request_timeout_secs: 30,
            token_env: "POOLSTAKE_ACCESS_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Address every stake transfer must be sent to.
    pub receiving_address: String,

    /// Maximum memo length in characters.
    pub memo_max_len: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            receiving_address: DEFAULT_POOL_RECEIVING_ADDRESS.to_string(),
            memo_max_len: DEFAULT_MEMO_MAX_LEN,
        }
    }
}

/// Member account settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccountConfig {
    /// Backend customer id the stake ledger is keyed by.
    pub customer_id: Option<u64>,

    /// Wallet currently treated as active for this account.
    /// Falls back to the first active wallet in the registry when unset.
    pub active_wallet: Option<String>,
}

/// Blockchain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID used for EIP-155 replay protection.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Gas for a plain transfer; memo bytes are charged on top.
    pub base_gas_limit: u64,

    /// Gas price multiplier (1.0 = estimated, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            base_gas_limit: 21_000,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Seconds between stake-ledger polls.
    pub poll_interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
