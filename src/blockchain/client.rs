//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint (primary + failovers)
//! - Query the chain state a transfer signer needs (nonce, gas price, balance)
//! - Handle timeouts and network errors gracefully

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainConfig, ChainError, ChainId, ChainResult};
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// Primary first, then failovers in configured order.
    providers: Vec<DynProvider>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// A chain-id mismatch or unreachable RPC is logged but not fatal; the
    /// signer surfaces RPC failures when it actually needs chain state.
    pub async fn new(config: BlockchainConfig) -> ChainResult<Self> {
        let mut providers = vec![connect(&config.rpc_url)?];
        for url in &config.failover_urls {
            match connect(url) {
                Ok(provider) => providers.push(provider),
                Err(e) => tracing::warn!(url = %url, error = %e, "Ignoring invalid failover RPC URL"),
            }
        }

        let client = Self {
            providers,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        };
        match client.verify_chain_id().await {
            Ok(()) => tracing::info!(
                rpc_url = %client.config.rpc_url,
                chain_id = client.config.chain_id,
                failovers = client.providers.len() - 1,
                "Blockchain client ready"
            ),
            Err(e) => tracing::warn!(error = %e, "Chain verification failed; continuing"),
        }
        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        self.with_failover("chain_id", |provider| async move { provider.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Get the balance of an address.
    pub async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        self.with_failover("balance", |provider| async move { provider.get_balance(address).await })
            .await
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> ChainResult<u64> {
        self.with_failover("transaction_count", |provider| async move {
            provider.get_transaction_count(address).await
        })
        .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> ChainResult<u128> {
        self.with_failover("gas_price", |provider| async move { provider.get_gas_price().await })
            .await
    }

    /// Run `call` against each provider in order until one answers in time.
    async fn with_failover<T, E, F, Fut>(&self, operation: &'static str, call: F) -> ChainResult<T>
    where
        E: std::fmt::Display,
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, operation, error = %e, "RPC error, trying next provider");
                }
                Err(_) => tracing::warn!(provider_idx = i, operation, "RPC timeout, trying next provider"),
            }
            metrics::record_rpc_error(operation);
        }
        Err(ChainError::Rpc(format!("All RPC providers failed ({})", operation)))
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }
}

fn connect(url: &str) -> ChainResult<DynProvider> {
    let parsed: url::Url = url
        .parse()
        .map_err(|e| ChainError::Rpc(format!("Invalid RPC URL '{}': {}", url, e)))?;
    let provider: DynProvider = Arc::new(ProviderBuilder::new().connect_http(parsed));
    Ok(provider)
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
