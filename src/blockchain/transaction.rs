//! Transfer building and signing.
//!
//! # Responsibilities
//! - Read nonce, gas price and balance from the chain
//! - Refuse transfers the wallet cannot pay for
//! - Build an EIP-155 transfer carrying the memo as input data
//! - Sign and encode it as an EIP-2718 envelope

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use std::future::Future;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{SignedTransaction, SigningError};
use crate::staking::intent::TransferIntent;

/// Gas charged per memo byte on top of the base transfer gas.
const GAS_PER_MEMO_BYTE: u64 = 16;

/// The wallet signing library seam: turns an intent into a signed transaction.
///
/// Implementations own every chain-specific detail (nonce, fee, encoding).
/// Errors are member-facing and shown verbatim.
pub trait TransferSigner: Send + Sync {
    fn build_and_sign(
        &self,
        key: &PrivateKeySigner,
        intent: &TransferIntent,
    ) -> impl Future<Output = Result<SignedTransaction, SigningError>> + Send;
}

/// Chain parameters fixed at signing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
}

/// Gas limit for a transfer carrying `memo`.
pub fn transfer_gas_limit(base_gas_limit: u64, memo: &str) -> u64 {
    base_gas_limit + memo.len() as u64 * GAS_PER_MEMO_BYTE
}

/// Build and sign a transfer with explicit chain parameters.
///
/// Deterministic: the same key, intent and params always produce the same
/// bytes and hash.
pub fn sign_transfer(
    key: &PrivateKeySigner,
    intent: &TransferIntent,
    params: TransferParams,
) -> Result<SignedTransaction, SigningError> {
    if intent.to.is_zero() {
        return Err(SigningError::InvalidDestination(intent.to));
    }

    let mut tx = TxLegacy {
        chain_id: Some(params.chain_id),
        nonce: params.nonce,
        gas_price: params.gas_price,
        gas_limit: params.gas_limit,
        to: TxKind::Call(intent.to),
        value: U256::from(intent.amount_micro),
        input: Bytes::from(intent.memo.clone().into_bytes()),
    };

    let signature = key
        .sign_transaction_sync(&mut tx)
        .map_err(|e| SigningError::Signer(e.to_string()))?;
    let signed = tx.into_signed(signature);
    let tx_hash = *signed.hash();

    let envelope = TxEnvelope::Legacy(signed);
    let raw = Bytes::from(envelope.encoded_2718());

    Ok(SignedTransaction::new(raw, tx_hash.to_string()))
}

/// Signer backed by a JSON-RPC chain client.
#[derive(Debug, Clone)]
pub struct ChainTransferSigner {
    client: BlockchainClient,
}

impl ChainTransferSigner {
    pub fn new(client: BlockchainClient) -> Self {
        Self { client }
    }

    /// Fetch nonce and gas price, applying the configured price policy.
    async fn params_for(&self, key: &PrivateKeySigner, intent: &TransferIntent) -> Result<TransferParams, SigningError> {
        let config = self.client.config();
        let nonce = self.client.get_transaction_count(key.address()).await?;

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;
        if gas_price_gwei > config.max_gas_price_gwei as u128 {
            return Err(SigningError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }
        let adjusted_gas_price = (gas_price as f64 * config.gas_price_multiplier) as u128;

        Ok(TransferParams {
            chain_id: config.chain_id,
            nonce,
            gas_price: adjusted_gas_price,
            gas_limit: transfer_gas_limit(config.base_gas_limit, &intent.memo),
        })
    }
}

impl TransferSigner for ChainTransferSigner {
    async fn build_and_sign(
        &self,
        key: &PrivateKeySigner,
        intent: &TransferIntent,
    ) -> Result<SignedTransaction, SigningError> {
        let params = self.params_for(key, intent).await?;

        let balance = self.client.get_balance(key.address()).await?;
        let fee = U256::from(params.gas_price) * U256::from(params.gas_limit);
        let needed = U256::from(intent.amount_micro) + fee;
        if needed > balance {
            return Err(SigningError::InsufficientBalance {
                needed: needed.to_string(),
                available: balance.to_string(),
            });
        }

        let signed = sign_transfer(key, intent, params)?;
        tracing::debug!(
            tx_hash = %signed.tx_hash(),
            nonce = params.nonce,
            gas_price = params.gas_price,
            "Transfer signed"
        );
        Ok(signed)
    }
}
