//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses and URLs parse
//! - Validate value ranges (timeouts > 0, multiplier >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PoolstakeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::PoolstakeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a parsed configuration.
pub fn validate_config(config: &PoolstakeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be greater than 0"));
    }
    if config.api.token_env.trim().is_empty() {
        errors.push(ValidationError::new("api.token_env", "must name an environment variable"));
    }

    match config.pool.receiving_address.parse::<Address>() {
        Ok(addr) if addr.is_zero() => {
            errors.push(ValidationError::new("pool.receiving_address", "zero address not allowed"))
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("pool.receiving_address", e.to_string())),
    }
    if config.pool.memo_max_len == 0 {
        errors.push(ValidationError::new("pool.memo_max_len", "must be greater than 0"));
    }

    if let Some(wallet) = &config.account.active_wallet {
        if let Err(e) = wallet.parse::<Address>() {
            errors.push(ValidationError::new("account.active_wallet", e.to_string()));
        }
    }

    if let Err(e) = url::Url::parse(&config.chain.rpc_url) {
        errors.push(ValidationError::new("chain.rpc_url", e.to_string()));
    }
    if config.chain.chain_id == 0 {
        errors.push(ValidationError::new("chain.chain_id", "must be greater than 0"));
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.chain.base_gas_limit < 21_000 {
        errors.push(ValidationError::new("chain.base_gas_limit", "must be at least 21000"));
    }
    if !config.chain.gas_price_multiplier.is_finite() || config.chain.gas_price_multiplier < 1.0 {
        errors.push(ValidationError::new("chain.gas_price_multiplier", "must be a finite value >= 1.0"));
    }

    if config.reconcile.poll_interval_secs == 0 {
        errors.push(ValidationError::new("reconcile.poll_interval_secs", "must be greater than 0"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PoolstakeConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = PoolstakeConfig::default();
        config.api.base_url = "ftp://pool".to_string();
        config.pool.receiving_address = "0x0000000000000000000000000000000000000000".to_string();
        config.reconcile.poll_interval_secs = 0;
        config.chain.gas_price_multiplier = 0.5;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "api.base_url",
                "pool.receiving_address",
                "chain.gas_price_multiplier",
                "reconcile.poll_interval_secs",
            ]
        );
    }

    #[test]
    fn rejects_malformed_active_wallet() {
        let mut config = PoolstakeConfig::default();
        config.account.active_wallet = Some("not-an-address".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "account.active_wallet");
    }
}
