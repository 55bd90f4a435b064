//! Pool backend client.
//!
//! # Responsibilities
//! - One typed call per backend endpoint the staking flow consumes
//! - Attach the member's bearer token and a request id to every call
//! - Preserve backend error text so it can be shown to the member verbatim

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::{
    ErrorBody, RegisterStakeRequest, RegisterStakeResponse, StakeMethod, StakeTransaction, SubmitTxRequest,
    SubmitTxResponse, WalletBalance, WalletList,
};
use crate::blockchain::types::is_tx_hash;
use crate::config::ApiConfig;
use crate::session::AuthSession;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest raw body echoed into an error when the backend sends no message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// The backend calls the staking flow depends on.
pub trait StakeApi: Send + Sync {
    /// Relay a signed transaction; returns the network's transaction hash.
    fn submit_tx(&self, signed_payload: &str) -> impl Future<Output = ApiResult<String>> + Send;

    /// Record a relayed transaction against the member's pending stake.
    fn register_stake_tx(
        &self,
        customer_id: u64,
        tx_id: &str,
        method: StakeMethod,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn list_wallets(&self) -> impl Future<Output = ApiResult<WalletList>> + Send;

    /// Balance of `address` in micro-units.
    fn wallet_balance(&self, address: &str) -> impl Future<Output = ApiResult<u64>> + Send;

    fn stake_transactions(&self, customer_id: u64) -> impl Future<Output = ApiResult<Vec<StakeTransaction>>> + Send;
}

impl<T: StakeApi> StakeApi for Arc<T> {
    fn submit_tx(&self, signed_payload: &str) -> impl Future<Output = ApiResult<String>> + Send {
        (**self).submit_tx(signed_payload)
    }

    fn register_stake_tx(
        &self,
        customer_id: u64,
        tx_id: &str,
        method: StakeMethod,
    ) -> impl Future<Output = ApiResult<()>> + Send {
        (**self).register_stake_tx(customer_id, tx_id, method)
    }

    fn list_wallets(&self) -> impl Future<Output = ApiResult<WalletList>> + Send {
        (**self).list_wallets()
    }

    fn wallet_balance(&self, address: &str) -> impl Future<Output = ApiResult<u64>> + Send {
        (**self).wallet_balance(address)
    }

    fn stake_transactions(&self, customer_id: u64) -> impl Future<Output = ApiResult<Vec<StakeTransaction>>> + Send {
        (**self).stake_transactions(customer_id)
    }
}

/// Error envelope used on non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of [`StakeApi`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthSession,
}

impl BackendClient {
    pub fn new(config: &ApiConfig, auth: AuthSession) -> ApiResult<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base url '{}': {}", config.base_url, e)))?;
        // Url::join drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { http, base_url, auth })
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Transport(format!("invalid endpoint '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    fn headers(&self, request_id: &str) -> ApiResult<HeaderMap> {
        let token = self.auth.token().ok_or(ApiError::Unauthenticated)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Transport("access token is not a valid header value".into()))?,
        );
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_str(request_id).map_err(|e| ApiError::Transport(e.to_string()))?,
        );
        Ok(headers)
    }

    /// Send a request and return status plus body text.
    async fn execute(&self, builder: RequestBuilder, path: &str) -> ApiResult<(StatusCode, String)> {
        let request_id = Uuid::new_v4().to_string();
        let headers = self.headers(&request_id)?;

        tracing::debug!(request_id = %request_id, path = %path, "Backend request");
        let response = builder.headers(headers).send().await.map_err(|e| {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Backend request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(request_id = %request_id, path = %path, status = status.as_u16(), "Backend response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }
        Ok((status, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        let url = self.endpoint(path, query)?;
        let (status, body) = self.execute(self.http.get(url), path).await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl StakeApi for BackendClient {
    async fn submit_tx(&self, signed_payload: &str) -> ApiResult<String> {
        let path = "user/submit-tx";
        let url = self.endpoint(path, &[])?;
        let body = SubmitTxRequest {
            signed_transaction_payload: signed_payload.to_string(),
        };
        let (status, text) = self.execute(self.http.post(url).json(&body), path).await?;

        match serde_json::from_str::<SubmitTxResponse>(&text) {
            Ok(SubmitTxResponse::Relayed { tx_hash }) if status.is_success() => {
                if !is_tx_hash(&tx_hash) {
                    return Err(ApiError::Decode(format!("relay returned an invalid transaction hash '{}'", tx_hash)));
                }
                Ok(tx_hash)
            }
            Ok(SubmitTxResponse::Failed { error }) => Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error.message(),
            }),
            _ if !status.is_success() => Err(rejection(status, &text)),
            Ok(SubmitTxResponse::Relayed { .. }) => Err(ApiError::Decode("relay returned a hash with an error status".into())),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }

    async fn register_stake_tx(&self, customer_id: u64, tx_id: &str, method: StakeMethod) -> ApiResult<()> {
        let path = "stake/transaction";
        let customer = customer_id.to_string();
        let url = self.endpoint(path, &[("customerId", customer.as_str())])?;
        let body = RegisterStakeRequest {
            tx_id: tx_id.to_string(),
            stake_method: method,
        };
        let (status, text) = self.execute(self.http.post(url).json(&body), path).await?;

        if !status.is_success() {
            return Err(rejection(status, &text));
        }
        // An empty body is not a confirmation.
        match serde_json::from_str::<RegisterStakeResponse>(&text) {
            Ok(response) if response.is_recorded() => Ok(()),
            Ok(RegisterStakeResponse::Failed { error }) => Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error.message(),
            }),
            Ok(RegisterStakeResponse::Recorded { message, .. }) => Err(ApiError::Rejected {
                status: status.as_u16(),
                message: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "stake ledger did not record the transaction".to_string()),
            }),
            Err(_) if text.trim().is_empty() => Err(ApiError::Decode("empty registration response".into())),
            Err(e) => match envelope_message(&text) {
                Some(message) => Err(ApiError::Rejected {
                    status: status.as_u16(),
                    message,
                }),
                None => Err(ApiError::Decode(e.to_string())),
            },
        }
    }

    async fn list_wallets(&self) -> ApiResult<WalletList> {
        self.get_json("wallet/list", &[]).await
    }

    async fn wallet_balance(&self, address: &str) -> ApiResult<u64> {
        let balance: WalletBalance = self.get_json("user/wallet-balance", &[("address", address)]).await?;
        Ok(balance.balance)
    }

    async fn stake_transactions(&self, customer_id: u64) -> ApiResult<Vec<StakeTransaction>> {
        let customer = customer_id.to_string();
        self.get_json("stake/transactions", &[("customerId", customer.as_str())]).await
    }
}

/// Build a `Rejected` error from a non-success response, keeping the
/// backend's own message when it sent one.
fn rejection(status: StatusCode, body: &str) -> ApiError {
    let message = envelope_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.canonical_reason().unwrap_or("request rejected").to_string()
        } else {
            trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
        }
    });

    ApiError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// The backend's own message from an error envelope, if it sent one.
fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body).ok().and_then(|envelope| {
        envelope
            .error
            .map(|e| e.message())
            .or(envelope.message)
            .filter(|m| !m.is_empty())
    })
}
