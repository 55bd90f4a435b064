//! Request and response shapes for the pool backend.
//!
//! Every endpoint gets an explicit type; responses that may carry either a
//! result or an error are untagged enums so callers match on them instead of
//! probing loose JSON.

use serde::{Deserialize, Serialize};

/// How a transaction hash reached the stake ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeMethod {
    /// The member pasted a hash by hand.
    #[serde(rename = "Transaction Hash Entry")]
    TransactionHashEntry,
    /// The hash came out of the signing flow.
    #[serde(rename = "Wallet Integration")]
    WalletIntegration,
}

impl StakeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeMethod::TransactionHashEntry => "Transaction Hash Entry",
            StakeMethod::WalletIntegration => "Wallet Integration",
        }
    }
}

/// `POST /user/submit-tx` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitTxRequest {
    #[serde(rename = "signedTransactionPayload")]
    pub signed_transaction_payload: String,
}

/// `POST /user/submit-tx` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubmitTxResponse {
    Relayed {
        #[serde(rename = "txHash")]
        tx_hash: String,
    },
    Failed {
        error: ErrorBody,
    },
}

/// `POST /stake/transaction` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterStakeRequest {
    #[serde(rename = "txId")]
    pub tx_id: String,
    pub stake_method: StakeMethod,
}

/// `POST /stake/transaction` response.
///
/// Only `{"success": true}` means the ledger recorded the hash.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RegisterStakeResponse {
    Failed { error: ErrorBody },
    Recorded {
        success: bool,
        #[serde(default)]
        message: Option<String>,
    },
}

impl RegisterStakeResponse {
    pub fn is_recorded(&self) -> bool {
        matches!(self, RegisterStakeResponse::Recorded { success: true, .. })
    }
}

/// Backend error payloads come either as a bare string or as
/// `{error, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Message(String),
    Detailed {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl ErrorBody {
    /// The most specific human-readable text available.
    pub fn message(&self) -> String {
        match self {
            ErrorBody::Message(m) => m.clone(),
            ErrorBody::Detailed { error, message } => match (message, error) {
                (Some(m), _) if !m.is_empty() => m.clone(),
                (_, Some(e)) if !e.is_empty() => e.clone(),
                _ => "request rejected".to_string(),
            },
        }
    }
}

/// A wallet registered to a member's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub p_wallet_id: String,
    #[serde(default)]
    pub customer_id: Option<u64>,
}

/// `GET /wallet/list` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletList {
    #[serde(default)]
    pub active: Vec<WalletRecord>,
    #[serde(default)]
    pub pending: Vec<WalletRecord>,
}

/// `GET /user/wallet-balance` response, in micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WalletBalance {
    pub balance: u64,
}

/// One row of `GET /stake/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeTransaction {
    pub network_txn_id: String,
    #[serde(default)]
    pub verification_desc: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_method_wire_names() {
        let body = RegisterStakeRequest {
            tx_id: "deadbeef".into(),
            stake_method: StakeMethod::WalletIntegration,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"txId":"deadbeef","stake_method":"Wallet Integration"}"#
        );
        assert_eq!(
            serde_json::to_string(&StakeMethod::TransactionHashEntry).unwrap(),
            "\"Transaction Hash Entry\""
        );
    }

    #[test]
    fn submit_response_variants() {
        let ok: SubmitTxResponse = serde_json::from_str(r#"{"txHash":"abc"}"#).unwrap();
        assert_eq!(ok, SubmitTxResponse::Relayed { tx_hash: "abc".into() });

        let err: SubmitTxResponse = serde_json::from_str(r#"{"error":"nonce too low"}"#).unwrap();
        match err {
            SubmitTxResponse::Failed { error } => assert_eq!(error.message(), "nonce too low"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn register_response_variants() {
        let ok: RegisterStakeResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ok.is_recorded());

        let refused: RegisterStakeResponse = serde_json::from_str(r#"{"success":false,"message":"duplicate"}"#).unwrap();
        assert!(!refused.is_recorded());

        assert!(serde_json::from_str::<RegisterStakeResponse>(r#"{"message":"duplicate"}"#).is_err());
        assert!(serde_json::from_str::<RegisterStakeResponse>("{}").is_err());

        let err: RegisterStakeResponse =
            serde_json::from_str(r#"{"error":{"error":"DUPLICATE","message":"hash already registered"}}"#).unwrap();
        match err {
            RegisterStakeResponse::Failed { error } => assert_eq!(error.message(), "hash already registered"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn error_body_falls_back() {
        let body = ErrorBody::Detailed {
            error: Some("FORBIDDEN".into()),
            message: None,
        };
        assert_eq!(body.message(), "FORBIDDEN");
        let empty = ErrorBody::Detailed { error: None, message: None };
        assert_eq!(empty.message(), "request rejected");
    }

    #[test]
    fn wallet_list_tolerates_extra_fields() {
        let json = r#"{
            "active": [{"p_wallet_id": "0xABC", "customer_id": 42, "label": "main"}],
            "pending": []
        }"#;
        let list: WalletList = serde_json::from_str(json).unwrap();
        assert_eq!(list.active[0].p_wallet_id, "0xABC");
        assert_eq!(list.active[0].customer_id, Some(42));
        assert!(list.pending.is_empty());
    }
}
