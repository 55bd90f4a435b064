//! Failure injection tests for the stake submission path and status polling.

use alloy::primitives::Bytes;
use alloy::signers::local::PrivateKeySigner;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use poolstake::api::BackendClient;
use poolstake::blockchain::transaction::TransferSigner;
use poolstake::blockchain::types::{SignedTransaction, SigningError};
use poolstake::lifecycle::Shutdown;
use poolstake::reconcile::{LedgerStatus, ReconcileOutcome, StatusReconciler};
use poolstake::session::AuthSession;
use poolstake::staking::{
    Coordinator, CoordinatorConfig, SubmissionError, SubmissionPhase, SubmissionState, TransferIntent,
};
use poolstake::wallet::import_from_private_key;

mod common;

const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const POOL: &str = "0x8a4cd5b1b1e6b7a5b6c2d5f0c3e8d1f7a9e0b4c6";

#[derive(Clone, Default)]
struct CountingSigner {
    signs: Arc<AtomicUsize>,
}

impl TransferSigner for CountingSigner {
    async fn build_and_sign(
        &self,
        _key: &PrivateKeySigner,
        _intent: &TransferIntent,
    ) -> Result<SignedTransaction, SigningError> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        Ok(SignedTransaction::new(Bytes::from_static(&[0xde, 0xad]), "deadbeef"))
    }
}

fn coordinator(backend: &common::MockBackend, signer: CountingSigner) -> Coordinator<BackendClient, CountingSigner> {
    let api = BackendClient::new(&backend.api_config(), AuthSession::with_token("member-token")).unwrap();
    Coordinator::new(
        api,
        signer,
        CoordinatorConfig {
            pool_address: POOL.parse().unwrap(),
            memo_max_len: 75,
            customer_id: 42,
        },
    )
}

/// Backend whose relay and register endpoints answer with the given replies.
async fn backend_with(relay: (u16, &'static str), register: (u16, &'static str)) -> common::MockBackend {
    common::start_programmable_backend(move |request| async move {
        let (status, body) = match request.path() {
            "/api/user/wallet-balance" => (200, r#"{"balance":10000000}"#),
            "/api/user/submit-tx" => relay,
            "/api/stake/transaction" => register,
            _ => (404, r#"{"error":"not found"}"#),
        };
        (status, body.to_string())
    })
    .await
}

#[tokio::test]
async fn test_relay_failure_never_registers() {
    let backend = backend_with((502, r#"{"error":"upstream node unavailable"}"#), (200, r#"{"success":true}"#)).await;
    let c = coordinator(&backend, CountingSigner::default());

    let identity = Arc::new(import_from_private_key(KEY, "session").unwrap());
    let intent = c.intent_for(&identity, 5_000_000, "test");
    let pending = c.prepare(identity, intent.clone()).await.unwrap();
    let failure = c.submit(pending.confirm(Some("session")).unwrap()).await.unwrap_err();

    assert!(matches!(failure.error, SubmissionError::Relay(_)));
    assert_eq!(failure.error.to_string(), "upstream node unavailable");
    assert!(matches!(failure.state, SubmissionState::Failed { at: SubmissionPhase::Relaying, .. }));
    assert_eq!(backend.requests_to("/user/submit-tx").len(), 1);
    assert!(backend.requests_to("/stake/transaction").is_empty());
    assert!(!c.is_in_flight(&intent));
}

#[tokio::test]
async fn test_registration_failure_reports_on_chain_success() {
    let backend = backend_with((200, r#"{"txHash":"deadbeef"}"#), (500, r#"{"error":"ledger offline"}"#)).await;
    let c = coordinator(&backend, CountingSigner::default());

    let identity = Arc::new(import_from_private_key(KEY, "session").unwrap());
    let intent = c.intent_for(&identity, 5_000_000, "test");
    let pending = c.prepare(identity, intent).await.unwrap();
    let failure = c.submit(pending.confirm(Some("session")).unwrap()).await.unwrap_err();

    assert!(failure.error.needs_support());
    let message = failure.error.to_string();
    assert!(message.contains("succeeded on-chain"));
    assert!(message.contains("deadbeef"));
    assert!(message.contains("ledger offline"));
    assert!(matches!(
        &failure.state,
        SubmissionState::Failed { at: SubmissionPhase::Registering, tx_hash: Some(h), .. } if h == "deadbeef"
    ));

    // Registration is attempted exactly once.
    assert_eq!(backend.requests_to("/stake/transaction").len(), 1);
}

#[tokio::test]
async fn test_unconfirmed_registration_is_not_settled() {
    for reply in [r#"{"success":false}"#, r#"{"message":"duplicate"}"#, ""] {
        let backend = backend_with((200, r#"{"txHash":"deadbeef"}"#), (200, reply)).await;
        let c = coordinator(&backend, CountingSigner::default());

        let identity = Arc::new(import_from_private_key(KEY, "session").unwrap());
        let intent = c.intent_for(&identity, 5_000_000, "test");
        let pending = c.prepare(identity, intent).await.unwrap();
        let failure = c.submit(pending.confirm(Some("session")).unwrap()).await.unwrap_err();

        assert!(failure.error.needs_support(), "reply {:?}", reply);
        assert!(matches!(
            &failure.state,
            SubmissionState::Failed { at: SubmissionPhase::Registering, tx_hash: Some(h), .. } if h == "deadbeef"
        ));
        assert_eq!(backend.requests_to("/stake/transaction").len(), 1);
    }
}

#[tokio::test]
async fn test_relay_without_hash_never_registers() {
    for reply in [r#"{"txHash":""}"#, r#"{"txHash":"pending"}"#] {
        let backend = backend_with((200, reply), (200, r#"{"success":true}"#)).await;
        let c = coordinator(&backend, CountingSigner::default());

        let identity = Arc::new(import_from_private_key(KEY, "session").unwrap());
        let intent = c.intent_for(&identity, 5_000_000, "test");
        let pending = c.prepare(identity, intent).await.unwrap();
        let failure = c.submit(pending.confirm(Some("session")).unwrap()).await.unwrap_err();

        assert!(matches!(failure.error, SubmissionError::Relay(_)), "reply {:?}", reply);
        assert!(matches!(failure.state, SubmissionState::Failed { at: SubmissionPhase::Relaying, .. }));
        assert!(backend.requests_to("/stake/transaction").is_empty());
    }
}

#[tokio::test]
async fn test_duplicate_submission_is_refused_while_in_flight() {
    let backend = common::start_programmable_backend(|request| async move {
        match request.path() {
            "/api/user/submit-tx" => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                (200, r#"{"txHash":"deadbeef"}"#.to_string())
            }
            "/api/user/wallet-balance" => (200, r#"{"balance":10000000}"#.to_string()),
            _ => (200, r#"{"success":true}"#.to_string()),
        }
    })
    .await;
    let signer = CountingSigner::default();
    let signs = signer.signs.clone();
    let c = coordinator(&backend, signer);

    let identity = Arc::new(import_from_private_key(KEY, "session").unwrap());
    let intent = c.intent_for(&identity, 5_000_000, "test");
    let first = c.prepare(identity.clone(), intent.clone()).await.unwrap();
    let second = c.prepare(identity, intent.clone()).await.unwrap();
    let first = first.confirm(Some("session")).unwrap();
    let second = second.confirm(Some("session")).unwrap();

    let (a, b) = tokio::join!(c.submit(first), c.submit(second));

    let (settled, refused): (Vec<_>, Vec<_>) = [a, b].into_iter().partition(|r| r.is_ok());
    assert_eq!(settled.len(), 1);
    assert_eq!(refused.len(), 1);
    let refusal = refused.into_iter().next().unwrap().unwrap_err();
    assert_eq!(refusal.error, SubmissionError::AlreadyInFlight);

    assert_eq!(signs.load(Ordering::SeqCst), 1);
    assert_eq!(backend.requests_to("/user/submit-tx").len(), 1);
    assert_eq!(backend.requests_to("/stake/transaction").len(), 1);
    assert!(!c.is_in_flight(&intent));
}

#[tokio::test]
async fn test_polling_stops_on_shutdown() {
    let backend = common::start_programmable_backend(|_| async { (200, "[]".to_string()) }).await;
    let auth = AuthSession::with_token("member-token");
    let api = BackendClient::new(&backend.api_config(), auth.clone()).unwrap();
    let reconciler = StatusReconciler::new(api, auth, 42, Duration::from_millis(50));

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move { reconciler.run("deadbeef", signal).await });

    tokio::time::sleep(Duration::from_millis(180)).await;
    shutdown.trigger();
    let outcome = tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    assert_eq!(outcome, ReconcileOutcome::Cancelled);

    let polls = backend.requests().len();
    assert!(polls >= 2, "expected several polls, saw {}", polls);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.requests().len(), polls);
}

#[tokio::test]
async fn test_polling_stops_on_sign_out() {
    let backend = common::start_programmable_backend(|_| async {
        (200, r#"[{"network_txn_id":"deadbeef","verification_desc":"Pending review"}]"#.to_string())
    })
    .await;
    let auth = AuthSession::with_token("member-token");
    let api = BackendClient::new(&backend.api_config(), auth.clone()).unwrap();
    let reconciler = StatusReconciler::new(api, auth.clone(), 42, Duration::from_millis(50));

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move { reconciler.run("deadbeef", signal).await });

    tokio::time::sleep(Duration::from_millis(120)).await;
    auth.sign_out();
    let outcome = tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    assert_eq!(outcome, ReconcileOutcome::Deauthenticated);

    let polls = backend.requests().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.requests().len(), polls);
}

#[tokio::test]
async fn test_polling_survives_errors_until_verified() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let backend = common::start_programmable_backend(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            match n {
                0 => (503, String::new()),
                1 => (200, "[]".to_string()),
                _ => (200, r#"[{"network_txn_id":"0xDEADBEEF","verification_desc":"Verified"}]"#.to_string()),
            }
        }
    })
    .await;
    let auth = AuthSession::with_token("member-token");
    let api = BackendClient::new(&backend.api_config(), auth.clone()).unwrap();
    let reconciler = StatusReconciler::new(api, auth, 42, Duration::from_millis(30));

    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(Duration::from_secs(5), reconciler.run("deadbeef", shutdown.subscribe()))
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Settled(LedgerStatus::Verified));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
