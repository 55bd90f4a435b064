//! Staking-pool wallet client.
//!
//! # Architecture Overview
//!
//! ```text
//!   keyfile / raw key
//!         │
//!         ▼
//!   ┌───────────┐  GET /wallet/list   ┌───────────┐
//!   │  wallet   │────────────────────▶│  session  │  identity slot + access token
//!   │  import   │   classify_wallet   └─────┬─────┘
//!   └───────────┘                           │
//!                                           ▼
//!   ┌────────────────────────────────────────────────────────────┐
//!   │ staking::Coordinator                                       │
//!   │   prepare → confirm → sign → relay → register → settled    │
//!   │               │         │       │        │                 │
//!   │               │   blockchain   api      api                │
//!   │               │  TransferSigner POST /user/submit-tx       │
//!   │               │                 POST /stake/transaction    │
//!   └────────────────────────────────────────────────────────────┘
//!                                           │
//!                                           ▼
//!   reconcile::StatusReconciler   GET /stake/transactions every interval
//!                                 until verified/failed, shutdown or sign-out
//! ```
//!
//! Cross-cutting: `config` (TOML + validation), `observability` (tracing,
//! metrics), `lifecycle` (shutdown signal for background polling).

// Core subsystems
pub mod api;
pub mod blockchain;
pub mod reconcile;
pub mod session;
pub mod staking;
pub mod wallet;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::PoolstakeConfig;
pub use lifecycle::Shutdown;
pub use staking::Coordinator;
