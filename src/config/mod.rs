//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PoolstakeConfig (validated, immutable)
//!     → passed by reference into each subsystem constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets (access token, keys, passphrases) never live in the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::PoolstakeConfig;
pub use schema::ApiConfig;
pub use schema::PoolConfig;
pub use schema::AccountConfig;
pub use schema::BlockchainConfig;
pub use schema::ReconcileConfig;
pub use schema::ObservabilityConfig;
