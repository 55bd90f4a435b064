//! Per-member session state: the backend access token and the imported
//! signing identity. Both live in memory only.

pub mod auth;
pub mod staking;

pub use auth::AuthSession;
pub use staking::{AdoptError, StakingSession};
