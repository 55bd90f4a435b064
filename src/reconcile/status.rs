//! Ledger verification status.

use std::fmt;

/// Where the stake ledger says a transaction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerStatus {
    Pending,
    Verified,
    Failed,
}

const FAILED_MARKERS: &[&str] = &["fail", "reject", "invalid", "error", "denied"];
const VERIFIED_MARKERS: &[&str] = &["verified", "success", "confirmed", "complete", "approved"];
const NEGATED_MARKERS: &[&str] = &["unverified", "not verified", "unconfirmed", "not confirmed", "incomplete"];

impl LedgerStatus {
    /// Map the backend's free-text `verification_desc`.
    ///
    /// Unrecognised or empty text is pending.
    pub fn from_description(description: &str) -> Self {
        let text = description.trim().to_ascii_lowercase();
        if FAILED_MARKERS.iter().any(|m| text.contains(m)) {
            return LedgerStatus::Failed;
        }
        if NEGATED_MARKERS.iter().any(|m| text.contains(m)) {
            return LedgerStatus::Pending;
        }
        if VERIFIED_MARKERS.iter().any(|m| text.contains(m)) {
            return LedgerStatus::Verified;
        }
        LedgerStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LedgerStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Pending => "pending",
            LedgerStatus::Verified => "verified",
            LedgerStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
