//! Re-entrancy guard for submissions.
//!
//! A submission holds an [`InFlightGuard`] from signing until it settles or
//! fails. A second submission of an identical intent is refused while the
//! guard is held; distinct intents proceed independently.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::staking::intent::TransferIntent;

/// Intents currently being signed, relayed or registered.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    inner: Arc<DashMap<TransferIntent, Uuid>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `intent` for `submission_id`. Returns `None` if another
    /// submission already holds it.
    pub fn try_acquire(&self, intent: &TransferIntent, submission_id: Uuid) -> Option<InFlightGuard> {
        match self.inner.entry(intent.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(submission_id);
                Some(InFlightGuard {
                    set: self.inner.clone(),
                    intent: intent.clone(),
                    submission_id,
                })
            }
        }
    }

    pub fn contains(&self, intent: &TransferIntent) -> bool {
        self.inner.contains_key(intent)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Releases the intent when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    set: Arc<DashMap<TransferIntent, Uuid>>,
    intent: TransferIntent,
    submission_id: Uuid,
}

impl InFlightGuard {
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove_if(&self.intent, |_, owner| *owner == self.submission_id);
    }
}
