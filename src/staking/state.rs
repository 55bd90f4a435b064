//! Submission state machine.
//!
//! ```text
//! Idle → AwaitingConfirmation → Signing → Relaying → Registering → Settled
//!                                  ↓          ↓           ↓
//!                                Failed     Failed      Failed
//! ```
//!
//! `transition` is pure: it only decides whether an event is legal in the
//! current state and what the next state is. The coordinator performs the IO.

use std::fmt;
use thiserror::Error;

/// Phases that perform a network or signing call and so can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionPhase {
    Signing,
    Relaying,
    Registering,
}

impl SubmissionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionPhase::Signing => "signing",
            SubmissionPhase::Relaying => "relaying",
            SubmissionPhase::Registering => "registering",
        }
    }
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    AwaitingConfirmation,
    Signing,
    Relaying,
    /// Relay returned `tx_hash`; the ledger has not recorded it yet.
    Registering { tx_hash: String },
    Settled { tx_hash: String },
    /// Terminal. `tx_hash` is set when the transfer reached the network.
    Failed {
        at: SubmissionPhase,
        reason: String,
        tx_hash: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// Amount and destination passed validation.
    IntentAccepted,
    /// The member confirmed the irreversible send.
    Confirmed,
    Signed,
    Relayed { tx_hash: String },
    Registered,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event {event} is not valid in state {state}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl SubmissionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionEvent::IntentAccepted => "intent_accepted",
            SubmissionEvent::Confirmed => "confirmed",
            SubmissionEvent::Signed => "signed",
            SubmissionEvent::Relayed { .. } => "relayed",
            SubmissionEvent::Registered => "registered",
            SubmissionEvent::Failed { .. } => "failed",
        }
    }
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::AwaitingConfirmation => "awaiting_confirmation",
            SubmissionState::Signing => "signing",
            SubmissionState::Relaying => "relaying",
            SubmissionState::Registering { .. } => "registering",
            SubmissionState::Settled { .. } => "settled",
            SubmissionState::Failed { .. } => "failed",
        }
    }

    /// The failable phase this state represents, if any.
    pub fn phase(&self) -> Option<SubmissionPhase> {
        match self {
            SubmissionState::Signing => Some(SubmissionPhase::Signing),
            SubmissionState::Relaying => Some(SubmissionPhase::Relaying),
            SubmissionState::Registering { .. } => Some(SubmissionPhase::Registering),
            _ => None,
        }
    }

    /// Signing, relaying or registering: the submit action must stay disabled.
    pub fn is_in_flight(&self) -> bool {
        self.phase().is_some()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Settled { .. } | SubmissionState::Failed { .. })
    }

    /// Apply `event`, returning the next state.
    pub fn transition(&self, event: SubmissionEvent) -> Result<SubmissionState, InvalidTransition> {
        use SubmissionEvent as E;
        use SubmissionState as S;

        let next = match (self, event) {
            (S::Idle, E::IntentAccepted) => S::AwaitingConfirmation,
            (S::AwaitingConfirmation, E::Confirmed) => S::Signing,
            (S::Signing, E::Signed) => S::Relaying,
            (S::Relaying, E::Relayed { tx_hash }) => S::Registering { tx_hash },
            (S::Registering { tx_hash }, E::Registered) => S::Settled {
                tx_hash: tx_hash.clone(),
            },
            (state, E::Failed { reason }) if state.is_in_flight() => {
                let tx_hash = match state {
                    S::Registering { tx_hash } => Some(tx_hash.clone()),
                    _ => None,
                };
                S::Failed {
                    at: state.phase().unwrap_or(SubmissionPhase::Signing),
                    reason,
                    tx_hash,
                }
            }
            (state, event) => {
                return Err(InvalidTransition {
                    state: state.name(),
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail(reason: &str) -> SubmissionEvent {
        SubmissionEvent::Failed { reason: reason.into() }
    }

    #[test]
    fn happy_path() {
        let s = SubmissionState::Idle;
        let s = s.transition(SubmissionEvent::IntentAccepted).unwrap();
        assert_eq!(s, SubmissionState::AwaitingConfirmation);
        let s = s.transition(SubmissionEvent::Confirmed).unwrap();
        assert!(s.is_in_flight());
        let s = s.transition(SubmissionEvent::Signed).unwrap();
        assert_eq!(s, SubmissionState::Relaying);
        let s = s
            .transition(SubmissionEvent::Relayed {
                tx_hash: "deadbeef".into(),
            })
            .unwrap();
        let s = s.transition(SubmissionEvent::Registered).unwrap();
        assert_eq!(
            s,
            SubmissionState::Settled {
                tx_hash: "deadbeef".into()
            }
        );
        assert!(s.is_terminal());
    }

    #[test]
    fn failures_record_phase() {
        let failed = SubmissionState::Signing.transition(fail("insufficient balance")).unwrap();
        assert_eq!(
            failed,
            SubmissionState::Failed {
                at: SubmissionPhase::Signing,
                reason: "insufficient balance".into(),
                tx_hash: None,
            }
        );

        let failed = SubmissionState::Relaying.transition(fail("nonce too low")).unwrap();
        assert!(matches!(failed, SubmissionState::Failed { at: SubmissionPhase::Relaying, .. }));
    }

    #[test]
    fn registration_failure_keeps_hash() {
        let registering = SubmissionState::Registering { tx_hash: "abc".into() };
        match registering.transition(fail("ledger down")).unwrap() {
            SubmissionState::Failed { at, tx_hash, .. } => {
                assert_eq!(at, SubmissionPhase::Registering);
                assert_eq!(tx_hash.as_deref(), Some("abc"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cannot_skip_phases() {
        // Register before relay.
        assert!(SubmissionState::Signing.transition(SubmissionEvent::Registered).is_err());
        // Sign before confirmation.
        assert!(SubmissionState::Idle.transition(SubmissionEvent::Confirmed).is_err());
        assert!(SubmissionState::AwaitingConfirmation.transition(SubmissionEvent::Signed).is_err());
        assert!(SubmissionState::Relaying.transition(SubmissionEvent::Registered).is_err());
    }

    #[test]
    fn only_in_flight_states_fail() {
        for state in [SubmissionState::Idle, SubmissionState::AwaitingConfirmation] {
            let err = state.transition(fail("x")).unwrap_err();
            assert_eq!(err.event, "failed");
        }
    }

    #[test]
    fn terminal_states_are_final() {
        let settled = SubmissionState::Settled { tx_hash: "a".into() };
        let failed = SubmissionState::Failed {
            at: SubmissionPhase::Relaying,
            reason: "x".into(),
            tx_hash: None,
        };
        for state in [settled, failed] {
            assert!(state.transition(SubmissionEvent::IntentAccepted).is_err());
            assert!(state.transition(fail("again")).is_err());
        }
    }
}
