//! Handoff lifecycle state machine
//!
//! `Pending → Validating → Valid | Invalid`. An invalid payload with
//! correction allowed moves through `Correcting → Validating` rounds until it
//! is `Corrected` or `Failed`. [`transition`] is pure; the validator drives it
//! and performs the side effects.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every allowed correction attempt ran without producing a valid payload
    AttemptsExhausted,
    /// The validation deadline passed during correction
    Timeout,
}

impl FailureReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandoffState {
    Pending,
    /// `attempt` is 0 for the original payload, else the correction that
    /// produced the candidate under validation
    Validating { attempt: u32 },
    Valid,
    Invalid,
    Correcting { attempt: u32 },
    Corrected,
    Failed(FailureReason),
}

impl HandoffState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validating { .. } => "validating",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Correcting { .. } => "correcting",
            Self::Corrected => "corrected",
            Self::Failed(_) => "failed",
        }
    }

    /// True for states no further event leaves, except that `Invalid` still
    /// accepts [`HandoffEvent::BeginCorrection`]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Valid | Self::Invalid | Self::Corrected | Self::Failed(_)
        )
    }

    /// True for states whose payload may cross the boundary
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Valid | Self::Corrected)
    }
}

impl fmt::Display for HandoffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validating { attempt } if *attempt > 0 => {
                write!(f, "validating (candidate {attempt})")
            }
            Self::Correcting { attempt } => write!(f, "correcting (attempt {attempt})"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for HandoffState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandoffEvent {
    Start,
    /// The validator found no critical error
    Passed,
    /// The validator found at least one critical error
    Rejected,
    BeginCorrection,
    /// The corrector returned a candidate object
    CandidateReceived,
    /// The corrector failed or returned nothing usable
    NoCandidate,
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid handoff transition from {from} on {event:?}")]
pub struct TransitionError {
    pub from: HandoffState,
    pub event: HandoffEvent,
}

/// Next state for `event`, given at most `max_attempts` corrections.
///
/// A rejected candidate or a missing one moves straight to the next
/// correction attempt, or to `Failed(AttemptsExhausted)` once
/// `max_attempts` have run.
pub fn transition(
    state: HandoffState,
    event: HandoffEvent,
    max_attempts: u32,
) -> Result<HandoffState, TransitionError> {
    use HandoffEvent as E;
    use HandoffState as S;

    let next_attempt = |attempt: u32| {
        if attempt < max_attempts {
            S::Correcting {
                attempt: attempt + 1,
            }
        } else {
            S::Failed(FailureReason::AttemptsExhausted)
        }
    };

    let next = match (state, event) {
        (S::Pending, E::Start) => S::Validating { attempt: 0 },
        (S::Validating { attempt: 0 }, E::Passed) => S::Valid,
        (S::Validating { .. }, E::Passed) => S::Corrected,
        (S::Validating { attempt: 0 }, E::Rejected) => S::Invalid,
        (S::Validating { attempt }, E::Rejected) => next_attempt(attempt),
        (S::Invalid, E::BeginCorrection) => next_attempt(0),
        (S::Correcting { attempt }, E::CandidateReceived) => S::Validating { attempt },
        (S::Correcting { attempt }, E::NoCandidate) => next_attempt(attempt),
        (S::Validating { .. } | S::Correcting { .. }, E::DeadlineExceeded) => {
            S::Failed(FailureReason::Timeout)
        }
        (from, event) => return Err(TransitionError { from, event }),
    };
    Ok(next)
}
