use thiserror::Error;

use crate::dao::models::MatchupEntity;

/// Lifecycle phase of a matchup's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// No winner and no tie recorded yet.
    Open,
    /// A winner or tie is recorded; still editable.
    Decided,
    /// A downstream matchup has itself recorded a result; edits are
    /// refused until that downstream result is cleared first.
    Locked,
}

/// Result-affecting events applied to a matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultEvent {
    /// Record a winner or tie (direct edit or accepted score report).
    Declare,
    /// Clear the recorded result back to open.
    Clear,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The phase the matchup was in when the invalid event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: ResultEvent,
}

/// Compute a matchup's current phase from its own result and the state of
/// the matchup its winner feeds into (elimination only; pass `None` for
/// formats without propagation).
pub fn phase_of(matchup: &MatchupEntity, downstream: Option<&MatchupEntity>) -> MatchPhase {
    if !matchup.is_decided() {
        MatchPhase::Open
    } else if downstream.is_some_and(MatchupEntity::is_decided) {
        MatchPhase::Locked
    } else {
        MatchPhase::Decided
    }
}

/// The single transition function consulted by every result-mutating
/// command. Re-declaring over an editable result is allowed (the caller
/// retracts the previous propagation first); everything on a locked
/// matchup is refused.
pub fn transition(from: MatchPhase, event: ResultEvent) -> Result<MatchPhase, InvalidTransition> {
    match (from, event) {
        (MatchPhase::Open, ResultEvent::Declare) => Ok(MatchPhase::Decided),
        (MatchPhase::Decided, ResultEvent::Declare) => Ok(MatchPhase::Decided),
        (MatchPhase::Decided, ResultEvent::Clear) => Ok(MatchPhase::Open),
        (from, event) => Err(InvalidTransition { from, event }),
    }
}
