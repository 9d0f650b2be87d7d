//! Winner advancement and reversal for single-elimination brackets.
//!
//! Propagation always targets a different matchup than the one that
//! triggered it, so every write here is its own compare-and-swap against
//! the destination's current version, retried once on a miss. A propagation
//! failure after the triggering result was committed is surfaced as a
//! partial success, never as a transport error: the primary result stands
//! and propagation is safe to replay.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{BracketSlot, MatchupEntity, TournamentEntity, TournamentFormat},
    },
    error::ServiceError,
    services::slots,
};

/// Outcome of advancing a winner into the next round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    /// The format has no propagation or the result was a tie.
    NotApplicable,
    /// The source matchup is the terminal one; there is nothing to feed.
    Terminal,
    /// The winner occupies its destination slot.
    Advanced {
        /// Destination matchup as currently stored.
        destination: MatchupEntity,
        /// Whether the destination was created by this propagation.
        created: bool,
    },
    /// The destination write failed; the bracket may need manual repair.
    Failed {
        /// Why the destination could not be written.
        detail: String,
    },
}

/// Highest round this tournament can reach: the natural bracket height,
/// possibly capped by the configured round limit.
pub fn round_limit(tournament: &TournamentEntity, matches: &[MatchupEntity]) -> u32 {
    let round_one = matches.iter().filter(|matchup| matchup.round == 1).count();
    let natural = slots::natural_round_count(round_one);
    tournament.max_rounds.map_or(natural, |max| max.min(natural))
}

/// Place `winner` into round `R+1`, match `ceil(M/2)`, slot `1 - (M % 2)`,
/// creating the destination when absent. Calling this twice with the same
/// winner leaves the destination unchanged.
pub async fn propagate(
    store: &Arc<dyn MatchStore>,
    tournament: &TournamentEntity,
    matches: &[MatchupEntity],
    source: &MatchupEntity,
    winner: Uuid,
) -> Propagation {
    if tournament.format != TournamentFormat::Single {
        return Propagation::NotApplicable;
    }
    if source.round >= round_limit(tournament, matches) {
        return Propagation::Terminal;
    }

    let Some(slot_index) = source.slot_of(winner) else {
        return Propagation::Failed {
            detail: format!("winner `{winner}` does not occupy a slot of the source matchup"),
        };
    };
    let winner_slot = source.slots[slot_index].clone();

    let destination_round = source.round + 1;
    let destination_number = slots::destination_match(source.match_number);
    let destination_slot = slots::destination_slot(source.match_number);

    // One creation attempt, then up to two CAS update attempts against
    // whatever is stored (covers a concurrent creation racing ours).
    for attempt in 0..2 {
        let existing = match store
            .find_match_at(source.tournament_id, destination_round, destination_number)
            .await
        {
            Ok(existing) => existing,
            Err(err) => {
                return Propagation::Failed {
                    detail: err.to_string(),
                };
            }
        };

        match existing {
            None => {
                let mut created_slots = [BracketSlot::placeholder(), BracketSlot::placeholder()];
                created_slots[destination_slot] = BracketSlot {
                    score: None,
                    ..winner_slot.clone()
                };
                let destination = MatchupEntity::new(
                    source.tournament_id,
                    destination_round,
                    destination_number,
                    created_slots,
                );
                match store.insert_matches(vec![destination.clone()]).await {
                    Ok(()) => {
                        return Propagation::Advanced {
                            destination,
                            created: true,
                        };
                    }
                    Err(err) if err.is_conflict() && attempt == 0 => {
                        // Lost the creation race; update the winner's copy.
                        continue;
                    }
                    Err(err) => {
                        return Propagation::Failed {
                            detail: err.to_string(),
                        };
                    }
                }
            }
            Some(mut destination) => {
                if destination.slots[destination_slot].player_id == Some(winner) {
                    return Propagation::Advanced {
                        destination,
                        created: false,
                    };
                }

                destination.slots[destination_slot] = BracketSlot {
                    score: Some(0),
                    ..winner_slot.clone()
                };
                destination.updated_at = std::time::SystemTime::now();
                match store.update_match(destination).await {
                    Ok(stored) => {
                        return Propagation::Advanced {
                            destination: stored,
                            created: false,
                        };
                    }
                    Err(err) if err.is_conflict() && attempt == 0 => continue,
                    Err(err) => {
                        return Propagation::Failed {
                            detail: err.to_string(),
                        };
                    }
                }
            }
        }
    }

    Propagation::Failed {
        detail: "destination kept changing concurrently".into(),
    }
}

/// Reverse a previous propagation: clear `previous_winner` out of the
/// destination slot back to a placeholder. Refused when the destination has
/// itself recorded a result (the source matchup is locked); clearing that
/// downstream result first re-opens the path one level at a time.
pub async fn retract(
    store: &Arc<dyn MatchStore>,
    source: &MatchupEntity,
    previous_winner: Uuid,
) -> Result<Option<MatchupEntity>, ServiceError> {
    let destination_round = source.round + 1;
    let destination_number = slots::destination_match(source.match_number);
    let destination_slot = slots::destination_slot(source.match_number);

    for attempt in 0..2 {
        let Some(mut destination) = store
            .find_match_at(source.tournament_id, destination_round, destination_number)
            .await?
        else {
            return Ok(None);
        };

        if destination.slots[destination_slot].player_id != Some(previous_winner) {
            // Nothing of ours to undo.
            return Ok(Some(destination));
        }

        if destination.is_decided() {
            return Err(ServiceError::InvalidState(format!(
                "matchup `{}` is locked: round {} match {} already recorded a result",
                source.id, destination.round, destination.match_number
            )));
        }

        destination.slots[destination_slot] = BracketSlot::placeholder();
        destination.updated_at = std::time::SystemTime::now();
        match store.update_match(destination).await {
            Ok(stored) => return Ok(Some(stored)),
            Err(err) if err.is_conflict() && attempt == 0 => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Conflict(
        "destination matchup kept changing concurrently".into(),
    ))
}

/// Log a failed propagation; the caller still reports the primary success.
pub fn warn_on_failure(source: &MatchupEntity, propagation: &Propagation) {
    if let Propagation::Failed { detail } = propagation {
        warn!(
            match_id = %source.id,
            round = source.round,
            match_number = source.match_number,
            detail,
            "winner propagation failed after the result was committed"
        );
    }
}
