//! Result-event pipeline: direct organizer edits of a matchup result and
//! the shared commit path used by score report acceptance.
//!
//! Every mutation consults the matchup phase machine, then writes through
//! the store's compare-and-swap. Propagation runs only after the primary
//! write succeeded; its failure is surfaced in the response, never as a
//! transport error.

use std::{sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{
            MatchupEntity, ReportedScore, TournamentEntity, TournamentFormat, TournamentStatus,
        },
    },
    dto::{
        common::MatchupView,
        organizer::{
            ClearResultResponse, DeclareResultRequest, DeclareResultResponse, PropagationView,
        },
    },
    error::ServiceError,
    services::{
        elimination::{self, Propagation},
        slots, sse_events,
    },
    state::{
        SharedState,
        match_phase::{self, MatchPhase, ResultEvent},
    },
};

/// Authoritative outcome applied to a matchup.
#[derive(Debug, Clone)]
pub struct ResultOutcome {
    /// Winning player; `None` for a tie.
    pub winner: Option<Uuid>,
    /// Whether the matchup ended in a tie.
    pub is_tie: bool,
    /// Scores recorded on the slots.
    pub scores: Vec<ReportedScore>,
}

/// Declare a winner or tie directly on a matchup (organizer edit).
pub async fn declare_result(
    state: &SharedState,
    match_id: Uuid,
    request: DeclareResultRequest,
) -> Result<DeclareResultResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let matchup = load_matchup(&store, match_id).await?;
    let tournament = load_tournament(&store, matchup.tournament_id).await?;

    let outcome = ResultOutcome {
        winner: request.winner,
        is_tie: request.is_tie,
        scores: request
            .scores
            .iter()
            .map(|entry| ReportedScore {
                player_id: entry.player_id,
                score: entry.score,
            })
            .collect(),
    };

    let (stored, propagation) = commit_result(&store, &tournament, matchup, outcome).await?;

    let phase = phase_after_commit(&stored, &propagation);
    let view = MatchupView::with_phase(stored, phase);
    let propagation_view: PropagationView = propagation.into();
    sse_events::broadcast_match_updated(state, view.clone(), Some(propagation_view.clone()));

    Ok(DeclareResultResponse {
        matchup: view,
        propagation: propagation_view,
    })
}

/// Clear a recorded result back to open, retracting any propagated winner
/// one hop. Refused while the matchup is locked by a decided downstream
/// result.
pub async fn clear_result(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ClearResultResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let mut matchup = load_matchup(&store, match_id).await?;
    let tournament = load_tournament(&store, matchup.tournament_id).await?;
    ensure_started(&tournament)?;

    let matches = store.list_matches(tournament.id).await?;
    let downstream = if tournament.format == TournamentFormat::Single {
        slots::downstream_of(&matches, &matchup)
    } else {
        None
    };
    let phase = match_phase::phase_of(&matchup, downstream);
    match_phase::transition(phase, ResultEvent::Clear)?;

    if tournament.format == TournamentFormat::Single {
        if let Some(previous) = matchup.winner {
            elimination::retract(&store, &matchup, previous).await?;
        }
    }

    matchup.winner = None;
    matchup.is_tie = false;
    for slot in &mut matchup.slots {
        slot.score = None;
    }
    matchup.updated_at = SystemTime::now();

    let stored = store.update_match(matchup).await?;
    let view = MatchupView::with_phase(stored, MatchPhase::Open);
    sse_events::broadcast_match_updated(state, view.clone(), None);

    Ok(ClearResultResponse { matchup: view })
}

/// Commit an authoritative outcome onto a matchup: phase check, validation,
/// retraction of a superseded winner, compare-and-swap write, propagation.
pub(crate) async fn commit_result(
    store: &Arc<dyn MatchStore>,
    tournament: &TournamentEntity,
    mut matchup: MatchupEntity,
    outcome: ResultOutcome,
) -> Result<(MatchupEntity, Propagation), ServiceError> {
    ensure_started(tournament)?;
    validate_outcome(&matchup, &outcome, tournament)?;

    let matches = store.list_matches(tournament.id).await?;
    let downstream = if tournament.format == TournamentFormat::Single {
        slots::downstream_of(&matches, &matchup)
    } else {
        None
    };
    let phase = match_phase::phase_of(&matchup, downstream);
    match_phase::transition(phase, ResultEvent::Declare)?;

    // Reversal: editing away from a previously propagated winner clears the
    // destination slot before the new result lands.
    if tournament.format == TournamentFormat::Single {
        if let Some(previous) = matchup.winner {
            if outcome.winner != Some(previous) {
                elimination::retract(store, &matchup, previous).await?;
            }
        }
    }

    matchup.winner = outcome.winner;
    matchup.is_tie = outcome.is_tie;
    for slot in &mut matchup.slots {
        slot.score = slot
            .player_id
            .and_then(|player| {
                outcome
                    .scores
                    .iter()
                    .find(|entry| entry.player_id == player)
            })
            .map(|entry| entry.score);
    }
    matchup.updated_at = SystemTime::now();

    let stored = store.update_match(matchup).await?;

    let propagation = match (tournament.format, stored.winner) {
        (TournamentFormat::Single, Some(winner)) => {
            let outcome =
                elimination::propagate(store, tournament, &matches, &stored, winner).await;
            elimination::warn_on_failure(&stored, &outcome);
            outcome
        }
        _ => Propagation::NotApplicable,
    };

    Ok((stored, propagation))
}

/// Phase of a just-committed matchup, given its propagation outcome.
pub(crate) fn phase_after_commit(stored: &MatchupEntity, propagation: &Propagation) -> MatchPhase {
    match propagation {
        Propagation::Advanced { destination, .. } => {
            match_phase::phase_of(stored, Some(destination))
        }
        _ => match_phase::phase_of(stored, None),
    }
}

fn ensure_started(tournament: &TournamentEntity) -> Result<(), ServiceError> {
    if tournament.status != TournamentStatus::Started {
        return Err(ServiceError::InvalidState(format!(
            "tournament `{}` is not running (status {:?})",
            tournament.id, tournament.status
        )));
    }
    Ok(())
}

fn validate_outcome(
    matchup: &MatchupEntity,
    outcome: &ResultOutcome,
    tournament: &TournamentEntity,
) -> Result<(), ServiceError> {
    if let Some(winner) = outcome.winner {
        if matchup.slot_of(winner).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "player `{winner}` does not participate in matchup `{}`",
                matchup.id
            )));
        }
    }

    for entry in &outcome.scores {
        if matchup.slot_of(entry.player_id).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "score for player `{}` who does not participate in matchup `{}`",
                entry.player_id, matchup.id
            )));
        }
    }

    if let Some(threshold) = tournament.settings.auto_win_score {
        let reached: Vec<Uuid> = outcome
            .scores
            .iter()
            .filter(|entry| entry.score >= threshold)
            .map(|entry| entry.player_id)
            .collect();
        if let [single] = reached.as_slice() {
            if outcome.winner != Some(*single) {
                return Err(ServiceError::InvalidInput(format!(
                    "score {threshold} is an automatic win; the declared winner must be `{single}`"
                )));
            }
        }
    }

    Ok(())
}

pub(crate) async fn load_matchup(
    store: &Arc<dyn MatchStore>,
    match_id: Uuid,
) -> Result<MatchupEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("matchup `{match_id}` not found")))
}

pub(crate) async fn load_tournament(
    store: &Arc<dyn MatchStore>,
    tournament_id: Uuid,
) -> Result<TournamentEntity, ServiceError> {
    store
        .find_tournament(tournament_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("tournament `{tournament_id}` not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::memory::MemoryMatchStore,
            models::{BracketSlot, SlotKind, TournamentSettings},
        },
        dto::common::ScoreInput,
        state::AppState,
    };

    struct Fixture {
        state: SharedState,
        store: Arc<dyn MatchStore>,
        tournament: TournamentEntity,
        matches: Vec<MatchupEntity>,
    }

    fn slot(name: &str) -> BracketSlot {
        BracketSlot::player(Uuid::new_v4(), name.into(), SlotKind::LoggedIn)
    }

    async fn fixture(format: TournamentFormat, round_one: usize) -> Fixture {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn MatchStore> = Arc::new(MemoryMatchStore::new());
        state.set_match_store(store.clone()).await;

        let mut tournament = TournamentEntity::new(
            "cup".into(),
            format,
            None,
            TournamentSettings::default(),
        );
        tournament.status = TournamentStatus::Started;
        store
            .insert_tournament(tournament.clone())
            .await
            .expect("insert tournament");

        let matches: Vec<MatchupEntity> = (1..=round_one as u32)
            .map(|number| MatchupEntity::new(tournament.id, 1, number, [slot("a"), slot("b")]))
            .collect();
        store
            .insert_matches(matches.clone())
            .await
            .expect("seed matches");

        Fixture {
            state,
            store,
            tournament,
            matches,
        }
    }

    fn winner_request(winner: Uuid, score: i32) -> DeclareResultRequest {
        DeclareResultRequest {
            winner: Some(winner),
            is_tie: false,
            scores: vec![ScoreInput {
                player_id: winner,
                score,
            }],
        }
    }

    #[tokio::test]
    async fn declaring_a_winner_records_and_propagates() {
        let fx = fixture(TournamentFormat::Single, 4).await;
        let source = &fx.matches[0];
        let winner = source.slots[0].player_id.unwrap();

        let response = declare_result(&fx.state, source.id, winner_request(winner, 3))
            .await
            .expect("declare succeeds");

        assert_eq!(response.matchup.winner, Some(winner));
        assert_eq!(
            response.propagation.status,
            crate::dto::organizer::PropagationStatus::Advanced
        );
        let destination = response.propagation.destination.expect("destination view");
        assert_eq!(destination.round, 2);
        assert_eq!(destination.slots[0].player_id, Some(winner));
    }

    #[tokio::test]
    async fn redeclaring_a_different_winner_retracts_the_old_propagation() {
        let fx = fixture(TournamentFormat::Single, 4).await;
        let source = &fx.matches[0];
        let first = source.slots[0].player_id.unwrap();
        let second = source.slots[1].player_id.unwrap();

        declare_result(&fx.state, source.id, winner_request(first, 2))
            .await
            .expect("first declare");
        let response = declare_result(&fx.state, source.id, winner_request(second, 2))
            .await
            .expect("redeclare");

        let destination = response.propagation.destination.expect("destination view");
        assert_eq!(destination.slots[0].player_id, Some(second));
    }

    #[tokio::test]
    async fn a_decided_downstream_locks_the_source_matchup() {
        let fx = fixture(TournamentFormat::Single, 2).await;
        let left = &fx.matches[0];
        let right = &fx.matches[1];
        let left_winner = left.slots[0].player_id.unwrap();
        let right_winner = right.slots[0].player_id.unwrap();

        declare_result(&fx.state, left.id, winner_request(left_winner, 1))
            .await
            .expect("left declare");
        declare_result(&fx.state, right.id, winner_request(right_winner, 1))
            .await
            .expect("right declare");

        // Decide the final, locking both feeders.
        let final_match = fx
            .store
            .find_match_at(fx.tournament.id, 2, 1)
            .await
            .unwrap()
            .expect("final exists");
        declare_result(&fx.state, final_match.id, winner_request(left_winner, 5))
            .await
            .expect("final declare");

        let err = declare_result(&fx.state, left.id, winner_request(left_winner, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = clear_result(&fx.state, left.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn clearing_the_downstream_result_unlocks_the_feeder() {
        let fx = fixture(TournamentFormat::Single, 2).await;
        let left = &fx.matches[0];
        let right = &fx.matches[1];
        let left_winner = left.slots[0].player_id.unwrap();
        let right_winner = right.slots[0].player_id.unwrap();

        declare_result(&fx.state, left.id, winner_request(left_winner, 1))
            .await
            .unwrap();
        declare_result(&fx.state, right.id, winner_request(right_winner, 1))
            .await
            .unwrap();

        let final_match = fx
            .store
            .find_match_at(fx.tournament.id, 2, 1)
            .await
            .unwrap()
            .expect("final exists");
        declare_result(&fx.state, final_match.id, winner_request(left_winner, 5))
            .await
            .unwrap();

        clear_result(&fx.state, final_match.id)
            .await
            .expect("clearing the final succeeds");

        // The feeder is editable again and re-propagates its new winner.
        let second = left.slots[1].player_id.unwrap();
        let response = declare_result(&fx.state, left.id, winner_request(second, 4))
            .await
            .expect("feeder editable after downstream cleared");
        let destination = response.propagation.destination.expect("destination view");
        assert_eq!(destination.slots[0].player_id, Some(second));
    }

    #[tokio::test]
    async fn clearing_a_result_retracts_the_propagated_winner() {
        let fx = fixture(TournamentFormat::Single, 4).await;
        let source = &fx.matches[0];
        let winner = source.slots[0].player_id.unwrap();

        declare_result(&fx.state, source.id, winner_request(winner, 2))
            .await
            .unwrap();
        let response = clear_result(&fx.state, source.id).await.expect("clear");
        assert!(response.matchup.winner.is_none());
        assert_eq!(
            response.matchup.phase,
            crate::dto::common::MatchPhaseView::Open
        );

        let destination = fx
            .store
            .find_match_at(fx.tournament.id, 2, 1)
            .await
            .unwrap()
            .expect("destination still exists");
        assert!(destination.slots[0].player_id.is_none());
    }

    #[tokio::test]
    async fn a_winner_outside_the_matchup_is_rejected() {
        let fx = fixture(TournamentFormat::Single, 2).await;
        let err = declare_result(
            &fx.state,
            fx.matches[0].id,
            winner_request(Uuid::new_v4(), 1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn ties_do_not_propagate() {
        let fx = fixture(TournamentFormat::Single, 4).await;
        let source = &fx.matches[0];
        let request = DeclareResultRequest {
            winner: None,
            is_tie: true,
            scores: Vec::new(),
        };

        let response = declare_result(&fx.state, source.id, request)
            .await
            .expect("tie declare");
        assert!(response.matchup.is_tie);
        assert_eq!(
            response.propagation.status,
            crate::dto::organizer::PropagationStatus::NotApplicable
        );
        let destination = fx.store.find_match_at(fx.tournament.id, 2, 1).await.unwrap();
        assert!(destination.is_none());
    }

    #[tokio::test]
    async fn auto_win_threshold_binds_the_declared_winner() {
        let fx = fixture(TournamentFormat::Single, 2).await;
        let mut tournament = fx.tournament.clone();
        tournament.settings.auto_win_score = Some(3);
        fx.store
            .update_tournament(tournament)
            .await
            .expect("update settings");

        let source = &fx.matches[0];
        let a = source.slots[0].player_id.unwrap();
        let b = source.slots[1].player_id.unwrap();
        let request = DeclareResultRequest {
            winner: Some(a),
            is_tie: false,
            scores: vec![
                ScoreInput {
                    player_id: a,
                    score: 1,
                },
                ScoreInput {
                    player_id: b,
                    score: 3,
                },
            ],
        };

        let err = declare_result(&fx.state, source.id, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
