//! Tournament lifecycle: creation, bracket construction at start, Swiss
//! round generation, completion, and read projections.

use std::{collections::HashSet, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{
            MatchupEntity, SlotKind, SwissWinCondition, TournamentEntity, TournamentFormat,
            TournamentStatus,
        },
    },
    dto::{
        common::{MatchupView, RoundView, TournamentView},
        organizer::{
            CreateTournamentRequest, NextRoundResponse, PlayerInput, StartNextRoundRequest,
            StartTournamentRequest, StartTournamentResponse, TournamentListItem,
        },
        public::{BracketResponse, StandingsResponse},
    },
    error::ServiceError,
    services::{
        bracket::{self, RosterEntry},
        match_service, slots, sse_events, swiss,
    },
    state::{SharedState, match_phase},
};

/// Create a tournament in the initialization state.
pub async fn create_tournament(
    state: &SharedState,
    request: CreateTournamentRequest,
) -> Result<TournamentView, ServiceError> {
    let store = state.require_match_store().await?;

    let settings = request.settings.unwrap_or_default().into();
    let tournament =
        TournamentEntity::new(request.name, request.format, request.max_rounds, settings);
    store.insert_tournament(tournament.clone()).await?;

    let view: TournamentView = tournament.clone().into();
    sse_events::broadcast_tournament_updated(state, tournament.id, Some(view.clone()));
    Ok(view)
}

/// List all tournaments for the organizer UI.
pub async fn list_tournaments(
    state: &SharedState,
) -> Result<Vec<TournamentListItem>, ServiceError> {
    let store = state.require_match_store().await?;
    let entries = store.list_tournaments().await?;
    Ok(entries.into_iter().map(Into::into).collect())
}

/// Full bracket projection: tournament plus matchups grouped into rounds.
pub async fn get_bracket(
    state: &SharedState,
    tournament_id: Uuid,
) -> Result<BracketResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let tournament = match_service::load_tournament(&store, tournament_id).await?;
    let matches = store.list_matches(tournament_id).await?;

    Ok(BracketResponse {
        tournament: tournament.clone().into(),
        rounds: group_rounds(&tournament, &matches),
    })
}

/// Standings computed from all finalized matchups.
pub async fn get_standings(
    state: &SharedState,
    tournament_id: Uuid,
) -> Result<StandingsResponse, ServiceError> {
    let store = state.require_match_store().await?;
    match_service::load_tournament(&store, tournament_id).await?;
    let matches = store.list_matches(tournament_id).await?;

    Ok(StandingsResponse {
        standings: swiss::standings(&matches)
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

/// Delete a tournament together with its matchups and reports.
pub async fn delete_tournament(
    state: &SharedState,
    tournament_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_match_store().await?;
    let deleted = store.delete_tournament(tournament_id).await?;
    if !deleted {
        return Err(ServiceError::NotFound(format!(
            "tournament `{tournament_id}` not found"
        )));
    }
    sse_events::broadcast_tournament_updated(state, tournament_id, None);
    Ok(())
}

/// Start a tournament: freeze its configuration, build the initial bracket
/// (or the full round robin schedule), and flip the status to started.
pub async fn start_tournament(
    state: &SharedState,
    tournament_id: Uuid,
    request: StartTournamentRequest,
) -> Result<StartTournamentResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let mut tournament = match_service::load_tournament(&store, tournament_id).await?;

    if tournament.status != TournamentStatus::Initialization {
        return Err(ServiceError::InvalidState(format!(
            "tournament `{tournament_id}` was already started"
        )));
    }

    let roster = build_roster(request.players)?;
    if roster.len() < 2 {
        return Err(ServiceError::InvalidInput(
            "at least 2 active players are required to start".into(),
        ));
    }

    let pairing_mode = request.pairing_mode.unwrap_or(tournament.settings.pairing_mode);
    let ordered = bracket::order_roster(
        roster,
        pairing_mode,
        state.config().default_seed_group_size(),
    );

    let matches = match tournament.format {
        TournamentFormat::Single => {
            let mut matches = bracket::elimination_round_one(tournament_id, &ordered);
            bracket::pre_propagate_byes(&mut matches);
            matches
        }
        TournamentFormat::Swiss => {
            let ids: Vec<Uuid> = ordered.iter().map(|entry| entry.player_id).collect();
            let pairing = swiss::pair_round(&ids, &HashSet::new());
            bracket::swiss_round(tournament_id, 1, &pairing.pairs, pairing.bye, &ordered)
        }
        TournamentFormat::Robin => {
            bracket::robin_matches(tournament_id, &ordered, tournament.settings.robin_legs)
        }
    };

    store.insert_matches(matches.clone()).await?;

    tournament.status = TournamentStatus::Started;
    tournament.updated_at = SystemTime::now();
    store.update_tournament(tournament.clone()).await?;

    let view: TournamentView = tournament.clone().into();
    sse_events::broadcast_tournament_updated(state, tournament_id, Some(view.clone()));
    let round_one: Vec<MatchupView> = phased_views(
        &tournament,
        &matches,
        matches.iter().filter(|matchup| matchup.round == 1),
    );
    sse_events::broadcast_round_created(state, tournament_id, 1, round_one);

    Ok(StartTournamentResponse {
        tournament: view,
        matchups: phased_views(&tournament, &matches, matches.iter()),
    })
}

/// Close a running tournament.
pub async fn complete_tournament(
    state: &SharedState,
    tournament_id: Uuid,
) -> Result<TournamentView, ServiceError> {
    let store = state.require_match_store().await?;
    let mut tournament = match_service::load_tournament(&store, tournament_id).await?;

    if tournament.status != TournamentStatus::Started {
        return Err(ServiceError::InvalidState(format!(
            "tournament `{tournament_id}` is not running"
        )));
    }

    tournament.status = TournamentStatus::Completed;
    tournament.updated_at = SystemTime::now();
    store.update_tournament(tournament.clone()).await?;

    let view: TournamentView = tournament.into();
    sse_events::broadcast_tournament_updated(state, tournament_id, Some(view.clone()));
    Ok(view)
}

/// Generate the next Swiss round: an explicit organizer command, never an
/// automatic trigger. Matchups still unresolved are force-settled as ties
/// only when the request carries the confirmation flag.
pub async fn start_next_round(
    state: &SharedState,
    tournament_id: Uuid,
    request: StartNextRoundRequest,
) -> Result<NextRoundResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let tournament = match_service::load_tournament(&store, tournament_id).await?;

    if tournament.status != TournamentStatus::Started {
        return Err(ServiceError::InvalidState(format!(
            "tournament `{tournament_id}` is not running"
        )));
    }
    match tournament.format {
        TournamentFormat::Swiss => {}
        TournamentFormat::Single => {
            return Err(ServiceError::InvalidState(
                "elimination rounds advance by winner propagation, not by command".into(),
            ));
        }
        TournamentFormat::Robin => {
            return Err(ServiceError::InvalidState(
                "the round robin schedule is generated at tournament start".into(),
            ));
        }
    }

    let mut matches = store.list_matches(tournament_id).await?;
    let current_round = matches.iter().map(|matchup| matchup.round).max().unwrap_or(0);
    if current_round == 0 {
        return Err(ServiceError::InvalidState(
            "the tournament has no rounds yet; start it first".into(),
        ));
    }
    if let Some(max) = tournament.max_rounds {
        if current_round >= max {
            return Err(ServiceError::InvalidState(format!(
                "round cap {max} reached"
            )));
        }
    }

    // Force-settle leftovers as ties, an operator-confirmed destructive
    // action.
    let unresolved: Vec<Uuid> = matches
        .iter()
        .filter(|matchup| !matchup.is_decided())
        .map(|matchup| matchup.id)
        .collect();
    if !unresolved.is_empty() && !request.force_settle_open {
        return Err(ServiceError::InvalidState(format!(
            "{} matchup(s) are still unresolved; pass force_settle_open to settle them as ties",
            unresolved.len()
        )));
    }
    let mut settled_ties = Vec::with_capacity(unresolved.len());
    for matchup in matches.iter_mut().filter(|matchup| !matchup.is_decided()) {
        matchup.is_tie = true;
        matchup.updated_at = SystemTime::now();
        let stored = store.update_match(matchup.clone()).await?;
        settled_ties.push(stored.id);
        *matchup = stored.clone();
        sse_events::broadcast_match_updated(
            state,
            MatchupView::with_phase(stored, match_phase::MatchPhase::Decided),
            None,
        );
    }

    let table = swiss::standings(&matches);
    if let SwissWinCondition::PointsToWin { points } = tournament.settings.swiss_win_condition {
        if table.iter().any(|record| record.wins >= points) {
            return Err(ServiceError::InvalidState(format!(
                "a player already reached {points} win(s); complete the tournament instead"
            )));
        }
    }

    let roster = roster_from_history(&matches);
    let ranked: Vec<Uuid> = table.iter().map(|record| record.player_id).collect();
    let faced = swiss::faced_pairs(&matches);
    let pairing = swiss::pair_round(&ranked, &faced);

    let next_round = current_round + 1;
    let created = bracket::swiss_round(
        tournament_id,
        next_round,
        &pairing.pairs,
        pairing.bye,
        &roster,
    );
    store.insert_matches(created.clone()).await?;

    let views = phased_views(&tournament, &created, created.iter());
    sse_events::broadcast_round_created(state, tournament_id, next_round, views.clone());

    Ok(NextRoundResponse {
        round: next_round,
        matchups: views,
        settled_ties,
    })
}

fn build_roster(players: Vec<PlayerInput>) -> Result<Vec<RosterEntry>, ServiceError> {
    let mut seen = HashSet::new();
    players
        .into_iter()
        .map(|player| {
            let (player_id, default_kind) = match player.id {
                Some(id) => (id, SlotKind::LoggedIn),
                None => (Uuid::new_v4(), SlotKind::Generated),
            };
            if !seen.insert(player_id) {
                return Err(ServiceError::InvalidInput(format!(
                    "duplicate player id `{player_id}` in the roster"
                )));
            }
            Ok(RosterEntry {
                player_id,
                name: player.name,
                kind: player.kind.unwrap_or(default_kind),
            })
        })
        .collect()
}

/// Reconstruct the roster from bracket slots, keeping the latest name seen.
fn roster_from_history(matches: &[MatchupEntity]) -> Vec<RosterEntry> {
    let mut roster: Vec<RosterEntry> = Vec::new();
    for matchup in matches {
        for slot in &matchup.slots {
            let Some(player_id) = slot.player_id else {
                continue;
            };
            match roster.iter_mut().find(|entry| entry.player_id == player_id) {
                Some(entry) => {
                    entry.name = slot.name.clone();
                    entry.kind = slot.kind;
                }
                None => roster.push(RosterEntry {
                    player_id,
                    name: slot.name.clone(),
                    kind: slot.kind,
                }),
            }
        }
    }
    roster
}

/// Compute phases for a subset of matchups against the full match list.
fn phased_views<'a>(
    tournament: &TournamentEntity,
    all_matches: &[MatchupEntity],
    subset: impl Iterator<Item = &'a MatchupEntity>,
) -> Vec<MatchupView> {
    subset
        .map(|matchup| {
            let downstream = if tournament.format == TournamentFormat::Single {
                slots::downstream_of(all_matches, matchup)
            } else {
                None
            };
            MatchupView::with_phase(matchup.clone(), match_phase::phase_of(matchup, downstream))
        })
        .collect()
}

fn group_rounds(tournament: &TournamentEntity, matches: &[MatchupEntity]) -> Vec<RoundView> {
    let mut rounds: Vec<RoundView> = Vec::new();
    for view in phased_views(tournament, matches, matches.iter()) {
        match rounds.iter_mut().find(|round| round.round == view.round) {
            Some(round) => round.matchups.push(view),
            None => rounds.push(RoundView {
                round: view.round,
                matchups: vec![view],
            }),
        }
    }
    rounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::memory::MemoryMatchStore,
            models::{PairingMode, TournamentSettings},
        },
        dto::organizer::TournamentSettingsInput,
        state::AppState,
    };
    use std::sync::Arc;

    struct Fixture {
        state: SharedState,
        store: Arc<dyn MatchStore>,
    }

    async fn fixture() -> Fixture {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn MatchStore> = Arc::new(MemoryMatchStore::new());
        state.set_match_store(store.clone()).await;
        Fixture { state, store }
    }

    fn players(count: usize) -> Vec<PlayerInput> {
        (0..count)
            .map(|index| PlayerInput {
                id: Some(Uuid::new_v4()),
                name: format!("player-{index}"),
                kind: None,
            })
            .collect()
    }

    async fn created(
        fx: &Fixture,
        format: TournamentFormat,
        settings: Option<TournamentSettingsInput>,
    ) -> TournamentView {
        create_tournament(
            &fx.state,
            CreateTournamentRequest {
                name: "cup".into(),
                format,
                max_rounds: None,
                settings,
            },
        )
        .await
        .expect("create tournament")
    }

    fn start_request(count: usize) -> StartTournamentRequest {
        StartTournamentRequest {
            players: players(count),
            pairing_mode: Some(PairingMode::Ranked),
        }
    }

    #[tokio::test]
    async fn starting_a_five_player_elimination_builds_the_padded_bracket() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Single, None).await;

        let response = start_tournament(&fx.state, tournament.id, start_request(5))
            .await
            .expect("start succeeds");

        assert_eq!(response.tournament.status, TournamentStatus::Started);
        let round_one: Vec<_> = response
            .matchups
            .iter()
            .filter(|matchup| matchup.round == 1)
            .collect();
        assert_eq!(round_one.len(), 4);
        // The bye auto-win was pre-propagated into round 2.
        let round_two: Vec<_> = response
            .matchups
            .iter()
            .filter(|matchup| matchup.round == 2)
            .collect();
        assert_eq!(round_two.len(), 1);
        assert!(round_two[0].slots[0].player_id.is_some());
        assert!(round_two[0].slots[1].player_id.is_none());
    }

    #[tokio::test]
    async fn starting_twice_is_refused() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Single, None).await;
        start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("first start");

        let err = start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn a_lone_player_is_not_enough() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        let err = start_tournament(&fx.state, tournament.id, start_request(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn robin_start_materializes_the_whole_schedule() {
        let fx = fixture().await;
        let tournament = created(
            &fx,
            TournamentFormat::Robin,
            Some(TournamentSettingsInput {
                robin_legs: Some(2),
                ..TournamentSettingsInput::default()
            }),
        )
        .await;

        let response = start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("start succeeds");
        // 2 legs * 3 rounds * 2 matches.
        assert_eq!(response.matchups.len(), 12);

        let err = start_next_round(
            &fx.state,
            tournament.id,
            StartNextRoundRequest::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn swiss_round_two_avoids_round_one_rematches() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        let response = start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("start succeeds");
        assert_eq!(response.matchups.len(), 2);

        // A beats B, C beats D.
        let mut round_one_pairs = Vec::new();
        for matchup in &response.matchups {
            let winner = matchup.slots[0].player_id.unwrap();
            let loser = matchup.slots[1].player_id.unwrap();
            round_one_pairs.push(swiss::pair_key(winner, loser));
            match_service::declare_result(
                &fx.state,
                matchup.id,
                crate::dto::organizer::DeclareResultRequest {
                    winner: Some(winner),
                    is_tie: false,
                    scores: Vec::new(),
                },
            )
            .await
            .expect("declare result");
        }

        let next = start_next_round(
            &fx.state,
            tournament.id,
            StartNextRoundRequest::default(),
        )
        .await
        .expect("round 2 generated");

        assert_eq!(next.round, 2);
        assert_eq!(next.matchups.len(), 2);
        assert!(next.settled_ties.is_empty());
        for matchup in &next.matchups {
            let pair = swiss::pair_key(
                matchup.slots[0].player_id.unwrap(),
                matchup.slots[1].player_id.unwrap(),
            );
            assert!(!round_one_pairs.contains(&pair), "rematch in round 2");
        }
    }

    #[tokio::test]
    async fn unresolved_matchups_block_the_next_round_without_confirmation() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("start succeeds");

        let err = start_next_round(
            &fx.state,
            tournament.id,
            StartNextRoundRequest {
                force_settle_open: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let next = start_next_round(
            &fx.state,
            tournament.id,
            StartNextRoundRequest {
                force_settle_open: true,
            },
        )
        .await
        .expect("forced generation succeeds");
        assert_eq!(next.settled_ties.len(), 2);

        // Every round-1 matchup is now a tie.
        let matches = fx.store.list_matches(tournament.id).await.unwrap();
        assert!(
            matches
                .iter()
                .filter(|matchup| matchup.round == 1)
                .all(|matchup| matchup.is_tie)
        );
    }

    #[tokio::test]
    async fn concurrent_round_generation_fails_on_the_positional_constraint() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        let response = start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("start succeeds");

        // Two generations racing for the same round both target the same
        // positions; the loser's insert must fail cleanly on the positional
        // constraint instead of double-pairing players.
        let occupied = response.matchups[0].match_number;
        let duplicate = MatchupEntity::new(
            tournament.id,
            1,
            occupied,
            [
                crate::dao::models::BracketSlot::placeholder(),
                crate::dao::models::BracketSlot::placeholder(),
            ],
        );
        let err: ServiceError = fx
            .store
            .insert_matches(vec![duplicate])
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn odd_swiss_roster_gets_a_bye_with_an_immediate_win() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        let response = start_tournament(&fx.state, tournament.id, start_request(5))
            .await
            .expect("start succeeds");

        assert_eq!(response.matchups.len(), 3);
        let bye = response
            .matchups
            .iter()
            .find(|matchup| matchup.slots[1].player_id.is_none())
            .expect("bye matchup exists");
        assert_eq!(bye.winner, bye.slots[0].player_id);
    }

    #[tokio::test]
    async fn settings_are_frozen_once_started() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("start succeeds");

        let stored = fx
            .store
            .find_tournament(tournament.id)
            .await
            .unwrap()
            .expect("tournament stored");
        assert_eq!(stored.status, TournamentStatus::Started);
        assert_eq!(stored.settings, TournamentSettings::default());
    }

    #[tokio::test]
    async fn completing_a_running_tournament_flips_the_status() {
        let fx = fixture().await;
        let tournament = created(&fx, TournamentFormat::Swiss, None).await;
        start_tournament(&fx.state, tournament.id, start_request(4))
            .await
            .expect("start succeeds");

        let view = complete_tournament(&fx.state, tournament.id)
            .await
            .expect("complete succeeds");
        assert_eq!(view.status, TournamentStatus::Completed);

        let err = complete_tournament(&fx.state, tournament.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
