//! Score report reconciliation: collection of per-participant reports,
//! agreement checking, and organizer acceptance committing the
//! authoritative result.

use std::{sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{
            MatchupEntity, ReportStatus, ReportedScore, ScoreReportEntity, TournamentEntity,
            TournamentFormat,
        },
    },
    dto::{
        common::MatchupView,
        organizer::{AcceptReportResponse, PropagationView, ReportQueueItem},
        player::{
            ReportView, ReportedOutcome, SubmitReportRequest, SubmitReportResponse,
            UpdateReportRequest,
        },
    },
    error::ServiceError,
    services::{
        match_service::{self, ResultOutcome},
        slots, sse_events,
    },
    state::{SharedState, match_phase},
};

/// Two reports for the same match agree iff both declare the same tie
/// status and, if not a tie, the same winner, and every per-player score is
/// identical across both.
pub fn reports_match(a: &ScoreReportEntity, b: &ScoreReportEntity) -> bool {
    if a.is_tie != b.is_tie {
        return false;
    }
    if !a.is_tie && a.winner != b.winner {
        return false;
    }
    if a.scores.len() != b.scores.len() {
        return false;
    }
    a.scores
        .iter()
        .all(|entry| b.score_for(entry.player_id) == Some(entry.score))
}

/// Submit a score report for a matchup the reporter participates in.
pub async fn submit_score_report(
    state: &SharedState,
    match_id: Uuid,
    request: SubmitReportRequest,
) -> Result<SubmitReportResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let matchup = match_service::load_matchup(&store, match_id).await?;
    let tournament = match_service::load_tournament(&store, matchup.tournament_id).await?;

    let reporter = request.reporter_id;
    if matchup.slot_of(reporter).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "player `{reporter}` does not participate in matchup `{match_id}`"
        )));
    }

    ensure_not_locked(&store, &tournament, &matchup).await?;

    let existing = store.list_reports_for_match(match_id).await?;
    if let Some(previous) = existing
        .iter()
        .find(|report| report.reporter_id == reporter)
    {
        return Err(match previous.status {
            ReportStatus::Accepted => ServiceError::InvalidState(format!(
                "report `{}` by this player was already accepted",
                previous.id
            )),
            _ => ServiceError::InvalidState(format!(
                "player `{reporter}` already has an outstanding report for matchup `{match_id}`; \
                 edit or delete report `{}` instead",
                previous.id
            )),
        });
    }

    validate_reported_outcome(&matchup, &tournament, &request.outcome)?;

    let mut report = ScoreReportEntity::new(
        match_id,
        matchup.tournament_id,
        reporter,
        scores_from(&request.outcome),
        request.outcome.winner,
        request.outcome.is_tie,
    );

    // Agreement with the other side is informative: it flags disputes and
    // feeds the optional auto-accept policy, but never commits by itself.
    let sibling = existing
        .iter()
        .find(|candidate| candidate.status != ReportStatus::Accepted)
        .cloned();
    let agreement = sibling
        .as_ref()
        .map(|candidate| reports_match(&report, candidate));

    if agreement == Some(false) {
        report.status = ReportStatus::Disputed;
    }
    store.insert_report(report.clone()).await?;

    if agreement == Some(false) {
        if let Some(mut other) = sibling {
            other.status = ReportStatus::Disputed;
            other.updated_at = SystemTime::now();
            store.update_report(other.clone()).await?;
            sse_events::broadcast_report_disputed(state, match_id, vec![other.id, report.id]);
        }
    }

    sse_events::broadcast_report_submitted(state, report.clone().into());

    if agreement == Some(true) && tournament.settings.auto_accept_agreed {
        let accepted = accept_report_entity(state, &store, report.clone()).await?;
        return Ok(SubmitReportResponse {
            report: accepted.report,
            agreement,
            auto_accepted: true,
        });
    }

    Ok(SubmitReportResponse {
        report: report.into(),
        agreement,
        auto_accepted: false,
    })
}

/// Replace a not-yet-accepted report; reporter-only.
pub async fn update_report(
    state: &SharedState,
    report_id: Uuid,
    request: UpdateReportRequest,
) -> Result<ReportView, ServiceError> {
    let store = state.require_match_store().await?;
    let mut report = load_report(&store, report_id).await?;
    ensure_editable(&report, request.reporter_id)?;

    let matchup = match_service::load_matchup(&store, report.match_id).await?;
    let tournament = match_service::load_tournament(&store, matchup.tournament_id).await?;
    validate_reported_outcome(&matchup, &tournament, &request.outcome)?;

    report.scores = scores_from(&request.outcome);
    report.winner = request.outcome.winner;
    report.is_tie = request.outcome.is_tie;
    report.status = ReportStatus::Pending;
    report.updated_at = SystemTime::now();

    // Re-run the comparison against the other side: the edit can resolve or
    // raise a dispute.
    let sibling = store
        .list_reports_for_match(report.match_id)
        .await?
        .into_iter()
        .find(|candidate| {
            candidate.id != report.id && candidate.status != ReportStatus::Accepted
        });
    if let Some(mut other) = sibling {
        let agreed = reports_match(&report, &other);
        let status = if agreed {
            ReportStatus::Pending
        } else {
            ReportStatus::Disputed
        };
        if other.status != status {
            other.status = status;
            other.updated_at = SystemTime::now();
            store.update_report(other.clone()).await?;
        }
        if !agreed {
            report.status = ReportStatus::Disputed;
            sse_events::broadcast_report_disputed(
                state,
                report.match_id,
                vec![other.id, report.id],
            );
        }
    }

    store.update_report(report.clone()).await?;
    sse_events::broadcast_report_submitted(state, report.clone().into());
    Ok(report.into())
}

/// Delete a not-yet-accepted report; reporter-only.
pub async fn delete_report(
    state: &SharedState,
    report_id: Uuid,
    reporter_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_match_store().await?;
    let report = load_report(&store, report_id).await?;
    ensure_editable(&report, reporter_id)?;

    store.delete_report(report_id).await?;

    // A dispute dissolves when one side withdraws.
    let sibling = store
        .list_reports_for_match(report.match_id)
        .await?
        .into_iter()
        .find(|candidate| candidate.status == ReportStatus::Disputed);
    if let Some(mut other) = sibling {
        other.status = ReportStatus::Pending;
        other.updated_at = SystemTime::now();
        store.update_report(other).await?;
    }

    Ok(())
}

/// Accept a report as the authoritative result (organizer action).
pub async fn accept_score_report(
    state: &SharedState,
    report_id: Uuid,
) -> Result<AcceptReportResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let report = load_report(&store, report_id).await?;
    if report.status == ReportStatus::Accepted {
        return Err(ServiceError::InvalidState(format!(
            "report `{report_id}` was already accepted"
        )));
    }

    accept_report_entity(state, &store, report).await
}

/// The organizer's reconciliation queue: every report of the tournament,
/// annotated with sibling agreement where both sides have reported.
pub async fn list_reports(
    state: &SharedState,
    tournament_id: Uuid,
) -> Result<Vec<ReportQueueItem>, ServiceError> {
    let store = state.require_match_store().await?;
    match_service::load_tournament(&store, tournament_id).await?;
    let reports = store.list_reports_for_tournament(tournament_id).await?;

    Ok(reports
        .iter()
        .map(|report| {
            let agreement = reports
                .iter()
                .find(|candidate| {
                    candidate.match_id == report.match_id
                        && candidate.id != report.id
                        && candidate.status != ReportStatus::Accepted
                        && report.status != ReportStatus::Accepted
                })
                .map(|candidate| reports_match(report, candidate));
            ReportQueueItem {
                report: report.clone().into(),
                agreement,
            }
        })
        .collect())
}

async fn accept_report_entity(
    state: &SharedState,
    store: &Arc<dyn MatchStore>,
    mut report: ScoreReportEntity,
) -> Result<AcceptReportResponse, ServiceError> {
    let matchup = match_service::load_matchup(store, report.match_id).await?;
    let tournament = match_service::load_tournament(store, matchup.tournament_id).await?;

    let outcome = ResultOutcome {
        winner: report.winner,
        is_tie: report.is_tie,
        scores: report.scores.clone(),
    };
    let (stored, propagation) =
        match_service::commit_result(store, &tournament, matchup, outcome).await?;

    report.status = ReportStatus::Accepted;
    report.updated_at = SystemTime::now();
    store.update_report(report.clone()).await?;

    // The sibling report, if any, stays untouched as historical record.

    let phase = match_service::phase_after_commit(&stored, &propagation);
    let view = MatchupView::with_phase(stored, phase);
    let propagation_view: PropagationView = propagation.into();
    sse_events::broadcast_report_accepted(state, report.id, report.match_id);
    sse_events::broadcast_match_updated(state, view.clone(), Some(propagation_view.clone()));

    Ok(AcceptReportResponse {
        report: report.into(),
        matchup: view,
        propagation: propagation_view,
    })
}

async fn ensure_not_locked(
    store: &Arc<dyn MatchStore>,
    tournament: &TournamentEntity,
    matchup: &MatchupEntity,
) -> Result<(), ServiceError> {
    if tournament.format != TournamentFormat::Single {
        return Ok(());
    }
    let matches = store.list_matches(tournament.id).await?;
    let downstream = slots::downstream_of(&matches, matchup);
    if match_phase::phase_of(matchup, downstream) == match_phase::MatchPhase::Locked {
        return Err(ServiceError::InvalidState(format!(
            "matchup `{}` is locked; its result already advanced the bracket",
            matchup.id
        )));
    }
    Ok(())
}

fn ensure_editable(report: &ScoreReportEntity, reporter_id: Uuid) -> Result<(), ServiceError> {
    if report.reporter_id != reporter_id {
        return Err(ServiceError::Unauthorized(
            "only the original reporter may modify a report".into(),
        ));
    }
    if report.status == ReportStatus::Accepted {
        return Err(ServiceError::InvalidState(format!(
            "report `{}` was accepted and is immutable",
            report.id
        )));
    }
    Ok(())
}

fn validate_reported_outcome(
    matchup: &MatchupEntity,
    tournament: &TournamentEntity,
    outcome: &ReportedOutcome,
) -> Result<(), ServiceError> {
    if let Some(winner) = outcome.winner {
        if matchup.slot_of(winner).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "claimed winner `{winner}` does not participate in matchup `{}`",
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
                    "score {threshold} is an automatic win; the claimed winner must be `{single}`"
                )));
            }
        }
    }

    Ok(())
}

fn scores_from(outcome: &ReportedOutcome) -> Vec<ReportedScore> {
    outcome
        .scores
        .iter()
        .map(|entry| ReportedScore {
            player_id: entry.player_id,
            score: entry.score,
        })
        .collect()
}

async fn load_report(
    store: &Arc<dyn MatchStore>,
    report_id: Uuid,
) -> Result<ScoreReportEntity, ServiceError> {
    store
        .find_report(report_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("report `{report_id}` not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::memory::MemoryMatchStore,
            models::{BracketSlot, SlotKind, TournamentSettings, TournamentStatus},
        },
        dto::common::ScoreInput,
        state::AppState,
    };

    fn report(match_id: Uuid, reporter: Uuid, winner: Uuid, scores: &[(Uuid, i32)]) -> ScoreReportEntity {
        ScoreReportEntity::new(
            match_id,
            Uuid::new_v4(),
            reporter,
            scores
                .iter()
                .map(|&(player_id, score)| ReportedScore { player_id, score })
                .collect(),
            Some(winner),
            false,
        )
    }

    #[test]
    fn reports_agree_on_identical_outcome() {
        let match_id = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let first = report(match_id, a, a, &[(a, 3), (b, 1)]);
        let second = report(match_id, b, a, &[(b, 1), (a, 3)]);
        // Score order does not matter; per-player values do.
        assert!(reports_match(&first, &second));
    }

    #[test]
    fn reports_disagree_on_any_single_field() {
        let match_id = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let base = report(match_id, a, a, &[(a, 3), (b, 1)]);

        let different_winner = report(match_id, b, b, &[(a, 3), (b, 1)]);
        assert!(!reports_match(&base, &different_winner));

        let different_score = report(match_id, b, a, &[(a, 3), (b, 2)]);
        assert!(!reports_match(&base, &different_score));

        let mut tie_claim = report(match_id, b, a, &[(a, 3), (b, 1)]);
        tie_claim.winner = None;
        tie_claim.is_tie = true;
        assert!(!reports_match(&base, &tie_claim));

        let missing_score = report(match_id, b, a, &[(a, 3)]);
        assert!(!reports_match(&base, &missing_score));
    }

    #[test]
    fn tie_reports_agree_regardless_of_winner_field() {
        let match_id = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut first = report(match_id, a, a, &[(a, 2), (b, 2)]);
        first.winner = None;
        first.is_tie = true;
        let mut second = report(match_id, b, b, &[(a, 2), (b, 2)]);
        second.winner = None;
        second.is_tie = true;
        assert!(reports_match(&first, &second));
    }

    struct Fixture {
        state: crate::state::SharedState,
        store: Arc<dyn MatchStore>,
        matchup: MatchupEntity,
        a: Uuid,
        b: Uuid,
    }

    async fn fixture(auto_accept: bool) -> Fixture {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn MatchStore> = Arc::new(MemoryMatchStore::new());
        state.set_match_store(store.clone()).await;

        let mut tournament = TournamentEntity::new(
            "cup".into(),
            TournamentFormat::Single,
            None,
            TournamentSettings {
                auto_accept_agreed: auto_accept,
                ..TournamentSettings::default()
            },
        );
        tournament.status = TournamentStatus::Started;
        store
            .insert_tournament(tournament.clone())
            .await
            .expect("insert tournament");

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let matchup = MatchupEntity::new(
            tournament.id,
            1,
            1,
            [
                BracketSlot::player(a, "a".into(), SlotKind::LoggedIn),
                BracketSlot::player(b, "b".into(), SlotKind::LoggedIn),
            ],
        );
        store
            .insert_matches(vec![matchup.clone()])
            .await
            .expect("insert matchup");

        Fixture {
            state,
            store,
            matchup,
            a,
            b,
        }
    }

    fn submit(reporter: Uuid, winner: Uuid, scores: &[(Uuid, i32)]) -> SubmitReportRequest {
        SubmitReportRequest {
            reporter_id: reporter,
            outcome: ReportedOutcome {
                winner: Some(winner),
                is_tie: false,
                scores: scores
                    .iter()
                    .map(|&(player_id, score)| ScoreInput { player_id, score })
                    .collect(),
            },
        }
    }

    #[tokio::test]
    async fn double_submission_by_the_same_reporter_is_refused() {
        let fx = fixture(false).await;
        submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2)]))
            .await
            .expect("first submission");

        let err = submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn non_participants_cannot_report() {
        let fx = fixture(false).await;
        let outsider = Uuid::new_v4();
        let err =
            submit_score_report(&fx.state, fx.matchup.id, submit(outsider, fx.a, &[(fx.a, 2)]))
                .await
                .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn disagreeing_reports_are_flagged_disputed() {
        let fx = fixture(false).await;
        let first =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2), (fx.b, 1)]))
                .await
                .expect("first report");
        assert!(first.agreement.is_none());

        let second =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.b, fx.b, &[(fx.a, 2), (fx.b, 1)]))
                .await
                .expect("second report");
        assert_eq!(second.agreement, Some(false));
        assert_eq!(second.report.status, ReportStatus::Disputed);

        let stored_first = fx
            .store
            .find_report(first.report.id)
            .await
            .unwrap()
            .expect("first report stored");
        assert_eq!(stored_first.status, ReportStatus::Disputed);
    }

    #[tokio::test]
    async fn accepting_one_report_leaves_the_sibling_outstanding() {
        let fx = fixture(false).await;
        let first =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2), (fx.b, 1)]))
                .await
                .unwrap();
        let second =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.b, fx.b, &[(fx.a, 2), (fx.b, 1)]))
                .await
                .unwrap();

        let accepted = accept_score_report(&fx.state, first.report.id)
            .await
            .expect("organizer accepts the first report");
        assert_eq!(accepted.matchup.winner, Some(fx.a));
        assert_eq!(accepted.report.status, ReportStatus::Accepted);

        // The losing side's report stays as historical record.
        let sibling = fx
            .store
            .find_report(second.report.id)
            .await
            .unwrap()
            .expect("sibling still stored");
        assert_ne!(sibling.status, ReportStatus::Accepted);
    }

    #[tokio::test]
    async fn accepting_twice_is_refused() {
        let fx = fixture(false).await;
        let submitted =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2)]))
                .await
                .unwrap();
        accept_score_report(&fx.state, submitted.report.id)
            .await
            .expect("first acceptance");

        let err = accept_score_report(&fx.state, submitted.report.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn agreeing_reports_auto_accept_under_the_policy() {
        let fx = fixture(true).await;
        submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2), (fx.b, 0)]))
            .await
            .unwrap();
        let second =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.b, fx.a, &[(fx.a, 2), (fx.b, 0)]))
                .await
                .expect("agreeing report");

        assert_eq!(second.agreement, Some(true));
        assert!(second.auto_accepted);
        assert_eq!(second.report.status, ReportStatus::Accepted);

        let matchup = fx
            .store
            .find_match(fx.matchup.id)
            .await
            .unwrap()
            .expect("matchup stored");
        assert_eq!(matchup.winner, Some(fx.a));
    }

    #[tokio::test]
    async fn editing_resolves_a_dispute() {
        let fx = fixture(false).await;
        let first =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2), (fx.b, 1)]))
                .await
                .unwrap();
        let second =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.b, fx.b, &[(fx.a, 2), (fx.b, 1)]))
                .await
                .unwrap();
        assert_eq!(second.agreement, Some(false));

        let updated = update_report(
            &fx.state,
            second.report.id,
            UpdateReportRequest {
                reporter_id: fx.b,
                outcome: ReportedOutcome {
                    winner: Some(fx.a),
                    is_tie: false,
                    scores: vec![
                        ScoreInput {
                            player_id: fx.a,
                            score: 2,
                        },
                        ScoreInput {
                            player_id: fx.b,
                            score: 1,
                        },
                    ],
                },
            },
        )
        .await
        .expect("edit succeeds");
        assert_eq!(updated.status, ReportStatus::Pending);

        let stored_first = fx
            .store
            .find_report(first.report.id)
            .await
            .unwrap()
            .expect("first report stored");
        assert_eq!(stored_first.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn only_the_reporter_may_edit_or_delete() {
        let fx = fixture(false).await;
        let submitted =
            submit_score_report(&fx.state, fx.matchup.id, submit(fx.a, fx.a, &[(fx.a, 2)]))
                .await
                .unwrap();

        let err = delete_report(&fx.state, submitted.report.id, fx.b)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        delete_report(&fx.state, submitted.report.id, fx.a)
            .await
            .expect("reporter deletes their own report");
        assert!(
            fx.store
                .find_report(submitted.report.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
