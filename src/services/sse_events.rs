//! Typed broadcast helpers for the change-notification streams.
//!
//! Every helper is fire-and-forget: the commit already happened when it is
//! called, and a failed or unobserved broadcast never rolls anything back.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::{MatchupView, TournamentView},
        organizer::PropagationView,
        player::ReportView,
        sse::{
            MatchUpdatedEvent, ReportAcceptedEvent, ReportDisputedEvent, ReportSubmittedEvent,
            RoundCreatedEvent, ServerEvent, TournamentUpdatedEvent,
        },
    },
    state::SharedState,
};

const EVENT_MATCH_UPDATED: &str = "match.updated";
const EVENT_ROUND_CREATED: &str = "round.created";
const EVENT_REPORT_SUBMITTED: &str = "report.submitted";
const EVENT_REPORT_DISPUTED: &str = "report.disputed";
const EVENT_REPORT_ACCEPTED: &str = "report.accepted";
const EVENT_TOURNAMENT_UPDATED: &str = "tournament.updated";

/// Broadcast a committed matchup change and its propagation outcome.
pub fn broadcast_match_updated(
    state: &SharedState,
    matchup: MatchupView,
    propagation: Option<PropagationView>,
) {
    let payload = MatchUpdatedEvent {
        matchup,
        propagation,
    };
    send_public_event(state, EVENT_MATCH_UPDATED, &payload);
    send_admin_event(state, EVENT_MATCH_UPDATED, &payload);
}

/// Broadcast a newly generated round.
pub fn broadcast_round_created(
    state: &SharedState,
    tournament_id: Uuid,
    round: u32,
    matchups: Vec<MatchupView>,
) {
    let payload = RoundCreatedEvent {
        tournament_id,
        round,
        matchups,
    };
    send_public_event(state, EVENT_ROUND_CREATED, &payload);
    send_admin_event(state, EVENT_ROUND_CREATED, &payload);
}

/// Notify organizers that a participant filed a report.
pub fn broadcast_report_submitted(state: &SharedState, report: ReportView) {
    let payload = ReportSubmittedEvent { report };
    send_admin_event(state, EVENT_REPORT_SUBMITTED, &payload);
}

/// Notify organizers that two reports contradict each other.
pub fn broadcast_report_disputed(state: &SharedState, match_id: Uuid, report_ids: Vec<Uuid>) {
    let payload = ReportDisputedEvent {
        match_id,
        report_ids,
    };
    send_admin_event(state, EVENT_REPORT_DISPUTED, &payload);
}

/// Broadcast that a report became the authoritative result.
pub fn broadcast_report_accepted(state: &SharedState, report_id: Uuid, match_id: Uuid) {
    let payload = ReportAcceptedEvent {
        report_id,
        match_id,
    };
    send_public_event(state, EVENT_REPORT_ACCEPTED, &payload);
    send_admin_event(state, EVENT_REPORT_ACCEPTED, &payload);
}

/// Broadcast a tournament lifecycle change.
pub fn broadcast_tournament_updated(
    state: &SharedState,
    tournament_id: Uuid,
    tournament: Option<TournamentView>,
) {
    let payload = TournamentUpdatedEvent {
        tournament,
        tournament_id,
    };
    send_public_event(state, EVENT_TOURNAMENT_UPDATED, &payload);
    send_admin_event(state, EVENT_TOURNAMENT_UPDATED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.admin_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize admin SSE payload"),
    }
}
