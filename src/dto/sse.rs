//! Payloads carried on the SSE change-notification streams.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    common::{MatchupView, TournamentView},
    organizer::PropagationView,
    player::ReportView,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// Optional event name attached to the SSE frame.
    pub event: Option<String>,
    /// Serialized JSON data of the frame.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Plain-text event without JSON payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to the admin SSE client when it connects.
pub struct AdminHandshake {
    /// Token expected in the `X-Admin-Token` header of organizer calls.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the backend currently lacks a storage connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a matchup commit (declared, accepted, cleared, or
/// force-settled result).
pub struct MatchUpdatedEvent {
    /// The matchup as committed.
    pub matchup: MatchupView,
    /// Propagation outcome when the commit advanced a winner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<PropagationView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new round's matchups have been generated.
pub struct RoundCreatedEvent {
    /// Owning tournament.
    pub tournament_id: Uuid,
    /// The new round number.
    pub round: u32,
    /// Generated matchups.
    pub matchups: Vec<MatchupView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant files a score report.
pub struct ReportSubmittedEvent {
    /// The stored report.
    pub report: ReportView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when two reports for the same matchup contradict each other.
pub struct ReportDisputedEvent {
    /// The contested matchup.
    pub match_id: Uuid,
    /// The contradicting reports.
    pub report_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the organizer (or auto-accept policy) accepts a report.
pub struct ReportAcceptedEvent {
    /// The accepted report.
    pub report_id: Uuid,
    /// The matchup carrying the committed result.
    pub match_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a tournament is created, started, completed, or deleted.
pub struct TournamentUpdatedEvent {
    /// The tournament after the change, absent when deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament: Option<TournamentView>,
    /// Tournament identifier (present also for deletions).
    pub tournament_id: Uuid,
}
