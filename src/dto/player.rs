//! DTO definitions for the player-facing score report endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{ReportStatus, ReportedScore, ScoreReportEntity},
    dto::{common::ScoreInput, format_system_time},
};

/// Projection of a score report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportView {
    /// Report identifier.
    pub id: Uuid,
    /// Matchup the report is about.
    pub match_id: Uuid,
    /// Owning tournament.
    pub tournament_id: Uuid,
    /// Participant who filed the report.
    pub reporter_id: Uuid,
    /// Claimed score per participant.
    pub scores: Vec<ReportedScore>,
    /// Claimed winner, if not a tie.
    pub winner: Option<Uuid>,
    /// Whether the reporter claims a tie.
    pub is_tie: bool,
    /// Reconciliation status.
    pub status: ReportStatus,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<ScoreReportEntity> for ReportView {
    fn from(entity: ScoreReportEntity) -> Self {
        Self {
            id: entity.id,
            match_id: entity.match_id,
            tournament_id: entity.tournament_id,
            reporter_id: entity.reporter_id,
            scores: entity.scores,
            winner: entity.winner,
            is_tie: entity.is_tie,
            status: entity.status,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Claimed outcome shared by submit and edit payloads.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReportedOutcome {
    /// Claimed winner; mutually exclusive with `is_tie`.
    #[serde(default)]
    pub winner: Option<Uuid>,
    /// Whether the reporter claims a tie.
    #[serde(default)]
    pub is_tie: bool,
    /// Claimed score per participant.
    pub scores: Vec<ScoreInput>,
}

fn validate_outcome(outcome: &ReportedOutcome, errors: &mut ValidationErrors) {
    match (outcome.winner, outcome.is_tie) {
        (Some(_), true) => {
            let mut err = ValidationError::new("outcome");
            err.message = Some("a report claims either a winner or a tie, not both".into());
            errors.add("winner", err);
        }
        (None, false) => {
            let mut err = ValidationError::new("outcome");
            err.message = Some("a report must claim a winner or a tie".into());
            errors.add("winner", err);
        }
        _ => {}
    }
}

/// Payload submitting a score report for a matchup the reporter plays in.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitReportRequest {
    /// Participant filing the report (provided by the permission layer).
    pub reporter_id: Uuid,
    /// Claimed outcome.
    #[serde(flatten)]
    pub outcome: ReportedOutcome,
}

impl Validate for SubmitReportRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_outcome(&self.outcome, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response to a submitted report.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitReportResponse {
    /// The stored report.
    pub report: ReportView,
    /// Whether the report agrees with the sibling report, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<bool>,
    /// Whether the agreeing pair was auto-accepted by tournament policy.
    pub auto_accepted: bool,
}

/// Payload replacing a not-yet-accepted report by its original reporter.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    /// Participant editing their own report.
    pub reporter_id: Uuid,
    /// Replacement outcome.
    #[serde(flatten)]
    pub outcome: ReportedOutcome,
}

impl Validate for UpdateReportRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_outcome(&self.outcome, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Identifies the caller on bodyless report operations.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReporterQuery {
    /// Participant deleting their own report.
    pub reporter_id: Uuid,
}
