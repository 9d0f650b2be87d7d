//! DTO definitions used by the organizer REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{
        PairingMode, SlotKind, SwissWinCondition, TournamentFormat, TournamentSettings,
        TournamentStatus,
    },
    dto::{
        common::{MatchupView, ScoreInput, TournamentView},
        format_system_time,
        player::ReportView,
        validation::{validate_display_name, validate_robin_legs},
    },
    services::elimination::Propagation,
    state::match_phase,
};

/// Minimal projection of a tournament when listed for organizers.
#[derive(Debug, Serialize, ToSchema)]
pub struct TournamentListItem {
    /// Tournament identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Competition format.
    pub format: TournamentFormat,
    /// Lifecycle status.
    pub status: TournamentStatus,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<crate::dao::models::TournamentListItemEntity> for TournamentListItem {
    fn from(entity: crate::dao::models::TournamentListItemEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            format: entity.format,
            status: entity.status,
            created_at: format_system_time(entity.created_at),
        }
    }
}

/// Settings supplied when creating a tournament; omitted knobs fall back to
/// defaults.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TournamentSettingsInput {
    /// Opponent assignment policy.
    #[serde(default)]
    pub pairing_mode: Option<PairingMode>,
    /// Swiss termination rule.
    #[serde(default)]
    pub swiss_win_condition: Option<SwissWinCondition>,
    /// Auto-win score threshold enforced on score reports.
    #[serde(default)]
    pub auto_win_score: Option<i32>,
    /// Round robin legs (1 or 2).
    #[serde(default)]
    pub robin_legs: Option<u8>,
    /// Accept a report automatically when the sibling report agrees.
    #[serde(default)]
    pub auto_accept_agreed: Option<bool>,
}

impl From<TournamentSettingsInput> for TournamentSettings {
    fn from(input: TournamentSettingsInput) -> Self {
        let defaults = TournamentSettings::default();
        Self {
            pairing_mode: input.pairing_mode.unwrap_or(defaults.pairing_mode),
            swiss_win_condition: input
                .swiss_win_condition
                .unwrap_or(defaults.swiss_win_condition),
            auto_win_score: input.auto_win_score,
            robin_legs: input.robin_legs.unwrap_or(defaults.robin_legs),
            auto_accept_agreed: input
                .auto_accept_agreed
                .unwrap_or(defaults.auto_accept_agreed),
        }
    }
}

/// Payload creating a tournament in the initialization state.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTournamentRequest {
    /// Display name.
    pub name: String,
    /// Competition format.
    pub format: TournamentFormat,
    /// Round cap for elimination/Swiss events.
    #[serde(default)]
    pub max_rounds: Option<u32>,
    /// Format settings.
    #[serde(default)]
    pub settings: Option<TournamentSettingsInput>,
}

impl Validate for CreateTournamentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        }

        if let Some(ref settings) = self.settings {
            if let Some(legs) = settings.robin_legs {
                if let Err(e) = validate_robin_legs(legs) {
                    errors.add("settings.robin_legs", e);
                }
            }
        }

        if self.max_rounds == Some(0) {
            let mut err = ValidationError::new("max_rounds");
            err.message = Some("round cap must be at least 1".into());
            errors.add("max_rounds", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// One roster entry handed to the bracket builder.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlayerInput {
    /// Player identifier; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Account origin; defaults to `generated` for id-less entries and
    /// `logged_in` otherwise.
    #[serde(default)]
    pub kind: Option<SlotKind>,
}

/// Payload starting a tournament and building its initial bracket.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartTournamentRequest {
    /// Active roster in registration (or seed) order.
    pub players: Vec<PlayerInput>,
    /// Pairing mode override; falls back to the tournament settings.
    #[serde(default)]
    pub pairing_mode: Option<PairingMode>,
}

impl Validate for StartTournamentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for player in &self.players {
            if let Err(e) = validate_display_name(&player.name) {
                errors.add("players", e);
                break;
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response to a tournament start: the round-1 matchups (or the full round
/// robin schedule).
#[derive(Debug, Serialize, ToSchema)]
pub struct StartTournamentResponse {
    /// Updated tournament.
    pub tournament: TournamentView,
    /// Generated matchups.
    pub matchups: Vec<MatchupView>,
}

/// Payload declaring a matchup result directly.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeclareResultRequest {
    /// Winning player; mutually exclusive with `is_tie`.
    #[serde(default)]
    pub winner: Option<Uuid>,
    /// Whether the matchup ended in a tie.
    #[serde(default)]
    pub is_tie: bool,
    /// Scores to record on the slots.
    #[serde(default)]
    pub scores: Vec<ScoreInput>,
}

impl Validate for DeclareResultRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match (self.winner, self.is_tie) {
            (Some(_), true) => {
                let mut err = ValidationError::new("outcome");
                err.message = Some("a result is either a winner or a tie, not both".into());
                errors.add("winner", err);
            }
            (None, false) => {
                let mut err = ValidationError::new("outcome");
                err.message =
                    Some("declare a winner or a tie; clearing a result is a separate call".into());
                errors.add("winner", err);
            }
            _ => {}
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Where a declared winner ended up in the next round.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropagationStatus {
    /// Format without propagation, or a tie.
    NotApplicable,
    /// The decided matchup was the terminal one.
    Terminal,
    /// The winner occupies its next-round slot.
    Advanced,
    /// The destination write failed; the result itself stands.
    Failed,
}

/// Summary of the propagation side effect of a committed result.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PropagationView {
    /// What happened downstream.
    pub status: PropagationStatus,
    /// Destination matchup, when advanced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<MatchupView>,
    /// Failure detail, when the destination write failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<Propagation> for PropagationView {
    fn from(outcome: Propagation) -> Self {
        match outcome {
            Propagation::NotApplicable => Self {
                status: PropagationStatus::NotApplicable,
                destination: None,
                detail: None,
            },
            Propagation::Terminal => Self {
                status: PropagationStatus::Terminal,
                destination: None,
                detail: None,
            },
            Propagation::Advanced { destination, .. } => {
                let phase = match_phase::phase_of(&destination, None);
                Self {
                    status: PropagationStatus::Advanced,
                    destination: Some(MatchupView::with_phase(destination, phase)),
                    detail: None,
                }
            }
            Propagation::Failed { detail } => Self {
                status: PropagationStatus::Failed,
                destination: None,
                detail: Some(detail),
            },
        }
    }
}

/// Response to a declared (or accepted) result.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeclareResultResponse {
    /// Matchup as committed.
    pub matchup: MatchupView,
    /// Downstream propagation outcome.
    pub propagation: PropagationView,
}

/// Response to clearing a result back to open.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearResultResponse {
    /// Matchup after the reversal.
    pub matchup: MatchupView,
}

/// Payload for generating the next Swiss round.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartNextRoundRequest {
    /// Force-settle still-open matchups of the current round as ties.
    /// Without this explicit confirmation the command refuses while
    /// unresolved matchups remain.
    #[serde(default)]
    pub force_settle_open: bool,
}

/// Response to a generated Swiss round.
#[derive(Debug, Serialize, ToSchema)]
pub struct NextRoundResponse {
    /// The new round number.
    pub round: u32,
    /// The generated pairings.
    pub matchups: Vec<MatchupView>,
    /// Matchups force-settled as ties before pairing ran.
    pub settled_ties: Vec<Uuid>,
}

/// Response to an accepted score report.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptReportResponse {
    /// The accepted report.
    pub report: ReportView,
    /// Matchup carrying the committed result.
    pub matchup: MatchupView,
    /// Downstream propagation outcome.
    pub propagation: PropagationView,
}

/// One entry of the organizer's reconciliation queue.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportQueueItem {
    /// The report.
    pub report: ReportView,
    /// Whether this report agrees with its sibling, when both sides have
    /// reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<bool>,
}
