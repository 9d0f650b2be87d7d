use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{
        BracketSlot, MatchupEntity, SlotKind, TournamentEntity, TournamentFormat,
        TournamentSettings, TournamentStatus,
    },
    dto::format_system_time,
    state::match_phase::MatchPhase,
};

/// Projection of one matchup slot exposed to REST/SSE clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotView {
    /// Occupying player, absent for a placeholder/bye slot.
    pub player_id: Option<Uuid>,
    /// Display name shown in the bracket.
    pub name: String,
    /// Origin of the occupying account.
    pub kind: SlotKind,
    /// Score recorded for this slot, if any.
    pub score: Option<i32>,
}

impl From<BracketSlot> for SlotView {
    fn from(slot: BracketSlot) -> Self {
        Self {
            player_id: slot.player_id,
            name: slot.name,
            kind: slot.kind,
            score: slot.score,
        }
    }
}

/// Result lifecycle phase exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhaseView {
    /// No result recorded.
    Open,
    /// Winner or tie recorded; still editable.
    Decided,
    /// A downstream matchup recorded a result; edits refused.
    Locked,
}

impl From<MatchPhase> for MatchPhaseView {
    fn from(phase: MatchPhase) -> Self {
        match phase {
            MatchPhase::Open => MatchPhaseView::Open,
            MatchPhase::Decided => MatchPhaseView::Decided,
            MatchPhase::Locked => MatchPhaseView::Locked,
        }
    }
}

/// Projection of a matchup with its computed phase.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchupView {
    /// Matchup identifier.
    pub id: Uuid,
    /// Owning tournament.
    pub tournament_id: Uuid,
    /// 1-based round number.
    pub round: u32,
    /// 1-based position within the round.
    pub match_number: u32,
    /// The two contested slots.
    pub slots: Vec<SlotView>,
    /// Declared winner, if any.
    pub winner: Option<Uuid>,
    /// Whether the matchup ended in a tie.
    pub is_tie: bool,
    /// Result lifecycle phase.
    pub phase: MatchPhaseView,
    /// Optimistic-concurrency version; echo it back when editing.
    pub version: u64,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl MatchupView {
    /// Build a view from an entity and its already-computed phase.
    pub fn with_phase(entity: MatchupEntity, phase: MatchPhase) -> Self {
        Self {
            id: entity.id,
            tournament_id: entity.tournament_id,
            round: entity.round,
            match_number: entity.match_number,
            slots: entity.slots.into_iter().map(Into::into).collect(),
            winner: entity.winner,
            is_tie: entity.is_tie,
            phase: phase.into(),
            version: entity.version,
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Matchups of one round, in match-number order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundView {
    /// 1-based round number.
    pub round: u32,
    /// Matchups of the round.
    pub matchups: Vec<MatchupView>,
}

/// Projection of a tournament.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TournamentView {
    /// Tournament identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Competition format.
    pub format: TournamentFormat,
    /// Lifecycle status.
    pub status: TournamentStatus,
    /// Configured round cap, if any.
    pub max_rounds: Option<u32>,
    /// Format settings.
    pub settings: TournamentSettings,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<TournamentEntity> for TournamentView {
    fn from(entity: TournamentEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            format: entity.format,
            status: entity.status,
            max_rounds: entity.max_rounds,
            settings: entity.settings,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Score claimed or recorded for one participant.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct ScoreInput {
    /// Player the score belongs to.
    pub player_id: Uuid,
    /// Score value.
    pub score: i32,
}
