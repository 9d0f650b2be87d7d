//! Read-only public projections of a tournament.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::common::{RoundView, TournamentView},
    services::swiss::PlayerRecord,
};

/// Full bracket of a tournament, matchups grouped into rounds.
#[derive(Debug, Serialize, ToSchema)]
pub struct BracketResponse {
    /// The tournament.
    pub tournament: TournamentView,
    /// Rounds in ascending order.
    pub rounds: Vec<RoundView>,
}

/// One row of the standings table.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingRow {
    /// The player.
    pub player_id: Uuid,
    /// Display name.
    pub name: String,
    /// Matchups won, byes included.
    pub wins: u32,
    /// Matchups lost.
    pub losses: u32,
    /// Tied matchups.
    pub ties: u32,
}

impl From<PlayerRecord> for StandingRow {
    fn from(record: PlayerRecord) -> Self {
        Self {
            player_id: record.player_id,
            name: record.name,
            wins: record.wins,
            losses: record.losses,
            ties: record.ties,
        }
    }
}

/// Standings computed from all finalized matchups.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingsResponse {
    /// Ranked rows, best record first.
    pub standings: Vec<StandingRow>,
}
