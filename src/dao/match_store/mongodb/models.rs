use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    BracketSlot, MatchupEntity, ReportStatus, ReportedScore, ScoreReportEntity, TournamentEntity,
    TournamentFormat, TournamentSettings, TournamentStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTournamentDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    format: TournamentFormat,
    status: TournamentStatus,
    max_rounds: Option<u32>,
    settings: TournamentSettings,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<TournamentEntity> for MongoTournamentDocument {
    fn from(value: TournamentEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            format: value.format,
            status: value.status,
            max_rounds: value.max_rounds,
            settings: value.settings,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoTournamentDocument> for TournamentEntity {
    fn from(value: MongoTournamentDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            format: value.format,
            status: value.status,
            max_rounds: value.max_rounds,
            settings: value.settings,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchupDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    tournament_id: Uuid,
    round: u32,
    match_number: u32,
    slots: Vec<BracketSlot>,
    winner: Option<Uuid>,
    #[serde(default)]
    is_tie: bool,
    version: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MatchupEntity> for MongoMatchupDocument {
    fn from(value: MatchupEntity) -> Self {
        let [first, second] = value.slots;
        Self {
            id: value.id,
            tournament_id: value.tournament_id,
            round: value.round,
            match_number: value.match_number,
            slots: vec![first, second],
            winner: value.winner,
            is_tie: value.is_tie,
            version: value.version as i64,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoMatchupDocument> for MatchupEntity {
    fn from(value: MongoMatchupDocument) -> Self {
        let mut slots = value.slots.into_iter();
        let first = slots.next().unwrap_or_else(BracketSlot::placeholder);
        let second = slots.next().unwrap_or_else(BracketSlot::placeholder);
        Self {
            id: value.id,
            tournament_id: value.tournament_id,
            round: value.round,
            match_number: value.match_number,
            slots: [first, second],
            winner: value.winner,
            is_tie: value.is_tie,
            version: value.version as u64,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoReportDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    match_id: Uuid,
    tournament_id: Uuid,
    reporter_id: Uuid,
    scores: Vec<ReportedScore>,
    winner: Option<Uuid>,
    #[serde(default)]
    is_tie: bool,
    status: ReportStatus,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<ScoreReportEntity> for MongoReportDocument {
    fn from(value: ScoreReportEntity) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            tournament_id: value.tournament_id,
            reporter_id: value.reporter_id,
            scores: value.scores,
            winner: value.winner,
            is_tie: value.is_tie,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoReportDocument> for ScoreReportEntity {
    fn from(value: MongoReportDocument) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            tournament_id: value.tournament_id,
            reporter_id: value.reporter_id,
            scores: value.scores,
            winner: value.winner,
            is_tie: value.is_tie,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
