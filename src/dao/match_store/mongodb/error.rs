use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB match store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save tournament `{id}`")]
    SaveTournament {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load tournament `{id}`")]
    LoadTournament {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list tournaments")]
    ListTournaments {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete tournament `{id}`")]
    DeleteTournament {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save matchup `{id}`")]
    SaveMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load matchup `{id}`")]
    LoadMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list matchups of tournament `{tournament_id}`")]
    ListMatches {
        tournament_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error(
        "matchup position (tournament `{tournament_id}`, round {round}, match {match_number}) already exists"
    )]
    DuplicatePosition {
        tournament_id: Uuid,
        round: u32,
        match_number: u32,
    },
    #[error("matchup `{id}` was modified concurrently (expected version {expected})")]
    VersionMismatch { id: Uuid, expected: u64 },
    #[error("failed to save score report `{id}`")]
    SaveReport {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load score report `{id}`")]
    LoadReport {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete score report `{id}`")]
    DeleteReport {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list score reports")]
    ListReports {
        #[source]
        source: MongoError,
    },
}
