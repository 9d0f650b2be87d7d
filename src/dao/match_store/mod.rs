#[cfg(test)]
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    MatchupEntity, ScoreReportEntity, TournamentEntity, TournamentListItemEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for tournaments, matchups, and
/// score reports.
///
/// `update_match` is a compare-and-swap keyed on the entity's `version`
/// field; `insert_matches` is guarded by a unique index on
/// `(tournament_id, round, match_number)`. Both surface rejected writes as
/// [`crate::dao::storage::StorageError::Conflict`].
pub trait MatchStore: Send + Sync {
    /// Persist a freshly created tournament.
    fn insert_tournament(&self, tournament: TournamentEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a tournament aggregate.
    fn update_tournament(&self, tournament: TournamentEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a tournament by id.
    fn find_tournament(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>>;
    /// List all tournaments as summary rows.
    fn list_tournaments(&self)
    -> BoxFuture<'static, StorageResult<Vec<TournamentListItemEntity>>>;
    /// Delete a tournament with its matchups and reports. Returns whether a
    /// tournament was removed.
    fn delete_tournament(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a batch of matchups; the whole batch fails on any positional
    /// uniqueness violation.
    fn insert_matches(&self, matches: Vec<MatchupEntity>)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a matchup by id.
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchupEntity>>>;
    /// Fetch a matchup by bracket position.
    fn find_match_at(
        &self,
        tournament_id: Uuid,
        round: u32,
        match_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<MatchupEntity>>>;
    /// List a tournament's matchups ordered by round then match number.
    fn list_matches(
        &self,
        tournament_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchupEntity>>>;
    /// Compare-and-swap replace: the write only applies while the stored
    /// version equals `matchup.version`; the stored entity gets
    /// `matchup.version + 1`. Returns the entity as written.
    fn update_match(
        &self,
        matchup: MatchupEntity,
    ) -> BoxFuture<'static, StorageResult<MatchupEntity>>;

    /// Persist a freshly submitted score report.
    fn insert_report(&self, report: ScoreReportEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a report by id.
    fn find_report(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<ScoreReportEntity>>>;
    /// Replace a report.
    fn update_report(&self, report: ScoreReportEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a report. Returns whether a report was removed.
    fn delete_report(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// List the reports filed against one matchup.
    fn list_reports_for_match(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreReportEntity>>>;
    /// List all reports of a tournament (the organizer's reconciliation
    /// queue).
    fn list_reports_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreReportEntity>>>;

    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
