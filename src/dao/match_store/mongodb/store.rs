use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoMatchupDocument, MongoReportDocument, MongoTournamentDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    match_store::MatchStore,
    models::{MatchupEntity, ScoreReportEntity, TournamentEntity, TournamentListItemEntity},
    storage::StorageResult,
};

const TOURNAMENT_COLLECTION_NAME: &str = "tournaments";
const MATCH_COLLECTION_NAME: &str = "tournament_matches";
const REPORT_COLLECTION_NAME: &str = "score_reports";

const DUPLICATE_KEY_CODE: i32 = 11000;

/// [`MatchStore`] implementation backed by MongoDB.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // The bracket position index doubles as the guard against generating
        // the same round twice (duplicate generation fails the insert).
        let matches = database.collection::<mongodb::bson::Document>(MATCH_COLLECTION_NAME);
        let position_index = mongodb::IndexModel::builder()
            .keys(doc! {"tournament_id": 1, "round": 1, "match_number": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("match_position_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        matches
            .create_index(position_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION_NAME,
                index: "tournament_id,round,match_number",
                source,
            })?;

        let reports = database.collection::<mongodb::bson::Document>(REPORT_COLLECTION_NAME);
        let report_index = mongodb::IndexModel::builder()
            .keys(doc! {"match_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("report_match_idx".to_owned()))
                    .build(),
            )
            .build();
        reports
            .create_index(report_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: REPORT_COLLECTION_NAME,
                index: "match_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn tournament_collection(&self) -> Collection<MongoTournamentDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoTournamentDocument>(TOURNAMENT_COLLECTION_NAME)
    }

    async fn match_collection(&self) -> Collection<MongoMatchupDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoMatchupDocument>(MATCH_COLLECTION_NAME)
    }

    async fn report_collection(&self) -> Collection<MongoReportDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoReportDocument>(REPORT_COLLECTION_NAME)
    }

    async fn save_tournament(&self, tournament: TournamentEntity) -> MongoResult<()> {
        let id = tournament.id;
        let document: MongoTournamentDocument = tournament.into();
        let collection = self.tournament_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTournament { id, source })?;
        Ok(())
    }

    async fn find_tournament(&self, id: Uuid) -> MongoResult<Option<TournamentEntity>> {
        let collection = self.tournament_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTournament { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_tournaments(&self) -> MongoResult<Vec<TournamentListItemEntity>> {
        let collection = self.tournament_collection().await;
        let documents: Vec<MongoTournamentDocument> = collection
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListTournaments { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTournaments { source })?;

        Ok(documents
            .into_iter()
            .map(|document| {
                let entity: TournamentEntity = document.into();
                entity.into()
            })
            .collect())
    }

    async fn delete_tournament(&self, id: Uuid) -> MongoResult<bool> {
        let tournaments = self.tournament_collection().await;
        let result = tournaments
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;

        // Cascade to dependent collections; the tournament row is the anchor.
        let matches = self.match_collection().await;
        matches
            .delete_many(doc! {"tournament_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;
        let reports = self.report_collection().await;
        reports
            .delete_many(doc! {"tournament_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;

        Ok(result.deleted_count > 0)
    }

    async fn insert_matches(&self, matches: Vec<MatchupEntity>) -> MongoResult<()> {
        let collection = self.match_collection().await;
        for matchup in matches {
            let position = (matchup.tournament_id, matchup.round, matchup.match_number);
            let id = matchup.id;
            let document: MongoMatchupDocument = matchup.into();
            if let Err(source) = collection.insert_one(&document).await {
                if is_duplicate_key(&source) {
                    let (tournament_id, round, match_number) = position;
                    return Err(MongoDaoError::DuplicatePosition {
                        tournament_id,
                        round,
                        match_number,
                    });
                }
                return Err(MongoDaoError::SaveMatch { id, source });
            }
        }
        Ok(())
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchupEntity>> {
        let collection = self.match_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_match_at(
        &self,
        tournament_id: Uuid,
        round: u32,
        match_number: u32,
    ) -> MongoResult<Option<MatchupEntity>> {
        let collection = self.match_collection().await;
        let document = collection
            .find_one(doc! {
                "tournament_id": uuid_as_binary(tournament_id),
                "round": round,
                "match_number": match_number,
            })
            .await
            .map_err(|source| MongoDaoError::ListMatches {
                tournament_id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_matches(&self, tournament_id: Uuid) -> MongoResult<Vec<MatchupEntity>> {
        let collection = self.match_collection().await;
        let documents: Vec<MongoMatchupDocument> = collection
            .find(doc! {"tournament_id": uuid_as_binary(tournament_id)})
            .sort(doc! {"round": 1, "match_number": 1})
            .await
            .map_err(|source| MongoDaoError::ListMatches {
                tournament_id,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches {
                tournament_id,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_match(&self, matchup: MatchupEntity) -> MongoResult<MatchupEntity> {
        let id = matchup.id;
        let expected = matchup.version;

        let mut next = matchup;
        next.version = expected + 1;
        let document: MongoMatchupDocument = next.clone().into();

        let collection = self.match_collection().await;
        let result = collection
            .replace_one(
                doc! {"_id": uuid_as_binary(id), "version": expected as i64},
                &document,
            )
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::VersionMismatch { id, expected });
        }

        Ok(next)
    }

    async fn insert_report(&self, report: ScoreReportEntity) -> MongoResult<()> {
        let id = report.id;
        let document: MongoReportDocument = report.into();
        let collection = self.report_collection().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveReport { id, source })?;
        Ok(())
    }

    async fn find_report(&self, id: Uuid) -> MongoResult<Option<ScoreReportEntity>> {
        let collection = self.report_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadReport { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn update_report(&self, report: ScoreReportEntity) -> MongoResult<()> {
        let id = report.id;
        let document: MongoReportDocument = report.into();
        let collection = self.report_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::SaveReport { id, source })?;
        Ok(())
    }

    async fn delete_report(&self, id: Uuid) -> MongoResult<bool> {
        let collection = self.report_collection().await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteReport { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn list_reports_for_match(&self, match_id: Uuid) -> MongoResult<Vec<ScoreReportEntity>> {
        let collection = self.report_collection().await;
        let documents: Vec<MongoReportDocument> = collection
            .find(doc! {"match_id": uuid_as_binary(match_id)})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListReports { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListReports { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_reports_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> MongoResult<Vec<ScoreReportEntity>> {
        let collection = self.report_collection().await;
        let documents: Vec<MongoReportDocument> = collection
            .find(doc! {"tournament_id": uuid_as_binary(tournament_id)})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListReports { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListReports { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl MatchStore for MongoMatchStore {
    fn insert_tournament(
        &self,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_tournament(tournament).await.map_err(Into::into) })
    }

    fn update_tournament(
        &self,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_tournament(tournament).await.map_err(Into::into) })
    }

    fn find_tournament(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_tournament(id).await.map_err(Into::into) })
    }

    fn list_tournaments(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_tournaments().await.map_err(Into::into) })
    }

    fn delete_tournament(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_tournament(id).await.map_err(Into::into) })
    }

    fn insert_matches(
        &self,
        matches: Vec<MatchupEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_matches(matches).await.map_err(Into::into) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchupEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn find_match_at(
        &self,
        tournament_id: Uuid,
        round: u32,
        match_number: u32,
    ) -> BoxFuture<'static, StorageResult<Option<MatchupEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_match_at(tournament_id, round, match_number)
                .await
                .map_err(Into::into)
        })
    }

    fn list_matches(
        &self,
        tournament_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchupEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches(tournament_id).await.map_err(Into::into) })
    }

    fn update_match(
        &self,
        matchup: MatchupEntity,
    ) -> BoxFuture<'static, StorageResult<MatchupEntity>> {
        let store = self.clone();
        Box::pin(async move { store.update_match(matchup).await.map_err(Into::into) })
    }

    fn insert_report(&self, report: ScoreReportEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_report(report).await.map_err(Into::into) })
    }

    fn find_report(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreReportEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_report(id).await.map_err(Into::into) })
    }

    fn update_report(&self, report: ScoreReportEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_report(report).await.map_err(Into::into) })
    }

    fn delete_report(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_report(id).await.map_err(Into::into) })
    }

    fn list_reports_for_match(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreReportEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_reports_for_match(match_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_reports_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreReportEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_reports_for_tournament(tournament_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
